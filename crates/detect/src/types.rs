//! Block types produced by the detector.

use serde::{Deserialize, Serialize};

/// Kind of a detected block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Multi-line code or error block
    #[serde(rename = "block")]
    Block,

    /// Single backtick span
    #[serde(rename = "inline")]
    Inline,

    /// JavaScript / TypeScript idiom block, also used for unified blocks
    #[serde(rename = "js-ts")]
    JsTs,
}

impl BlockKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Inline => "inline",
            Self::JsTs => "js-ts",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A span of source text classified as code.
///
/// `start` and `end` are byte offsets into the text the block was detected
/// in, always on `char` boundaries, and `content` is exactly
/// `text[start..end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    pub start: usize,
    pub end: usize,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_after: Option<String>,
}

impl CodeBlock {
    /// Build a block over `text[start..end]` with surrounding context.
    ///
    /// Returns `None` when the range is empty, out of bounds, or not on
    /// `char` boundaries.
    pub fn from_range(
        text: &str,
        start: usize,
        end: usize,
        kind: BlockKind,
        language: Option<String>,
        context_chars: usize,
    ) -> Option<Self> {
        if start >= end || end > text.len() {
            return None;
        }
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return None;
        }

        Some(Self {
            start,
            end,
            content: text[start..end].to_string(),
            kind,
            language,
            context_before: context_before(text, start, context_chars),
            context_after: context_after(text, end, context_chars),
        })
    }

    /// Length of the block in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for a zero-length block (never produced by the detector).
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether two blocks share at least one byte.
    pub fn overlaps(&self, other: &CodeBlock) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether this block still addresses `text` exactly.
    pub fn matches_source(&self, text: &str) -> bool {
        self.start < self.end
            && self.end <= text.len()
            && text.is_char_boundary(self.start)
            && text.is_char_boundary(self.end)
            && text[self.start..self.end] == self.content
    }
}

fn context_before(text: &str, start: usize, chars: usize) -> Option<String> {
    if chars == 0 || start == 0 {
        return None;
    }
    let prefix = &text[..start];
    let skip = prefix.chars().count().saturating_sub(chars);
    let ctx: String = prefix.chars().skip(skip).collect();
    (!ctx.trim().is_empty()).then_some(ctx)
}

fn context_after(text: &str, end: usize, chars: usize) -> Option<String> {
    if chars == 0 || end >= text.len() {
        return None;
    }
    let ctx: String = text[end..].chars().take(chars).collect();
    (!ctx.trim().is_empty()).then_some(ctx)
}
