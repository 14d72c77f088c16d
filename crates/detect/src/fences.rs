//! Markdown fences and inline backtick spans.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::language::normalize_fence_language;
use crate::re;
use crate::types::{BlockKind, CodeBlock};

const FENCE: &str = "```";

static INLINE_TICKS: Lazy<Regex> = Lazy::new(|| re(r"`[^`\n]+`"));

/// Find triple-backtick fenced blocks.
///
/// Each block runs from the opening fence through the closing fence. An
/// unclosed fence runs to the end of the text. The language comes from the
/// info string on the opening line.
pub fn find_fenced_blocks(text: &str, context_chars: usize) -> Vec<CodeBlock> {
    let marks: Vec<usize> = text.match_indices(FENCE).map(|(i, _)| i).collect();
    let mut blocks = Vec::new();

    let mut i = 0;
    while i < marks.len() {
        let open = marks[i];
        let info_start = open + FENCE.len();
        let info_end = text[info_start..]
            .find('\n')
            .map_or(text.len(), |p| info_start + p);

        let (end, close) = match marks.get(i + 1) {
            Some(&close) => (close + FENCE.len(), Some(close)),
            None => (info_start + text[info_start..].trim_end().len(), None),
        };

        // A fence closed on its own opening line has no info string.
        let language = match close {
            Some(close) if close < info_end => None,
            _ => normalize_fence_language(&text[info_start..info_end]),
        };

        if let Some(block) =
            CodeBlock::from_range(text, open, end, BlockKind::Block, language, context_chars)
        {
            blocks.push(block);
        }

        i += 2;
    }

    blocks
}

/// Remove single-backtick spans from a line.
pub(crate) fn mask_inline_spans(line: &str) -> Cow<'_, str> {
    INLINE_TICKS.replace_all(line, "")
}

/// Find single-backtick spans that lie outside every fenced block.
pub fn find_inline_blocks(text: &str, fenced: &[CodeBlock], context_chars: usize) -> Vec<CodeBlock> {
    let bytes = text.as_bytes();
    INLINE_TICKS
        .find_iter(text)
        .filter(|m| {
            let glued_before = m.start() > 0 && bytes[m.start() - 1] == b'`';
            let glued_after = m.end() < bytes.len() && bytes[m.end()] == b'`';
            !glued_before && !glued_after
        })
        .filter(|m| {
            !fenced
                .iter()
                .any(|f| m.start() < f.end && f.start < m.end())
        })
        .filter_map(|m| {
            CodeBlock::from_range(text, m.start(), m.end(), BlockKind::Inline, None, context_chars)
        })
        .collect()
}
