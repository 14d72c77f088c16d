//! Placeholder substitution for redacted blocks.
//!
//! Placeholders are `[{LANG} Block]`, `[Code Block]` and `[Inline Code]`.
//! Every detector stage strips them before classifying a line, so text that
//! has already been redacted never produces new blocks.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::re;
use crate::types::{BlockKind, CodeBlock};

const PLACEHOLDER_BODY: &str = r"\[(?:[A-Z0-9+#._\-]+ Block|Code Block|Inline Code)\]";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| re(PLACEHOLDER_BODY));

/// A placeholder followed directly (no whitespace) by leftover text on the
/// same line. A sentence-ending punctuation mark followed by whitespace is
/// not debris.
static PLACEHOLDER_DEBRIS: Lazy<Regex> = Lazy::new(|| {
    re(&format!(
        r"({PLACEHOLDER_BODY})(?:[^\s\[.,;:!?)]|[.,;:!?)]+[^\s.,;:!?)\[])[^\n]*"
    ))
});

/// Remove all placeholders from `text`.
pub(crate) fn strip_placeholders(text: &str) -> Cow<'_, str> {
    PLACEHOLDER.replace_all(text, "")
}

/// Whether `text` contains at least one placeholder.
pub fn has_placeholder(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

/// Placeholder text that replaces `block`.
pub fn placeholder_for(block: &CodeBlock) -> String {
    if block.kind == BlockKind::Inline {
        return "[Inline Code]".to_string();
    }

    let label: String = block
        .language
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '.' | '_' | '-'))
        .collect::<String>()
        .to_ascii_uppercase();

    if label.is_empty() {
        "[Code Block]".to_string()
    } else {
        format!("[{label} Block]")
    }
}

/// Replace each block in `text` with its placeholder.
///
/// Blocks that no longer address `text` are skipped, as are blocks that
/// overlap one already applied. Replacement runs from the end of the text so
/// earlier offsets stay valid.
pub fn apply_placeholders(text: &str, blocks: &[CodeBlock]) -> String {
    let mut ordered: Vec<&CodeBlock> = blocks.iter().filter(|b| b.matches_source(text)).collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    let mut result = text.to_string();
    let mut applied: Option<&CodeBlock> = None;
    for block in ordered {
        if applied.is_some_and(|later| block.overlaps(later)) {
            continue;
        }
        result.replace_range(block.start..block.end, &placeholder_for(block));
        applied = Some(block);
    }
    result
}

/// Drop text glued to the end of a placeholder, up to the end of the line.
pub fn trim_placeholder_debris(text: &str) -> String {
    PLACEHOLDER_DEBRIS.replace_all(text, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str, start: usize, end: usize, kind: BlockKind, lang: Option<&str>) -> CodeBlock {
        CodeBlock::from_range(text, start, end, kind, lang.map(String::from), 0).unwrap()
    }

    #[test]
    fn test_placeholder_labels() {
        let text = "abc";
        assert_eq!(
            placeholder_for(&block(text, 0, 3, BlockKind::Block, Some("js"))),
            "[JS Block]"
        );
        assert_eq!(placeholder_for(&block(text, 0, 3, BlockKind::Block, None)), "[Code Block]");
        assert_eq!(
            placeholder_for(&block(text, 0, 3, BlockKind::Inline, Some("js"))),
            "[Inline Code]"
        );
        assert_eq!(
            placeholder_for(&block(text, 0, 3, BlockKind::JsTs, Some("c++"))),
            "[C++ Block]"
        );
        assert_eq!(
            placeholder_for(&block(text, 0, 3, BlockKind::Block, Some("ü"))),
            "[Code Block]"
        );
    }

    #[test]
    fn test_apply_placeholders_back_to_front() {
        let text = "run `a` then `b` ok";
        let blocks = vec![
            block(text, 4, 7, BlockKind::Inline, None),
            block(text, 13, 16, BlockKind::Inline, None),
        ];
        assert_eq!(
            apply_placeholders(text, &blocks),
            "run [Inline Code] then [Inline Code] ok"
        );
    }

    #[test]
    fn test_apply_placeholders_skips_stale_and_overlapping() {
        let text = "0123456789";
        let mut stale = block(text, 0, 2, BlockKind::Block, None);
        stale.content = "zz".to_string();
        let blocks = vec![
            stale,
            block(text, 3, 8, BlockKind::Block, None),
            block(text, 5, 9, BlockKind::Block, None),
        ];
        assert_eq!(apply_placeholders(text, &blocks), "01234[Code Block]9");
    }

    #[test]
    fn test_trim_debris() {
        assert_eq!(
            trim_placeholder_debris("see [Inline Code]Full error\nnext line"),
            "see [Inline Code]\nnext line"
        );
        assert_eq!(
            trim_placeholder_debris("[JS Block].then(x => x)"),
            "[JS Block]"
        );
        assert_eq!(
            trim_placeholder_debris("Use [Code Block]. Then rerun."),
            "Use [Code Block]. Then rerun."
        );
        assert_eq!(
            trim_placeholder_debris("[Code Block] [Inline Code]"),
            "[Code Block] [Inline Code]"
        );
    }

    #[test]
    fn test_strip_placeholders() {
        assert_eq!(strip_placeholders("a [Code Block] b [PYTHON Block]"), "a  b ");
        assert!(has_placeholder("x [Inline Code]"));
        assert!(!has_placeholder("[code block]"));
    }
}
