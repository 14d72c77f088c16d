//! Detection pipeline orchestrator.

use chatlens_core::DetectionConfig;

use crate::fences::{find_fenced_blocks, find_inline_blocks};
use crate::guards::passes_early_exit;
use crate::merge::{merge_blocks, unify_blocks};
use crate::patterns::find_seed_blocks;
use crate::redact::{apply_placeholders, trim_placeholder_debris};
use crate::render::filter_renderable_blocks;
use crate::segments::{find_segment_blocks, should_be_aggressive};
use crate::types::CodeBlock;

/// Code block detector.
///
/// Stages run in a fixed order: seed patterns, fences, inline spans, and, for
/// code-heavy text, the segment scanner. Candidates are then merged and,
/// when code dominates the text, unified into one block.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectionConfig,
}

impl Detector {
    /// Create a detector with the given thresholds.
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Find code blocks in `text`.
    ///
    /// The result is sorted by start offset and non-overlapping, and every
    /// block's content is exactly `text[start..end]`.
    pub fn find_code_blocks(&self, text: &str, aggressive: bool) -> Vec<CodeBlock> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if !aggressive && !passes_early_exit(text) {
            tracing::trace!(len = text.len(), "No code signals, skipping detection");
            return Vec::new();
        }

        let context_chars = self.config.context_chars;

        let mut candidates = find_seed_blocks(text, aggressive, context_chars);
        let seeded = candidates.len();

        let fenced = find_fenced_blocks(text, context_chars);
        let inline = find_inline_blocks(text, &fenced, context_chars);
        let (fenced_count, inline_count) = (fenced.len(), inline.len());
        candidates.extend(fenced);
        candidates.extend(inline);

        let mut segment_count = 0;
        if should_be_aggressive(text, aggressive) {
            let segments = find_segment_blocks(text, &self.config);
            segment_count = segments.len();
            candidates.extend(segments);
        }

        let merged = merge_blocks(text, candidates, &self.config);
        let blocks = unify_blocks(text, merged, &self.config);

        tracing::debug!(
            seeded,
            fenced = fenced_count,
            inline = inline_count,
            segments = segment_count,
            blocks = blocks.len(),
            aggressive,
            "Detected code blocks"
        );

        blocks
    }

    /// Aggressive detection followed by the renderability filter.
    ///
    /// This is the block list redaction replaces on its first pass.
    pub fn renderable_blocks(&self, text: &str) -> Vec<CodeBlock> {
        filter_renderable_blocks(text, &self.find_code_blocks(text, true))
    }

    /// Whether non-aggressive detection finds any block.
    pub fn has_code(&self, text: &str) -> bool {
        !self.find_code_blocks(text, false).is_empty()
    }

    /// Replace every renderable block with its placeholder.
    ///
    /// Passes repeat until one finds nothing, so the result is stable under
    /// another call. Text without renderable blocks is returned unchanged.
    pub fn remove_code(&self, text: &str) -> String {
        let mut current = text.to_string();

        for pass in 1..=self.config.max_redaction_passes {
            let blocks = self.renderable_blocks(&current);
            if blocks.is_empty() {
                return current;
            }
            tracing::debug!(pass, blocks = blocks.len(), "Redaction pass");
            current = trim_placeholder_debris(&apply_placeholders(&current, &blocks));
        }

        tracing::warn!(
            passes = self.config.max_redaction_passes,
            "Redaction did not settle within the pass limit"
        );
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockKind;

    #[test]
    fn test_empty_and_whitespace_text() {
        let detector = Detector::default();
        assert!(detector.find_code_blocks("", true).is_empty());
        assert!(detector.find_code_blocks(" \n\t ", false).is_empty());
        assert_eq!(detector.remove_code(""), "");
    }

    #[test]
    fn test_plain_prose_is_untouched() {
        let detector = Detector::default();
        let text = "Thanks! That fixed it. Could you explain why it worked?";
        assert!(!detector.has_code(text));
        assert_eq!(detector.remove_code(text), text);
    }

    #[test]
    fn test_remove_code_replaces_fenced_block() {
        let detector = Detector::default();
        let text = "Try this:\n\n```js\nconst x = 1;\n```\n\nDoes it help?";
        assert_eq!(
            detector.remove_code(text),
            "Try this:\n\n[JS Block]\n\nDoes it help?"
        );
    }

    #[test]
    fn test_prose_plus_fence_keeps_fence_metadata() {
        let detector = Detector::default();
        let text = "Here you go:\n```python\nprint('hi')\n```";
        let blocks = detector.find_code_blocks(text, false);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Block);
        assert_eq!(blocks[0].language.as_deref(), Some("python"));
        assert!(blocks[0].content.starts_with("```python"));
    }

    #[test]
    fn test_single_pass_limit_still_returns_text() {
        let config = DetectionConfig {
            max_redaction_passes: 2,
            ..DetectionConfig::default()
        };
        let detector = Detector::new(config);
        let text = "```\nls -la\n```";
        assert_eq!(detector.remove_code(text), "[Code Block]");
    }
}
