//! Merging of overlapping candidate blocks.

use chatlens_core::DetectionConfig;

use crate::types::{BlockKind, CodeBlock};

/// Longest non-whitespace run allowed in a gap that still joins two blocks.
const MAX_GAP_RUN: usize = 2;

/// Sort candidates and merge the ones that overlap, touch, or are separated
/// only by a small gap.
///
/// The merged block keeps the metadata of its highest-ranked member: a block
/// with a language first, then JS/TS idiom blocks, then plain blocks, then
/// inline spans. Ties keep the earlier candidate.
pub fn merge_blocks(text: &str, candidates: Vec<CodeBlock>, config: &DetectionConfig) -> Vec<CodeBlock> {
    let mut blocks: Vec<CodeBlock> = candidates
        .into_iter()
        .filter(|b| b.matches_source(text))
        .collect();
    blocks.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut merged: Vec<CodeBlock> = Vec::with_capacity(blocks.len());
    for block in blocks {
        if let Some(last) = merged.last_mut() {
            if block.start <= last.end || is_small_gap(&text[last.end..block.start]) {
                let end = last.end.max(block.end);
                let (kind, language) = if rank(&block) > rank(last) {
                    (block.kind, block.language.clone())
                } else {
                    (last.kind, last.language.clone())
                };
                if let Some(joined) =
                    CodeBlock::from_range(text, last.start, end, kind, language, config.context_chars)
                {
                    *last = joined;
                }
                continue;
            }
        }
        merged.push(block);
    }

    merged
}

/// Collapse every block into one span when the text is dominated by code.
///
/// Applies when there are at least two blocks and either the block count
/// reaches `unify_block_count` or the blocks cover at least `unify_coverage`
/// of the text.
pub fn unify_blocks(text: &str, blocks: Vec<CodeBlock>, config: &DetectionConfig) -> Vec<CodeBlock> {
    if blocks.len() < 2 || text.is_empty() {
        return blocks;
    }

    let covered: usize = blocks.iter().map(CodeBlock::len).sum();
    let coverage = covered as f64 / text.len() as f64;
    if blocks.len() < config.unify_block_count && coverage < config.unify_coverage {
        return blocks;
    }

    let (Some(first), Some(last)) = (blocks.first(), blocks.last()) else {
        return blocks;
    };

    let language = first
        .language
        .as_ref()
        .filter(|lang| blocks.iter().all(|b| b.language.as_ref() == Some(*lang)))
        .cloned();

    tracing::debug!(
        blocks = blocks.len(),
        coverage,
        "Unifying code-dominated text into one block"
    );

    match CodeBlock::from_range(
        text,
        first.start,
        last.end,
        BlockKind::JsTs,
        language,
        config.context_chars,
    ) {
        Some(unified) => vec![unified],
        None => blocks,
    }
}

/// Whitespace, or a single line break around at most a few punctuation
/// characters.
fn is_small_gap(gap: &str) -> bool {
    if gap.trim().is_empty() {
        return true;
    }
    if gap.matches('\n').count() > 1 {
        return false;
    }
    gap.split_whitespace().all(|run| {
        run.chars().count() <= MAX_GAP_RUN && run.chars().filter(|c| c.is_alphabetic()).count() < 2
    })
}

fn rank(block: &CodeBlock) -> u8 {
    match (block.kind, block.language.is_some()) {
        (BlockKind::Inline, _) => 0,
        (BlockKind::Block, false) => 1,
        (BlockKind::JsTs, _) => 2,
        (BlockKind::Block, true) => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str, start: usize, end: usize, kind: BlockKind, lang: Option<&str>) -> CodeBlock {
        CodeBlock::from_range(text, start, end, kind, lang.map(String::from), 0).unwrap()
    }

    #[test]
    fn test_overlapping_blocks_merge_with_best_metadata() {
        let text = "const a = 1;\nconst b = 2;";
        let merged = merge_blocks(
            text,
            vec![
                block(text, 0, 12, BlockKind::JsTs, Some("javascript")),
                block(text, 6, 25, BlockKind::Block, Some("plaintext")),
            ],
            &DetectionConfig::default(),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].end, text.len());
        assert_eq!(merged[0].kind, BlockKind::Block);
        assert_eq!(merged[0].language.as_deref(), Some("plaintext"));
    }

    #[test]
    fn test_word_gap_keeps_blocks_apart() {
        let text = "`foo` and `bar`";
        let merged = merge_blocks(
            text,
            vec![
                block(text, 10, 15, BlockKind::Inline, None),
                block(text, 0, 5, BlockKind::Inline, None),
            ],
            &DetectionConfig::default(),
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].start, 0);
    }

    #[test]
    fn test_small_gap() {
        assert!(is_small_gap("  \n  "));
        assert!(is_small_gap(", "));
        assert!(is_small_gap("\n);"));
        assert!(!is_small_gap(" and "));
        assert!(is_small_gap("\n\n\n"));
        assert!(!is_small_gap("\n;\n"));
        assert!(!is_small_gap(" xy "));
    }

    #[test]
    fn test_unify_on_coverage() {
        let text = "a();\nb();\nc";
        let blocks = vec![
            block(text, 0, 4, BlockKind::Block, Some("js")),
            block(text, 5, 9, BlockKind::Block, Some("js")),
        ];
        let unified = unify_blocks(text, blocks, &DetectionConfig::default());
        assert_eq!(unified.len(), 1);
        assert_eq!(unified[0].kind, BlockKind::JsTs);
        assert_eq!(unified[0].content, "a();\nb();");
        assert_eq!(unified[0].language.as_deref(), Some("js"));
    }

    #[test]
    fn test_unify_on_block_count() {
        let text: String = (0..9).map(|i| format!("`f{i}()` and then also ")).collect();
        let spans: Vec<(usize, usize)> = text
            .match_indices('`')
            .map(|(i, _)| i)
            .collect::<Vec<_>>()
            .chunks(2)
            .map(|pair| (pair[0], pair[1] + 1))
            .collect();
        let blocks = |n: usize| -> Vec<CodeBlock> {
            spans[..n]
                .iter()
                .map(|&(s, e)| block(&text, s, e, BlockKind::Inline, None))
                .collect()
        };
        let config = DetectionConfig::default();

        // Seven sparse spans stay apart.
        assert_eq!(unify_blocks(&text, blocks(7), &config).len(), 7);

        let unified = unify_blocks(&text, blocks(9), &config);
        assert_eq!(unified.len(), 1);
        assert_eq!(unified[0].kind, BlockKind::JsTs);
        assert_eq!(unified[0].start, spans[0].0);
        assert_eq!(unified[0].end, spans[8].1);
        assert_eq!(unified[0].language, None);
    }

    #[test]
    fn test_unify_skips_sparse_text() {
        let text = format!("a();{}b();", " words".repeat(20));
        let second = text.len() - 4;
        let blocks = vec![
            block(&text, 0, 4, BlockKind::Block, None),
            block(&text, second, text.len(), BlockKind::Block, None),
        ];
        assert_eq!(unify_blocks(&text, blocks, &DetectionConfig::default()).len(), 2);
    }
}
