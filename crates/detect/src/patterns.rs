//! Seed patterns for error traces and well-known JavaScript idioms.
//!
//! Each seed match is expanded line by line into the block around it. The
//! first seed to claim a region wins; later matches inside it are dropped.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::line::{is_code_like, line_index, line_spans, LineSpan};
use crate::re;
use crate::types::{BlockKind, CodeBlock};

/// A regex that marks the core of a block, with the metadata the block
/// gets when the match is expanded.
pub struct SeedPattern {
    pub name: &'static str,
    regex: Regex,
    pub kind: BlockKind,
    pub language: &'static str,
}

impl SeedPattern {
    fn error(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: re(pattern),
            kind: BlockKind::Block,
            language: "plaintext",
        }
    }

    fn idiom(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: re(pattern),
            kind: BlockKind::JsTs,
            language: "javascript",
        }
    }

    fn is_error(&self) -> bool {
        self.kind == BlockKind::Block
    }
}

/// Ordered seed table. Error seeds run first so traces claim their region
/// before the looser idiom seeds.
pub static SEED_PATTERNS: Lazy<Vec<SeedPattern>> = Lazy::new(|| {
    vec![
        SeedPattern::error(
            "error-detail-object",
            r#"\{\s*"?(?:error|message|code|status|detail|errors)"?\s*:\s*[^{}\n]{1,200}\}"#,
        ),
        SeedPattern::error(
            "error-with-stack",
            r"(?m)^\s*(?:Uncaught\s+)?(?:[\w$]+\.)*(?:[A-Z][\w$]*)?(?:Error|Exception)\b.*\n\s+at\s",
        ),
        SeedPattern::error(
            "known-error-string",
            concat!(
                r"UnhandledPromiseRejectionWarning|Unhandled promise rejection",
                r"|\b(?:ECONNREFUSED|ECONNRESET|ENOENT|EADDRINUSE|ETIMEDOUT|ERR_[A-Z_]+)\b",
                r"|Cannot find module\s+'[^'\n]+'|Unexpected token\s+\S+\s+in JSON",
                r"|\bis not a function\b|\bis not defined\b",
                r"|Cannot read propert(?:y|ies) of (?:undefined|null)",
                r"|Maximum call stack size exceeded"
            ),
        ),
        SeedPattern::error(
            "http-status",
            r"(?m)^\s*(?:GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS)\s+(?:https?://|/)\S*.*\b[1-5]\d{2}\b|HTTP/\d(?:\.\d)?\s+[1-5]\d{2}\b",
        ),
        SeedPattern::error("stack-frame", r"(?m)^\s*at\s+\S.*:\d+:\d+\)?\s*$"),
        SeedPattern::error(
            "anonymous-trace",
            r"(?m)^\s*[\w$.<>/]*@\S+:\d+(?::\d+)?\s*$",
        ),
        SeedPattern::error("python-traceback", r"(?m)^Traceback \(most recent call last\):"),
        SeedPattern::idiom("window-onload", r"\bwindow\.onload\s*="),
        SeedPattern::idiom(
            "dom-lookup",
            r"\bdocument\.(?:getElementById|querySelector(?:All)?|getElementsBy\w+|createElement)\(",
        ),
        SeedPattern::idiom("event-listener", r#"\.addEventListener\(\s*['"]"#),
        SeedPattern::idiom("try-open", r"(?m)^\s*try\s*\{"),
        SeedPattern::idiom("catch-clause", r"\}\s*catch\s*\(\s*[\w$]*\s*\)\s*\{"),
        SeedPattern::idiom(
            "binding",
            r"\b(?:const|let|var)\s+[\w${}\[\], ]+?\s*=\s*(?:await\s+)?(?:require\(|import\(|document\.|window\.|new\s+[A-Z]|fetch\(|axios\.)",
        ),
        SeedPattern::idiom("es-import", r#"(?m)^\s*import\s+[\w{}*, ]+\s+from\s+['"]"#),
        SeedPattern::idiom("module-exports", r"\bmodule\.exports\s*="),
        SeedPattern::idiom(
            "openai-legacy-call",
            r"\bopenai\.(?:createChatCompletion|createCompletion|createImage|createEmbedding)\(",
        ),
        SeedPattern::idiom(
            "openai-client-call",
            r"\b[\w$]+\.(?:chat\.)?completions\.create\(",
        ),
        SeedPattern::idiom("sdk-model", r#"\bmodel"?\s*:\s*["'][\w.\-]+["']"#),
        SeedPattern::idiom("sdk-messages", r#"\bmessages"?\s*:\s*\["#),
        SeedPattern::idiom(
            "sdk-params",
            r#"(?m)^\s*"?(?:max_tokens|temperature|top_p|stop|n)"?\s*:\s*[\d\["']"#,
        ),
    ]
});

/// Run every seed pattern over `text` and expand each surviving match.
pub fn find_seed_blocks(text: &str, aggressive: bool, context_chars: usize) -> Vec<CodeBlock> {
    let spans = line_spans(text);
    let mut processed: Vec<(usize, usize)> = Vec::new();
    let mut seen_errors: HashSet<String> = HashSet::new();
    let mut blocks = Vec::new();

    for seed in SEED_PATTERNS.iter() {
        for m in seed.regex.find_iter(text) {
            if is_region_processed(&processed, m.start(), m.end()) {
                continue;
            }

            let Some((start, end)) = find_block_bounds(text, &spans, m.start(), m.end(), aggressive)
            else {
                continue;
            };
            processed.push((start.min(m.start()), end.max(m.end())));

            let content = &text[start..end];
            if seed.is_error() && !seen_errors.insert(normalize_whitespace(content)) {
                tracing::trace!(seed = seed.name, start, "Dropping duplicate error block");
                continue;
            }

            if let Some(block) = CodeBlock::from_range(
                text,
                start,
                end,
                seed.kind,
                Some(seed.language.to_string()),
                context_chars,
            ) {
                tracing::trace!(seed = seed.name, start, end, "Seeded block");
                blocks.push(block);
            }
        }
    }

    blocks
}

/// Whether `[start, end)` overlaps a region some earlier seed claimed.
pub fn is_region_processed(processed: &[(usize, usize)], start: usize, end: usize) -> bool {
    processed.iter().any(|&(s, e)| start < e && s < end)
}

/// Expand a seed match to the surrounding code-like lines.
///
/// Walks backward while the preceding line is code-like and forward while the
/// following line is, bridging a single blank line when the line after it is
/// code-like too. Returns byte bounds with trailing whitespace trimmed.
pub(crate) fn find_block_bounds(
    text: &str,
    spans: &[LineSpan],
    match_start: usize,
    match_end: usize,
    aggressive: bool,
) -> Option<(usize, usize)> {
    if spans.is_empty() || match_start >= match_end {
        return None;
    }

    let first = line_index(spans, match_start);
    let last = line_index(spans, match_end.saturating_sub(1).max(match_start));
    let line = |i: usize| spans[i].slice(text);

    let mut top = first;
    while top > 0 {
        let candidate = top - 1;
        let prev = candidate.checked_sub(1).map(line);
        if is_code_like(line(candidate), prev, aggressive) {
            top = candidate;
        } else {
            break;
        }
    }

    let mut bottom = last;
    while bottom + 1 < spans.len() {
        let next = bottom + 1;
        if line(next).trim().is_empty() {
            let after = next + 1;
            if after < spans.len()
                && !line(after).trim().is_empty()
                && is_code_like(line(after), Some(line(bottom)), aggressive)
            {
                bottom = after;
                continue;
            }
            break;
        }
        if is_code_like(line(next), Some(line(bottom)), aggressive) {
            bottom = next;
        } else {
            break;
        }
    }

    // Prose leading into a seed on its own line stays outside the block.
    let mut start = spans[top].start;
    if top == first {
        let prefix = &text[start..match_start];
        if !prefix.trim().is_empty() && !is_code_like(prefix, None, aggressive) {
            start = match_start;
        }
    }
    start += text[start..].len() - text[start..].trim_start().len();

    let end = spans[bottom].end.max(match_end);
    let end = start + text[start..end].trim_end().len();

    (end > start).then_some((start, end))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_and_frames_form_one_block() {
        let text = "TypeError: Cannot read properties of undefined\n    at foo (/app/server.js:42:10)";
        let blocks = find_seed_blocks(text, false, 100);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start, 0);
        assert_eq!(blocks[0].end, text.len());
        assert_eq!(blocks[0].language.as_deref(), Some("plaintext"));
    }

    #[test]
    fn test_bounds_stop_at_prose() {
        let text = "I will post my code here:\nconst x = require('fs');\nconsole.log(x);";
        let blocks = find_seed_blocks(text, false, 100);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start, text.find("const").unwrap());
        assert_eq!(blocks[0].end, text.len());
        assert_eq!(blocks[0].kind, BlockKind::JsTs);
        assert_eq!(
            blocks[0].context_before.as_deref(),
            Some("I will post my code here:\n")
        );
    }

    #[test]
    fn test_prose_prefix_on_seed_line_is_excluded() {
        let text = "then I got this: Cannot find module 'express'";
        let blocks = find_seed_blocks(text, false, 0);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "Cannot find module 'express'");
    }

    #[test]
    fn test_duplicate_error_blocks_are_dropped() {
        let text = "Error: ECONNREFUSED\n\nSome words in between here.\n\nError:   ECONNREFUSED";
        let blocks = find_seed_blocks(text, false, 0);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start, 0);
    }

    #[test]
    fn test_blank_line_bridged_inside_code() {
        let text = "const a = require('a');\n\nconst b = require('b');\nThanks!";
        let spans = line_spans(text);
        let (start, end) = find_block_bounds(text, &spans, 0, 5, false).unwrap();
        assert_eq!(start, 0);
        assert_eq!(&text[start..end], "const a = require('a');\n\nconst b = require('b');");
    }

    #[test]
    fn test_two_blank_lines_end_the_block() {
        let text = "const a = require('a');\n\n\nconst b = require('b');";
        let spans = line_spans(text);
        let (start, end) = find_block_bounds(text, &spans, 0, 5, false).unwrap();
        assert_eq!(&text[start..end], "const a = require('a');");
    }

    #[test]
    fn test_region_processed() {
        let processed = vec![(10, 20)];
        assert!(is_region_processed(&processed, 15, 25));
        assert!(!is_region_processed(&processed, 20, 25));
        assert!(!is_region_processed(&processed, 0, 10));
    }

    #[test]
    fn test_sdk_call_is_seeded() {
        let text = "const completion = await openai.createChatCompletion({\n  model: \"gpt-3.5-turbo\",\n  messages: [{ role: \"user\", content: prompt }],\n});";
        let blocks = find_seed_blocks(text, false, 0);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, text);
        assert_eq!(blocks[0].language.as_deref(), Some("javascript"));
    }
}
