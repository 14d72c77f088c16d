//! Segment scanning for code-heavy text.
//!
//! Blank lines split the text into segments. A segment becomes a block when
//! it carries a seed shape, structural code, or a high enough share of
//! code-like lines.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

use chatlens_core::DetectionConfig;

use crate::fences::mask_inline_spans;
use crate::guards::{
    has_genuine_call, is_latex_math, is_markdown_prose, is_media_line,
    is_natural_function_mention,
};
use crate::language::guess_language;
use crate::line::{is_code_like, is_strong_line, line_spans, LineSpan};
use crate::re;
use crate::redact::strip_placeholders;
use crate::types::{BlockKind, CodeBlock};

static SEGMENT_SEEDS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^\s*(?:export\s+)?(?:const|let|var)\s+[\w${\[][^=]*=",
        r#"\brequire\(\s*['"]"#,
        r"\bfunction\s*[\w$]*\s*\([^)]*\)\s*\{",
        r"^\s*(?:async\s+)?def\s+\w+\s*\(",
        r"^\s*(?:pub\s+)?fn\s+\w+\s*[<(]",
        r"^\s*class\s+[A-Z][\w$]*",
        r#"^\s*import\s+[\w{}*, ]+(?:\s+from\s+['"]|;?\s*$)"#,
        r"^\s*</?[A-Za-z][\w.-]*(?:\s[^<>]*)?/?>",
        r"^\s*at\s+\S.*:\d+(?::\d+)?\)?\s*$",
        r"^\s*(?:Uncaught\s+)?(?:[\w$]+\.)*(?:[A-Z][\w$]*)?(?:Error|Exception):",
        // SDK calls and their parameter objects
        r"\bopenai\.(?:create\w+|(?:chat\.)?completions\.create)\(",
        r#"^\s*"?(?:model|messages|max_tokens|temperature)"?\s*:\s*[\["'\d]"#,
        // Express / router idioms
        r"\b(?:app|router)\.(?:get|post|put|patch|delete|use|listen)\(",
        r"\bres\.(?:json|send|status|render)\(",
        // JSX
        r"\bclassName\s*=",
        r"<Route\b",
        r"^\s*return\s*\(\s*$",
        r"\buse(?:State|Effect|Ref|Memo|Callback)\(",
        // DOM and module idioms
        r"\b(?:document|window)\.[A-Za-z]+\(",
        r"\.addEventListener\(",
        r"\bmodule\.exports\b",
        r"\bconsole\.(?:log|error|warn|info)\(",
        r"^\s*(?:if|for|while|switch)\s*\(.*\)\s*\{\s*$",
    ])
    .expect("segment seed patterns compile")
});

static STRUCTURAL: Lazy<Regex> =
    Lazy::new(|| re(r"[{};]|=>|[^=!<>]=[^=>]|\)\s*\.\s*[A-Za-z_$]"));

static INTRO: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)^\s*(?:I will|I'll|I have|I've|I had|I am|I'm|I get|I got|I tried|Here's|Here is|Here are|This is|These are|Getting|When I|Below is|Following is)\b")
});

/// Count strong lines and non-empty lines in `text`.
pub fn count_strong_lines(text: &str) -> (usize, usize) {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .fold((0, 0), |(strong, total), line| {
            (strong + usize::from(is_strong_line(line)), total + 1)
        })
}

/// Whether segment scanning should run for `text`.
///
/// True when requested explicitly, or when the text looks code-heavy on its
/// own: two or more strong lines, or strong lines making up more than half of
/// at least four non-empty lines.
pub fn should_be_aggressive(text: &str, aggressive: bool) -> bool {
    if aggressive {
        return true;
    }
    let (strong, total) = count_strong_lines(text);
    strong >= 2 || (total >= 4 && strong * 2 > total)
}

/// Whether a message counts toward a conversation's code-heavy tally.
pub fn is_strongly_code_like(text: &str) -> bool {
    text.contains("```") || count_strong_lines(text).0 >= 2
}

/// Scan blank-line separated segments and emit one block per code segment.
pub fn find_segment_blocks(text: &str, config: &DetectionConfig) -> Vec<CodeBlock> {
    let spans = line_spans(text);
    let mut blocks = Vec::new();

    for segment in split_segments(text, &spans) {
        if let Some(block) = segment_block(text, &segment, config) {
            blocks.push(block);
        }
    }

    blocks
}

/// Runs of consecutive non-blank lines.
fn split_segments(text: &str, spans: &[LineSpan]) -> Vec<Vec<LineSpan>> {
    let mut segments = Vec::new();
    let mut current: Vec<LineSpan> = Vec::new();

    for span in spans {
        if span.slice(text).trim().is_empty() {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        } else {
            current.push(*span);
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

fn segment_block(text: &str, segment: &[LineSpan], config: &DetectionConfig) -> Option<CodeBlock> {
    let first = segment.first()?;
    let last = segment.last()?;
    let raw = &text[first.start..last.end];
    let stripped = strip_placeholders(raw);

    if stripped.trim().is_empty() || is_markdown_prose(&stripped) || is_latex_math(&stripped) {
        return None;
    }

    let code_lines: Vec<&LineSpan> = segment
        .iter()
        .filter(|span| !is_media_line(span.slice(text)))
        .collect();
    if code_lines.is_empty() {
        return None;
    }

    // Inline spans are found by the fence stage; prose around them is scored
    // on its own.
    let scored: Vec<String> = code_lines
        .iter()
        .map(|span| mask_inline_spans(&strip_placeholders(span.slice(text))).into_owned())
        .collect();

    let has_seed = scored.iter().any(|line| SEGMENT_SEEDS.is_match(line));

    let body = scored.join("\n");
    let structural = !is_natural_function_mention(&body)
        && (STRUCTURAL.is_match(&body) || has_genuine_call(&body));

    let mut code_like = 0usize;
    let mut prev: Option<&str> = None;
    for line in &scored {
        if is_code_like(line, prev, true) {
            code_like += 1;
        }
        prev = Some(line.as_str());
    }
    let score = code_like as f64 / code_lines.len() as f64;

    if !(has_seed || structural || score >= config.segment_score_threshold) {
        return None;
    }

    // Media lines at the edges and a leading intro sentence stay outside.
    let mut lines: &[LineSpan] = segment;
    while let Some((head, rest)) = lines.split_first() {
        if is_media_line(head.slice(text)) {
            lines = rest;
        } else {
            break;
        }
    }
    while let Some((tail, rest)) = lines.split_last() {
        if is_media_line(tail.slice(text)) {
            lines = rest;
        } else {
            break;
        }
    }
    if lines.len() > 1 {
        let head = lines[0].slice(text);
        if INTRO.is_match(head) && !is_strong_line(head) {
            lines = &lines[1..];
        }
    }

    let first = lines.first()?;
    let last = lines.last()?;
    let start = first.start + (first.slice(text).len() - first.slice(text).trim_start().len());
    let end = last.start + last.slice(text).trim_end().len();

    let content = &text[start.min(end)..end];
    let language = guess_language(content).map(|lang| lang.as_str().to_string());

    tracing::trace!(start, end, has_seed, structural, score, "Segment block");
    CodeBlock::from_range(text, start, end, BlockKind::Block, language, config.context_chars)
}
