//! Renderability filter applied before blocks are shown or redacted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::guards::{has_genuine_call, has_stack_trace, is_latex_math};
use crate::re;
use crate::redact::strip_placeholders;
use crate::types::{BlockKind, CodeBlock};

static PURE_PROSE: Lazy<Regex> = Lazy::new(|| re(r#"^[\p{L}\p{N}\s.,!?'"’“”:\-–—]*$"#));
static JSON_KEY: Lazy<Regex> = Lazy::new(|| re(r#""[^"\n]+"\s*:"#));
static NAME_KEY: Lazy<Regex> = Lazy::new(|| re(r#""name"\s*:"#));
static CODE_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    re(r"\b(?:const|let|var|function|return|import|export|class|def|if|for|while|async|await)\b|;")
});
static BRACKETS: Lazy<Regex> = Lazy::new(|| re(r"[{}\[\]]|</?[A-Za-z][\w-]*[^<>\n]*>"));
static URL: Lazy<Regex> = Lazy::new(|| re(r"https?://\S+"));
static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| re(r"\[([^\]\n]*)\]\([^)\s]+\)"));
static KEYWORD_SHAPE: Lazy<Regex> = Lazy::new(|| {
    re(concat!(
        r"=>|\b(?:const|let|var)\s+[\w${\[]|\bfunction\b\s*[\w$]*\s*\(|\breturn\b|\bimport\s+[\w{*]",
        r"|\bclass\s+[A-Z]|\bdef\s+\w+\s*\(|\bmodule\.exports\b"
    ))
});

/// Keep only the blocks worth rendering as code.
///
/// Blocks that no longer address `text` are dropped as well.
pub fn filter_renderable_blocks(text: &str, blocks: &[CodeBlock]) -> Vec<CodeBlock> {
    blocks
        .iter()
        .filter(|b| b.matches_source(text) && is_renderable(b))
        .cloned()
        .collect()
}

/// Whether a single block is worth rendering as code.
pub fn is_renderable(block: &CodeBlock) -> bool {
    let stripped = strip_placeholders(&block.content);
    let body = match block.kind {
        BlockKind::Inline => stripped.trim().trim_matches('`').trim(),
        _ => stripped.trim(),
    };

    if body.is_empty() || is_latex_math(body) || PURE_PROSE.is_match(body) {
        return false;
    }
    if is_single_line_json_dump(body) || is_private_use_name_list(body) {
        return false;
    }
    if is_prose_with_links(body) {
        return false;
    }

    has_strong_code_signal(body)
}

/// A one-line serialized object such as a pasted API payload.
fn is_single_line_json_dump(body: &str) -> bool {
    !body.contains('\n')
        && !body.contains("```")
        && JSON_KEY.find_iter(body).count() >= 3
        && body.chars().filter(|c| matches!(c, '{' | '}' | '[' | ']')).count() >= 4
        && !CODE_KEYWORD.is_match(body)
}

/// Export metadata listing names tagged with private-use glyphs.
fn is_private_use_name_list(body: &str) -> bool {
    body.chars().any(|c| ('\u{E000}'..='\u{F8FF}').contains(&c))
        && NAME_KEY.find_iter(body).count() >= 3
        && !CODE_KEYWORD.is_match(body)
}

/// Sentences that only point at a URL or markdown link. A bare URL on its
/// own is still code.
fn is_prose_with_links(body: &str) -> bool {
    if !URL.is_match(body) && !MARKDOWN_LINK.is_match(body) {
        return false;
    }
    let labelled = MARKDOWN_LINK.replace_all(body, "$1");
    let remainder = URL.replace_all(&labelled, "");
    let remainder = remainder.trim();
    !remainder.is_empty() && PURE_PROSE.is_match(remainder)
}

fn has_strong_code_signal(body: &str) -> bool {
    body.contains("```")
        || BRACKETS.is_match(body)
        || has_stack_trace(body)
        || URL.is_match(body)
        || has_genuine_call(body)
        || KEYWORD_SHAPE.is_match(body)
}
