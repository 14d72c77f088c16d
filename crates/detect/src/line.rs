//! Line-level classification.
//!
//! A line is code-like when it continues the previous line (a closing brace
//! after an indented body, a stack frame after an error message), matches a
//! strong indicator, or, failing both, has the loose shape of code for the
//! current mode.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

use crate::guards::{
    has_genuine_call, is_latex_math, is_markdown_prose, is_media_line,
    is_natural_function_mention, is_separator_line, looks_like_natural_sentence,
};
use crate::re;
use crate::redact::strip_placeholders;

/// A `(previous line, current line)` shape pair. When both match, the
/// current line belongs to the same block as the previous one.
pub struct Continuation {
    pub name: &'static str,
    prev: Regex,
    current: Regex,
}

impl Continuation {
    fn new(name: &'static str, prev: &str, current: &str) -> Self {
        Self {
            name,
            prev: re(prev),
            current: re(current),
        }
    }

    /// Whether this rule joins `current` to `prev`.
    pub fn matches(&self, prev: &str, current: &str) -> bool {
        self.prev.is_match(prev) && self.current.is_match(current)
    }
}

const SDK_FIELD: &str =
    r"(?:model|messages|role|content|prompt|max_tokens|temperature|top_p|stop|n|stream|functions|tools)";

pub static CONTINUATIONS: Lazy<Vec<Continuation>> = Lazy::new(|| {
    vec![
        Continuation::new("bracket-open", r"[\[{(]\s*$", r"^\s+\S|^\s*[}\])]"),
        Continuation::new("stack-chain", r"^\s*at\s", r"^\s*at\s"),
        Continuation::new(
            "error-to-frame",
            r"(?:Error|Exception|Warning)\b|^\s*(?:Uncaught|Unhandled)\b",
            r"^\s*at\s+\S",
        ),
        Continuation::new("trailing-dot", r"[\w$)\]]\.\s*$", r"^\s*[A-Za-z_$]"),
        Continuation::new("leading-dot", r"\S", r"^\s*\.[A-Za-z_$][\w$]*"),
        Continuation::new("template-open", r"^[^`]*`[^`]*$", r"\S"),
        Continuation::new("template-close", r"\S", r"^[^`]*`\s*[;,)]+\s*$"),
        Continuation::new(
            "comment",
            r"^\s*(?:/\*|\*(?:\s|$)|//)",
            r"^\s*(?:\*(?:\s|/|$)|//)",
        ),
        Continuation::new("json-key-open", r#"^\s*"?[\w$-]+"?\s*:\s*[\[{]?\s*$"#, r"^\s+\S"),
        Continuation::new("json-sequence", r"[,\[{]\s*$", r#"^\s*"[^"\n]+"\s*:"#),
        Continuation::new(
            "sdk-call-fields",
            r"\b(?:createChatCompletion|createCompletion|createImage|createEmbedding|completions\.create|responses\.create)\s*\(",
            &format!(r"^\s*{SDK_FIELD}\s*:"),
        ),
        Continuation::new(
            "sdk-fields",
            &format!(r"^\s*{SDK_FIELD}\s*:"),
            &format!(r"^\s*(?:{SDK_FIELD}\s*:|[\[{{}}\]])"),
        ),
        Continuation::new("console-args", r"\bconsole\.\w+\([^)]*$", r"^\s+\S"),
        Continuation::new(
            "router-body",
            r"\b(?:router|app)\.(?:get|post|put|patch|delete|use|all)\(",
            r"^\s+\S|^\s*\}",
        ),
        Continuation::new("try-body", r"^\s*try\s*\{?\s*$", r"\S"),
        Continuation::new("close-then-clause", r"^\s*\}\s*$", r"^\s*(?:catch|finally|else)\b"),
        Continuation::new("trailing-comma", r",\s*$", r"^\s+\S"),
        Continuation::new("trailing-operator", r"(?:[=+\-*/%?]|&&|\|\||=>)\s*$", r"^\s+\S"),
        Continuation::new("indented-close", r"^\s+\S", r"^\s*[}\])]+[;,)]*\s*$"),
        Continuation::new("traceback-source", r#"^\s*File\s+"[^"]+",\s+line\s+\d+"#, r"^\s{2,}\S"),
        Continuation::new("traceback-frames", r"^Traceback \(most recent call last\):", r#"^\s+File\s+""#),
        Continuation::new("html-children", r"<[A-Za-z][^<>]*>\s*$", r"^\s+\S|^\s*</"),
        Continuation::new("indented-key-values", r"^\s+[\w$]+:\s+\S", r"^\s+[\w$]+:\s+\S"),
    ]
});

static STRONG_INDICATORS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        // stack frames
        r"^\s*at\s+(?:async\s+)?\S.*(?::\d+(?::\d+)?\)?|\(native\)|\(<anonymous>\))\s*$",
        r"^\s*at\s+(?:new\s+|async\s+)?[\w$.<>\[\]]+\s+\(",
        r#"^\s*File\s+"[^"]+",\s+line\s+\d+"#,
        r"^Traceback \(most recent call last\):",
        // HTTP request lines
        r"\b(?:GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS)\s+(?:https?://|/)\S*",
        // declarations
        r"^\s*(?:export\s+)?(?:const|let|var)\s+[\w${\[][^=]*=",
        r"^\s*(?:export\s+(?:default\s+)?)?(?:async\s+)?function\*?\s*[\w$]*\s*\([^)]*\)\s*\{?\s*$",
        r"^\s*(?:export\s+(?:default\s+)?)?(?:abstract\s+)?class\s+[A-Z][\w$]*(?:\s+(?:extends|implements)\s+[\w$.]+)?\s*\{?\s*$",
        r"^\s*(?:async\s+)?def\s+\w+\s*\(.*\)\s*(?:->\s*[^:]+)?:\s*$",
        r"^\s*(?:pub(?:\([\w:]+\))?\s+)?(?:async\s+)?fn\s+\w+\s*[<(]",
        r#"^\s*import\s+(?:[\w*{}\s,]+\s+from\s+)?['"][^'"]+['"];?\s*$"#,
        r"^\s*from\s+[\w.]+\s+import\s+[\w.*, ]+$",
        r"^\s*import\s+[\w.]+(?:\s+as\s+\w+)?;?\s*$",
        r#"\brequire\(\s*['"][^'"]+['"]\s*\)"#,
        r"^\s*module\.exports\s*=",
        // thrown errors
        r"^\s*(?:Uncaught\s+)?(?:[\w$]+\.)*(?:[A-Z][\w$]*)?(?:Error|Exception)(?:\s*\[[\w-]+\])?(?::|\s*$)",
        r"^\s*throw\s+new\s+\w+",
        // response-status and console calls
        r"\bres\.(?:status|json|send|sendStatus|redirect|render)\(",
        r"\bconsole\.(?:log|error|warn|info|debug|table)\(",
        // bracketed key:value
        r#"^\s*[\[{]?\s*"[^"\n]+"\s*:\s*\S"#,
        // file:line references
        r"[\w./\\-]+\.(?:js|jsx|ts|tsx|mjs|cjs|py|rb|go|rs|java|php|c|cc|cpp|cs|kt|swift):\d+(?::\d+)?",
        // markup
        r#"^\s*</?[A-Za-z][\w.-]*(?:\s+[\w:.-]+(?:=(?:"[^"]*"|'[^']*'|\{[^}]*\}))?)*\s*/?>"#,
        // arrow functions and control flow
        r"\)\s*=>|\b[\w$]+\s*=>\s*[{(\w]",
        r"^\s*(?:if|for|while|switch|catch)\s*\(.*\)\s*\{\s*$",
        r"^\s*\}\s*(?:else|catch|finally)\b",
        r"^\s*(?:return|await)\s+.+;\s*$",
        r#"^\s*[\w$.\[\]'"]+\s*(?:=|\+=|-=|\|\|=|\?\?=)\s*[^=\s].*;\s*$"#,
        r"^\s*(?:public|private|protected|static)\s+[\w<>\[\]]+\s+\w+\s*\(",
        r#"^\s*#include\s*[<"]|^\s*#!/"#,
        r"^\s*[$>]\s+(?:npm|npx|yarn|pnpm|pip3?|python3?|node|git|cargo|curl|docker|cd|ls|sudo)\b",
    ])
    .expect("strong indicator patterns compile")
});

static INDENTED_WORD: Lazy<Regex> = Lazy::new(|| re(r"^\s{2,}[\w$]"));
static OPERATOR_CHARS: Lazy<Regex> = Lazy::new(|| re(r"[{}\[\]<>]|[^=!<>]=[^=]|;\s*$"));
static METHOD_CHAIN: Lazy<Regex> = Lazy::new(|| re(r"[\w$)\]]\.[A-Za-z_$][\w$]*\("));
static ANY_OPERATOR: Lazy<Regex> = Lazy::new(|| re(r"[{}\[\]()<>=;|&]"));
static PATH_LIKE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?:^|\s)(?:~|\.{1,2})?/[\w.\-]+(?:/[\w.\-]*)+|[A-Za-z]:\\[\w\\.\-]+|\b[\w-]+/[\w-]+\.[a-z]{1,4}\b")
});
static URL: Lazy<Regex> = Lazy::new(|| re(r"https?://\S+"));
static DEEP_INDENT: Lazy<Regex> = Lazy::new(|| re(r"^(?: {4,}|\t)\S"));

/// Byte range of one line, excluding its `\n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Split `text` into line spans. Always yields at least one span.
pub(crate) fn line_spans(text: &str) -> Vec<LineSpan> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            spans.push(LineSpan { start, end: i });
            start = i + 1;
        }
    }
    spans.push(LineSpan { start, end: text.len() });
    spans
}

/// Index of the line containing byte `offset`.
pub(crate) fn line_index(spans: &[LineSpan], offset: usize) -> usize {
    spans
        .partition_point(|span| span.end < offset)
        .min(spans.len().saturating_sub(1))
}

/// Name of the first continuation rule joining `current` to `prev`.
pub fn continuation(prev: &str, current: &str) -> Option<&'static str> {
    CONTINUATIONS
        .iter()
        .find(|rule| rule.matches(prev, current))
        .map(|rule| rule.name)
}

/// Whether `current` continues the block `prev` belongs to.
pub fn continues(prev: &str, current: &str) -> bool {
    continuation(prev, current).is_some()
}

/// Whether the line matches a strong code / error indicator on its own.
pub fn is_strong_line(line: &str) -> bool {
    let line = strip_placeholders(line);
    !line.trim().is_empty()
        && !is_latex_math(&line)
        && !is_natural_function_mention(&line)
        && STRONG_INDICATORS.is_match(&line)
}

/// Decide whether `line` belongs to a code or error block, given the line
/// before it.
pub fn is_code_like(line: &str, prev: Option<&str>, aggressive: bool) -> bool {
    let line = strip_placeholders(line);
    let trimmed = line.trim();
    if trimmed.is_empty() || is_separator_line(trimmed) {
        return false;
    }

    if let Some(prev) = prev {
        let prev = strip_placeholders(prev);
        if !prev.trim().is_empty() && continues(&prev, &line) {
            return true;
        }
    }

    if is_latex_math(&line) || is_natural_function_mention(&line) {
        return false;
    }

    if STRONG_INDICATORS.is_match(&line) {
        return true;
    }

    if is_media_line(&line) || is_markdown_prose(&line) || looks_like_natural_sentence(&line) {
        return false;
    }

    if aggressive {
        ANY_OPERATOR.is_match(&line)
            || has_genuine_call(&line)
            || PATH_LIKE.is_match(&line)
            || URL.is_match(&line)
            || DEEP_INDENT.is_match(&line)
            || METHOD_CHAIN.is_match(&line)
    } else {
        INDENTED_WORD.is_match(&line)
            || OPERATOR_CHARS.is_match(&line)
            || has_genuine_call(&line)
            || METHOD_CHAIN.is_match(&line)
    }
}
