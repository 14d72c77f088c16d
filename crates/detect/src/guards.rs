//! Negative filters that keep prose, math and media metadata out of code
//! detection.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::re;

static HEADING: Lazy<Regex> = Lazy::new(|| re(r"^\s{0,3}#{1,6}\s+\S"));
static LIST_MARKER: Lazy<Regex> = Lazy::new(|| re(r"^\s*(?:[-*+•]|\d{1,3}[.)])\s+\S"));
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| re(r"^\s*>\s+\S"));
static EMPHASIS: Lazy<Regex> = Lazy::new(|| {
    re(r"(?:\*\*|__)[^*_\n]+(?:\*\*|__)|(?:^|\s)\*[^*\s][^*\n]*\*(?:\s|[.,!?:;]|$)")
});

static SEPARATOR: Lazy<Regex> = Lazy::new(|| re(r"^\s*(?:-{3,}|_{3,}|={3,}|\*{3,})\s*$"));

static STRONG_CODE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    re(r"(?m)[{}]|;\s*$|=>|===?|!==?|&&|\|\||\+=|-=|::|</?[A-Za-z][\w-]*\s*/?>")
});

static CALL: Lazy<Regex> =
    Lazy::new(|| re(r"([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\(([^()\n]*)\)"));

static WORD_PHRASE: Lazy<Regex> =
    Lazy::new(|| re(r"^[A-Za-z][A-Za-z'’\-]*(?:\s+[A-Za-z][A-Za-z'’\-]*)*\.?$"));

static FUNCTION_MENTION: Lazy<Regex> = Lazy::new(|| re(r"(?i)\bfunctions?\s*\(([^()\n]*)\)"));

static LATEX_DELIMITER: Lazy<Regex> = Lazy::new(|| re(r"\\[()\[\]]|\$\$[^$\n]+\$\$"));
static LATEX_MACRO: Lazy<Regex> = Lazy::new(|| {
    re(concat!(
        r"\\(?:frac|dfrac|tfrac|sqrt|sum|prod|int|oint|lim|infty|cdots?|ldots|times|div|pm|mp",
        r"|leq?|geq?|neq|approx|equiv|propto|notin|subseteq|subset|forall|exists|partial|nabla",
        r"|alpha|beta|gamma|delta|epsilon|varepsilon|zeta|theta|vartheta|kappa|lambda|sigma",
        r"|upsilon|varphi|omega|pi|mu|nu|xi|rho|tau|phi|psi|chi|eta",
        r"|Gamma|Delta|Theta|Lambda|Sigma|Pi|Xi|Phi|Psi|Omega",
        r"|mathbf|mathrm|mathbb|mathcal|textbf|operatorname|left|right|begin|overline|binom)\b"
    ))
});

static MEDIA_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    re(concat!(
        r"^\s*\[(?:Image|Generated Image|Voice/Audio Content|Audio|Voice|Video|Attachment)\b[^\]]*\]",
        r"|^\s*(?:Prompt|Revised Prompt|Model|Size|Dimensions|Resolution|Seed|Style|Quality)\s*:",
        r"|\b\d{2,5}\s*[x×]\s*\d{2,5}\b"
    ))
});

static STACK_TRACE: Lazy<Regex> = Lazy::new(|| {
    re(concat!(
        r"(?m)^\s*at\s+\S.*(?::\d+(?::\d+)?\)?|\(native\)|\(<anonymous>\))\s*$",
        r#"|^\s*File\s+"[^"]+",\s+line\s+\d+"#,
        r"|Traceback \(most recent call last\)",
        r"|@\S+:\d+:\d+"
    ))
});

static JS_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    re(r"\b(?:const|let|var|function|return|require|import|export|async|await|console|document|window|module\.exports)\b")
});

/// Whether the line is a horizontal rule such as `---` or `___`.
pub fn is_separator_line(line: &str) -> bool {
    SEPARATOR.is_match(line)
}

/// Whether the text carries a token that essentially never appears in prose:
/// braces, a line-final semicolon, arrows, comparison/logical operators,
/// HTML tags or a genuine function call.
pub fn has_strong_code_tokens(text: &str) -> bool {
    STRONG_CODE_TOKEN.is_match(text) || has_genuine_call(text)
}

/// Whether the text contains `name(args)` where the argument list is code
/// rather than an English aside such as `file(s)` or `tool(for example, git)`.
pub fn has_genuine_call(text: &str) -> bool {
    CALL.captures_iter(text).any(|caps| {
        let args = caps.get(2).map_or("", |m| m.as_str());
        let trimmed = args.trim();
        !matches!(trimmed, "s" | "es" | "ies") && !is_prose_args(trimmed)
    })
}

/// Number of genuine call shapes in the text.
pub fn count_calls(text: &str) -> usize {
    CALL.captures_iter(text)
        .filter(|caps| {
            let args = caps.get(2).map_or("", |m| m.as_str()).trim();
            !matches!(args, "s" | "es" | "ies") && !is_prose_args(args)
        })
        .count()
}

/// Comma-separated English words with no digits or code punctuation.
fn is_word_list(args: &str) -> bool {
    let args = args.trim();
    if args.is_empty() || args.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    args.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .all(|part| WORD_PHRASE.is_match(part))
}

fn ends_like_enumeration(args: &str) -> bool {
    let last = args.rsplit(',').next().unwrap_or("").trim().to_lowercase();
    last == "etc" || last == "etc." || last == "and more" || last.starts_with("and so on")
}

/// Parenthesized content that reads as English rather than arguments.
fn is_prose_args(args: &str) -> bool {
    if !is_word_list(args) {
        return false;
    }
    ends_like_enumeration(args)
        || args
            .split(',')
            .any(|part| part.trim().split_whitespace().count() > 1)
}

/// Headings, list items, block quotes or emphasis with no inline code and
/// no strong code tokens.
pub fn is_markdown_prose(text: &str) -> bool {
    if text.contains('`') || has_strong_code_tokens(text) {
        return false;
    }

    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return false;
    }

    let marked = lines.iter().filter(|l| is_markdown_line(l)).count();
    marked > 0
        && lines
            .iter()
            .all(|l| is_markdown_line(l) || alphabetic_ratio(l) >= 0.6)
}

fn is_markdown_line(line: &str) -> bool {
    HEADING.is_match(line)
        || LIST_MARKER.is_match(line)
        || BLOCKQUOTE.is_match(line)
        || EMPHASIS.is_match(line)
}

/// A line of ordinary English: ends in sentence punctuation, has no
/// backticks or strong code tokens, and is mostly letters. Long separator
/// lines count as prose too.
pub fn looks_like_natural_sentence(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    if is_separator_line(trimmed) {
        return true;
    }
    if trimmed.contains('`') || has_strong_code_tokens(trimmed) {
        return false;
    }

    let tail = trimmed.trim_end_matches(['"', '\'', ')', ']', '”', '’']);
    if !tail.ends_with(['.', '!', '?']) {
        return false;
    }

    alphabetic_ratio(trimmed) >= 0.7
}

/// Share of alphabetic characters among the non-whitespace characters.
pub fn alphabetic_ratio(text: &str) -> f64 {
    let mut letters = 0usize;
    let mut total = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if c.is_alphabetic() {
            letters += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        letters as f64 / total as f64
    }
}

/// LaTeX delimiters or math macros. Never code, whatever else is present.
pub fn is_latex_math(text: &str) -> bool {
    LATEX_DELIMITER.is_match(text) || LATEX_MACRO.is_match(text)
}

/// The English idiom "function (chill, focus, social, etc.)": a
/// parenthesized word list after "function" in text that has no braces,
/// semicolons or arrows.
pub fn is_natural_function_mention(text: &str) -> bool {
    if text.contains(['{', '}', ';']) || text.contains("=>") {
        return false;
    }
    FUNCTION_MENTION.captures_iter(text).any(|caps| {
        let args = caps.get(1).map_or("", |m| m.as_str()).trim();
        is_word_list(args)
            && (args.contains(',') || args.contains(' ') || ends_like_enumeration(args))
    })
}

/// Image / voice placeholder metadata such as `[Image]`, `Prompt:` or a
/// `1024x1024` dimension token.
pub fn is_media_placeholder(line: &str) -> bool {
    MEDIA_PLACEHOLDER.is_match(line)
}

/// A media placeholder line without coexisting code signals.
pub fn is_media_line(line: &str) -> bool {
    is_media_placeholder(line) && !has_strong_code_tokens(line)
}

/// Whether the text contains a stack-trace or traceback pattern.
pub fn has_stack_trace(text: &str) -> bool {
    STACK_TRACE.is_match(text)
}

/// Cheap pre-check for non-aggressive detection. Text without fences,
/// braces, a stack trace, two JS keywords or two calls cannot yield blocks.
pub fn passes_early_exit(text: &str) -> bool {
    text.contains("```")
        || text.contains(['{', '}'])
        || has_stack_trace(text)
        || JS_KEYWORD.find_iter(text).count() + text.matches("=>").count() >= 2
        || count_calls(text) >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_prose() {
        assert!(is_markdown_prose("## Getting started"));
        assert!(is_markdown_prose("- install the package\n- run it"));
        assert!(is_markdown_prose("This is **really** important"));
        assert!(!is_markdown_prose("- call `init()` first"));
        assert!(!is_markdown_prose("- const x = { a: 1 }"));
        assert!(!is_markdown_prose("plain words without markers"));
    }

    #[test]
    fn test_natural_sentence() {
        assert!(looks_like_natural_sentence("I tried that yesterday and it worked."));
        assert!(looks_like_natural_sentence("--------------"));
        assert!(!looks_like_natural_sentence("const x = 1;"));
        assert!(!looks_like_natural_sentence("Run `npm install` first."));
        assert!(!looks_like_natural_sentence("no punctuation at the end"));
        assert!(!looks_like_natural_sentence("Call foo(bar) to start."));
    }

    #[test]
    fn test_latex() {
        assert!(is_latex_math(r"\frac{1}{2} + \sqrt{2}"));
        assert!(is_latex_math(r"the area is \(\pi r^2\)"));
        assert!(is_latex_math(r"$$E = mc^2$$"));
        assert!(!is_latex_math("const x = { a: 1 };"));
        assert!(!is_latex_math(r"C:\index\files"));
    }

    #[test]
    fn test_natural_function_mention() {
        assert!(is_natural_function_mention(
            "function (chill, focus, social, etc.) helps me relax"
        ));
        assert!(is_natural_function_mention("each function(sleep, work, and more) matters"));
        assert!(!is_natural_function_mention("function (a, b) { return a + b; }"));
        assert!(!is_natural_function_mention("function(x1, x2)"));
        assert!(!is_natural_function_mention("plain prose"));
    }

    #[test]
    fn test_genuine_call() {
        assert!(has_genuine_call("foo()"));
        assert!(has_genuine_call("console.log(x)"));
        assert!(has_genuine_call("max(a, b)"));
        assert!(!has_genuine_call("the file(s) you sent"));
        assert!(!has_genuine_call("tools(for example git)"));
        assert!(!has_genuine_call("(for example)"));
    }

    #[test]
    fn test_media_lines() {
        assert!(is_media_line("[Image]"));
        assert!(is_media_line("[Image Generated: a red fox]"));
        assert!(is_media_line("[Voice/Audio Content]"));
        assert!(is_media_line("Prompt: a cat on a sofa"));
        assert!(is_media_line("size 1024x1024"));
        assert!(!is_media_line("{ size: '1024x1024' }"));
        assert!(!is_media_line("model: \"gpt-4\""));
    }

    #[test]
    fn test_early_exit() {
        assert!(!passes_early_exit("Just a normal sentence about my day."));
        assert!(!passes_early_exit("function (chill, focus, social, etc.) helps me relax"));
        assert!(passes_early_exit("```\ncode\n```"));
        assert!(passes_early_exit("obj = { a: 1 }"));
        assert!(passes_early_exit("Error\n    at foo (/app/x.js:1:2)"));
        assert!(passes_early_exit("const x = require('fs')"));
        assert!(passes_early_exit("call foo(1) then bar(2)"));
    }

    #[test]
    fn test_separator() {
        assert!(is_separator_line("---"));
        assert!(is_separator_line("  ______  "));
        assert!(!is_separator_line("--"));
        assert!(!is_separator_line("--verbose"));
    }
}
