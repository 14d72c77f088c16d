//! Language labels for detected blocks.

use serde::{Deserialize, Serialize};

use crate::guards::has_stack_trace;

/// Programming language guessed for an unlabelled block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    TypeScript,
    JavaScript,
    Python,
    Go,
    Html,
    Json,
    Shell,
    Sql,
    /// Error output and stack traces
    Plaintext,
}

impl Language {
    /// Lowercase label, as used in fence info strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Go => "go",
            Self::Html => "html",
            Self::Json => "json",
            Self::Shell => "shell",
            Self::Sql => "sql",
            Self::Plaintext => "plaintext",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a fence info string (` ```js title="x" `) to a language label.
///
/// Keeps the first token, drops pandoc-style `{.lang}` wrapping, lowercases,
/// and removes anything outside `[a-z0-9+#._-]`.
pub fn normalize_fence_language(info: &str) -> Option<String> {
    let token = info.split_whitespace().next()?;
    let token = token.trim_start_matches('{').trim_start_matches('.');
    let label: String = token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '.' | '_' | '-'))
        .collect::<String>()
        .to_ascii_lowercase();

    (!label.is_empty()).then_some(label)
}

/// Guess the language of a block from its content.
pub fn guess_language(text: &str) -> Option<Language> {
    let trimmed = text.trim();

    if has_stack_trace(text) && !text.contains("Traceback") {
        return Some(Language::Plaintext);
    }

    if text.contains("Traceback (most recent call last)")
        || (text.contains("def ") && (text.contains("import ") || text.contains("):")))
        || (text.contains("from ") && text.contains(" import "))
    {
        return Some(Language::Python);
    }

    if text.contains("fn ") && (text.contains("impl ") || text.contains("pub ") || text.contains("let mut ")) {
        return Some(Language::Rust);
    }

    if text.contains("func ") && text.contains("package ") {
        return Some(Language::Go);
    }

    if text.contains("interface ") || text.contains(": string") || text.contains(": number") {
        return Some(Language::TypeScript);
    }

    if text.contains("function ")
        || text.contains("const ")
        || text.contains("let ")
        || text.contains("=> ")
        || text.contains("require(")
        || text.contains("console.")
    {
        return Some(Language::JavaScript);
    }

    if trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") || trimmed.starts_with("<div") {
        return Some(Language::Html);
    }

    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && trimmed.contains("\":")
        && !trimmed.contains(';')
    {
        return Some(Language::Json);
    }

    let upper = trimmed.to_ascii_uppercase();
    if (upper.starts_with("SELECT ") && upper.contains(" FROM "))
        || upper.starts_with("INSERT INTO ")
        || upper.starts_with("CREATE TABLE ")
    {
        return Some(Language::Sql);
    }

    if trimmed
        .lines()
        .all(|line| line.trim_start().starts_with("$ ") || line.trim().is_empty())
    {
        return Some(Language::Shell);
    }

    None
}
