//! Code block detection and redaction for chat text.
//!
//! Finds spans of free-form chat text that are code or error output, as
//! offset-addressed [`CodeBlock`]s, and replaces them with placeholders.
//! The same renderability filter feeds highlighting and redaction, so what
//! is highlighted is exactly what gets removed.

pub mod cache;
pub mod classify;
pub mod detector;
pub mod fences;
pub mod guards;
pub mod language;
pub mod line;
pub mod merge;
pub mod message;
pub mod patterns;
pub mod redact;
pub mod render;
pub mod segments;
pub mod types;


pub use cache::{Cache, MemoryCache};
pub use classify::CodeClassifier;
pub use detector::Detector;
pub use language::Language;
pub use message::Message;
pub use redact::{apply_placeholders, placeholder_for};
pub use render::filter_renderable_blocks;
pub use types::{BlockKind, CodeBlock};

use regex::Regex;

/// Compile a pattern from the static tables.
pub(crate) fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

/// Find code blocks with default thresholds.
pub fn find_code_blocks(text: &str, aggressive: bool) -> Vec<CodeBlock> {
    Detector::default().find_code_blocks(text, aggressive)
}

/// Redact code from `text` with default thresholds.
pub fn remove_code(text: &str) -> String {
    Detector::default().remove_code(text)
}

/// Whether non-aggressive detection finds code in `text`.
pub fn has_code(text: &str) -> bool {
    Detector::default().has_code(text)
}
