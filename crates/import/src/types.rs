//! Import pipeline type definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chatlens_detect::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation read from an export, in message order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Options for the import operation.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Export files or directories to read
    pub paths: Vec<PathBuf>,

    /// Path substrings to skip
    pub exclude: Vec<String>,
}

/// A message after classification and redaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedMessage {
    pub id: String,

    pub role: String,

    /// Content with code replaced by placeholders
    pub content: String,

    pub has_code: bool,

    pub is_media: bool,

    /// Renderable blocks replaced on the first redaction pass
    pub code_blocks: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(
        rename = "named_entities",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub named_entities: BTreeMap<String, Vec<String>>,
}

/// Per-conversation import result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResult {
    pub id: String,

    pub title: String,

    /// Strongly code-like messages in the conversation
    pub code_heavy_count: usize,

    /// Whether the count reached the code-heavy threshold
    pub code_heavy: bool,

    pub messages: Vec<ProcessedMessage>,
}

/// Statistics from an import operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    /// Export files parsed
    pub files_count: u32,

    /// Export files skipped because they could not be read or parsed
    pub files_skipped: u32,

    pub conversations_count: u32,

    pub messages_count: u32,

    pub code_messages_count: u32,

    pub media_messages_count: u32,

    /// Blocks replaced across all messages
    pub code_blocks_redacted: u64,

    /// Total bytes read
    pub bytes_processed: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Output of an import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub generated_at: DateTime<Utc>,

    /// Export files that contributed conversations
    pub sources: Vec<PathBuf>,

    pub stats: ImportStats,

    pub conversations: Vec<ConversationResult>,
}
