//! Chat message model as consumed by the classifier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Metadata keys whose truthy presence marks a message as media.
const MEDIA_METADATA_FLAGS: &[&str] = &[
    "image_generation",
    "dalle",
    "is_image",
    "is_voice",
    "voice_mode",
    "audio_transcription",
];

/// One chat message.
///
/// `content` is kept as raw JSON: exports carry strings, structured parts
/// or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub content: Value,

    #[serde(rename = "isVoice", default, skip_serializing_if = "Option::is_none")]
    pub is_voice: Option<bool>,

    #[serde(rename = "isImage", default, skip_serializing_if = "Option::is_none")]
    pub is_image: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub named_entities: BTreeMap<String, Vec<String>>,
}

impl Message {
    /// Build a plain-text message.
    pub fn text(id: impl Into<String>, role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            content: Value::String(content.into()),
            ..Self::default()
        }
    }

    /// Content coerced to a string.
    ///
    /// Strings are returned as-is, `null` as empty, anything else as its
    /// JSON serialization.
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Whether the message is flagged as image or voice content.
    pub fn is_media(&self) -> bool {
        if self.is_voice == Some(true) || self.is_image == Some(true) {
            return true;
        }

        let Some(Value::Object(metadata)) = &self.metadata else {
            return false;
        };

        let flagged = MEDIA_METADATA_FLAGS
            .iter()
            .any(|key| metadata.get(*key).is_some_and(is_truthy));
        let media_type = metadata
            .get("content_type")
            .and_then(Value::as_str)
            .map(str::to_ascii_lowercase)
            .is_some_and(|t| t.contains("image") || t.contains("audio") || t.contains("voice"));

        flagged || media_type
    }

    /// Hex SHA-256 of the coerced content.
    pub fn content_hash(&self) -> String {
        content_hash(&self.content_text())
    }
}

/// Hex SHA-256 of `text`.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}
