//! Chat export parsing.
//!
//! Accepted shapes:
//! - ChatGPT `conversations.json`: conversations with a `mapping` node graph
//! - `{ "conversations": [...] }` wrappers
//! - arrays of `{ id, title, messages }`
//! - a flat array of messages (one conversation)

use std::collections::BTreeMap;

use chatlens_core::{AppError, AppResult};
use chatlens_detect::Message;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::Conversation;

/// A `mapping` node in a ChatGPT export.
#[derive(Debug, Deserialize)]
struct MappingNode {
    #[serde(default)]
    message: Option<ExportMessage>,
}

#[derive(Debug, Deserialize)]
struct ExportMessage {
    #[serde(default)]
    id: String,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default)]
    create_time: Option<f64>,

    #[serde(default)]
    content: Option<ExportContent>,

    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    role: String,
}

#[derive(Debug, Deserialize)]
struct ExportContent {
    #[serde(default)]
    content_type: String,

    #[serde(default)]
    parts: Vec<Value>,

    #[serde(default)]
    text: Option<String>,

    /// Set on `code` content, e.g. "python" or "unknown"
    #[serde(default)]
    language: Option<String>,
}

/// Text and media hints extracted from an export content object.
#[derive(Debug, Default, PartialEq)]
struct ExtractedContent {
    text: String,
    is_image: bool,
    is_voice: bool,
}

/// Parse an export file's JSON into conversations.
///
/// `fallback_id` names conversations that carry no id of their own.
pub fn parse_export(raw: &str, fallback_id: &str) -> AppResult<Vec<Conversation>> {
    let value: Value = serde_json::from_str(raw)?;
    parse_value(value, fallback_id)
}

fn parse_value(value: Value, fallback_id: &str) -> AppResult<Vec<Conversation>> {
    match value {
        Value::Object(mut object) => {
            if let Some(conversations) = object.remove("conversations") {
                return parse_value(conversations, fallback_id);
            }
            if object.contains_key("mapping") || object.contains_key("messages") {
                return Ok(vec![parse_conversation(object, fallback_id)?]);
            }
            Err(AppError::Import(
                "Unrecognized export object: expected `conversations`, `mapping` or `messages`"
                    .to_string(),
            ))
        }
        Value::Array(items) => {
            if items.is_empty() {
                return Ok(Vec::new());
            }
            if items.iter().all(is_conversation_object) {
                return items
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, item)| match item {
                        Value::Object(object) => Some((i, object)),
                        _ => None,
                    })
                    .map(|(i, object)| parse_conversation(object, &format!("{fallback_id}-{i}")))
                    .collect();
            }

            let messages: Vec<Message> = serde_json::from_value(Value::Array(items))?;
            Ok(vec![Conversation {
                id: fallback_id.to_string(),
                title: fallback_id.to_string(),
                messages,
            }])
        }
        _ => Err(AppError::Import(
            "Unrecognized export: expected a JSON object or array".to_string(),
        )),
    }
}

fn is_conversation_object(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.contains_key("mapping") || o.contains_key("messages"))
}

fn parse_conversation(mut object: Map<String, Value>, fallback_id: &str) -> AppResult<Conversation> {
    let id = ["id", "conversation_id"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .unwrap_or(fallback_id)
        .to_string();
    let title = object
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let messages = if let Some(mapping) = object.remove("mapping") {
        let nodes: BTreeMap<String, MappingNode> = serde_json::from_value(mapping)?;
        messages_from_mapping(nodes)
    } else {
        match object.remove("messages") {
            Some(messages) => serde_json::from_value(messages)?,
            None => Vec::new(),
        }
    };

    tracing::debug!(conversation = %id, messages = messages.len(), "Parsed conversation");
    Ok(Conversation { id, title, messages })
}

/// Flatten a `mapping` graph into messages ordered by `create_time`.
///
/// Nodes without a timestamp keep their key order after the timed ones.
fn messages_from_mapping(nodes: BTreeMap<String, MappingNode>) -> Vec<Message> {
    let mut timed: Vec<(f64, Message)> = Vec::new();
    let mut untimed: Vec<Message> = Vec::new();

    for node in nodes.into_values() {
        let Some(export) = node.message else {
            continue;
        };
        let role = export.author.map(|a| a.role).unwrap_or_default();
        let extracted = export
            .content
            .as_ref()
            .map(extract_content)
            .unwrap_or_default();

        if extracted.text.trim().is_empty() && !extracted.is_image && !extracted.is_voice {
            continue;
        }

        let message = Message {
            id: export.id,
            role,
            content: Value::String(extracted.text),
            is_voice: extracted.is_voice.then_some(true),
            is_image: extracted.is_image.then_some(true),
            metadata: export.metadata,
            ..Message::default()
        };

        match export.create_time {
            Some(time) => timed.push((time, message)),
            None => untimed.push(message),
        }
    }

    timed.sort_by(|a, b| a.0.total_cmp(&b.0));
    timed
        .into_iter()
        .map(|(_, message)| message)
        .chain(untimed)
        .collect()
}

fn extract_content(content: &ExportContent) -> ExtractedContent {
    let mut extracted = ExtractedContent::default();
    let mut pieces: Vec<String> = Vec::new();

    if let Some(text) = content.text.as_deref().filter(|t| !t.is_empty()) {
        if content.content_type == "code" {
            pieces.push(fence_code(text, content.language.as_deref()));
        } else {
            pieces.push(text.to_string());
        }
    }

    for part in &content.parts {
        match part {
            Value::String(s) if !s.is_empty() => pieces.push(s.clone()),
            Value::Object(object) => {
                match object.get("content_type").and_then(Value::as_str) {
                    Some("image_asset_pointer") => extracted.is_image = true,
                    Some("audio_asset_pointer") | Some("real_time_user_audio_video_asset_pointer") => {
                        extracted.is_voice = true
                    }
                    Some("audio_transcription") => {
                        extracted.is_voice = true;
                        if let Some(text) = object.get("text").and_then(Value::as_str) {
                            pieces.push(text.to_string());
                        }
                    }
                    _ => {
                        if let Some(text) = object.get("text").and_then(Value::as_str) {
                            pieces.push(text.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    extracted.text = pieces.join("\n");
    extracted
}

/// Code content carries no markdown of its own; fence it so detection sees
/// it as a block with its language.
fn fence_code(text: &str, language: Option<&str>) -> String {
    if text.trim_start().starts_with("```") {
        return text.to_string();
    }
    let info = language
        .map(str::trim)
        .filter(|lang| !lang.is_empty() && *lang != "unknown")
        .unwrap_or_default();
    format!("```{}\n{}\n```", info, text.trim_end())
}
