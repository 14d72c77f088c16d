//! Chat-export import pipeline.
//!
//! Reads export files, classifies every message and redacts code so the
//! conversations can be indexed as prose.

pub mod parser;
pub mod progress;
pub mod types;

#[cfg(test)]
mod tests;

pub use parser::parse_export;
pub use progress::{ProgressCallback, ProgressEvent, ProgressReporter};
pub use types::{
    Conversation, ConversationResult, ImportOptions, ImportReport, ImportStats, ProcessedMessage,
};

use std::path::{Path, PathBuf};
use std::time::Instant;

use chatlens_core::{AppResult, DetectionConfig};
use chatlens_detect::CodeClassifier;
use chrono::Utc;
use walkdir::WalkDir;

/// Import every export file under `options.paths`.
///
/// Files that cannot be read or parsed are logged and counted as skipped;
/// they never fail the whole import.
pub async fn import(
    options: &ImportOptions,
    config: &DetectionConfig,
    reporter: &ProgressReporter,
) -> AppResult<ImportReport> {
    let start = Instant::now();

    tracing::info!("Starting import of {} path(s)", options.paths.len());

    let files = discover_files(options, reporter);
    let total_files = files.len() as u64;
    let classifier = CodeClassifier::new(config.clone());

    let mut stats = ImportStats::default();
    let mut sources = Vec::new();
    let mut conversations = Vec::new();

    for (index, path) in files.iter().enumerate() {
        let display_path = path.display().to_string();
        reporter.parse(index as u64 + 1, Some(total_files), &display_path);

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", display_path, e);
                stats.files_skipped += 1;
                continue;
            }
        };

        let parsed = match parse_export(&raw, &fallback_id(path)) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", display_path, e);
                stats.files_skipped += 1;
                continue;
            }
        };

        tracing::info!("Parsed {} conversation(s) from {}", parsed.len(), display_path);
        stats.files_count += 1;
        stats.bytes_processed += raw.len() as u64;
        sources.push(path.clone());

        let total_conversations = parsed.len() as u64;
        for (position, conversation) in parsed.iter().enumerate() {
            reporter.classify(
                position as u64 + 1,
                Some(total_conversations),
                &conversation.id,
            );
            let result = process_conversation(&classifier, conversation, &mut stats);
            conversations.push(result);
        }
    }

    stats.conversations_count = conversations.len() as u32;
    stats.duration_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        "Import completed: {} files ({} skipped), {} conversations, {} messages, {} with code, {} blocks redacted in {:.2}s",
        stats.files_count,
        stats.files_skipped,
        stats.conversations_count,
        stats.messages_count,
        stats.code_messages_count,
        stats.code_blocks_redacted,
        stats.duration_secs
    );

    Ok(ImportReport {
        generated_at: Utc::now(),
        sources,
        stats,
        conversations,
    })
}

/// Classify and redact one conversation's messages.
pub fn process_conversation(
    classifier: &CodeClassifier,
    conversation: &Conversation,
    stats: &mut ImportStats,
) -> ConversationResult {
    let code_heavy_count = classifier.record_conversation(&conversation.id, &conversation.messages);
    let code_heavy = classifier.is_code_heavy_conversation(&conversation.id);

    let messages = conversation
        .messages
        .iter()
        .map(|message| {
            let is_media = message.is_media();
            let has_code = classifier.is_code_content_in(message, &conversation.id);

            let (content, code_blocks) = if has_code {
                let text = message.content_text();
                let blocks = classifier.detector().renderable_blocks(&text).len();
                (classifier.redact_message(message), blocks)
            } else {
                (message.content_text(), 0)
            };

            stats.messages_count += 1;
            if has_code {
                stats.code_messages_count += 1;
            }
            if is_media {
                stats.media_messages_count += 1;
            }
            stats.code_blocks_redacted += code_blocks as u64;

            ProcessedMessage {
                id: message.id.clone(),
                role: message.role.clone(),
                content,
                has_code,
                is_media,
                code_blocks,
                tags: message.tags.clone(),
                named_entities: message.named_entities.clone(),
            }
        })
        .collect();

    ConversationResult {
        id: conversation.id.clone(),
        title: conversation.title.clone(),
        code_heavy_count,
        code_heavy,
        messages,
    }
}

/// Write the report as pretty JSON.
pub async fn write_report(report: &ImportReport, path: &Path) -> AppResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json).await?;
    tracing::info!("Report written to {}", path.display());
    Ok(())
}

/// Collect `.json` export files, in path order, honoring excludes.
fn discover_files(options: &ImportOptions, reporter: &ProgressReporter) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in &options.paths {
        if path.is_file() {
            if should_include(path, options) {
                files.push(path.clone());
                reporter.discover(files.len() as u64, &path.display().to_string());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file() && is_json(entry_path) && should_include(entry_path, options)
                {
                    files.push(entry_path.to_path_buf());
                    reporter.discover(files.len() as u64, &entry_path.display().to_string());
                }
            }
        } else {
            tracing::warn!("Path not found: {}", path.display());
        }
    }

    tracing::debug!("Discovered {} export file(s)", files.len());
    files
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Check if a file should be included based on exclude patterns.
fn should_include(path: &Path, options: &ImportOptions) -> bool {
    let path_str = path.to_string_lossy();
    !options
        .exclude
        .iter()
        .any(|pattern| path_str.contains(pattern.as_str()))
}

fn fallback_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "conversation".to_string())
}
