//! End-to-end import runs over temporary export directories.

use std::fs;
use std::sync::{Arc, Mutex};

use chatlens_core::DetectionConfig;
use serde_json::json;
use tempfile::TempDir;

use crate::{import, write_report, ImportOptions, ImportReport, ProgressEvent, ProgressReporter};

fn write_json(dir: &TempDir, name: &str, value: serde_json::Value) {
    fs::write(dir.path().join(name), value.to_string()).unwrap();
}

fn sample_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_json(
        &dir,
        "chat.json",
        json!([{
            "id": "conv-1",
            "title": "Deploy help",
            "messages": [
                { "id": "m1", "role": "user", "content": "Run this:\n\n```sh\nnpm test\n```", "tags": ["deploy"] },
                { "id": "m2", "role": "assistant", "content": "Thanks! That fixed it.",
                  "named_entities": { "tools": ["npm"] } },
                { "id": "m3", "role": "assistant", "content": "{\"prompt\":\"a cat\"}", "isImage": true }
            ]
        }]),
    );
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    fs::write(dir.path().join("notes.txt"), "```js\nx()\n```").unwrap();
    dir
}

async fn run(options: ImportOptions) -> ImportReport {
    import(&options, &DetectionConfig::default(), &ProgressReporter::noop())
        .await
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_import_classifies_and_redacts() {
        let dir = sample_dir();
        let report = run(ImportOptions {
            paths: vec![dir.path().to_path_buf()],
            exclude: Vec::new(),
        })
        .await;

        assert_eq!(report.stats.files_count, 1);
        assert_eq!(report.stats.files_skipped, 1);
        assert_eq!(report.stats.conversations_count, 1);
        assert_eq!(report.stats.messages_count, 3);
        assert_eq!(report.stats.code_messages_count, 1);
        assert_eq!(report.stats.media_messages_count, 1);
        assert_eq!(report.stats.code_blocks_redacted, 1);

        let conversation = &report.conversations[0];
        assert_eq!(conversation.id, "conv-1");
        assert!(!conversation.code_heavy);

        let messages = &conversation.messages;
        assert_eq!(messages[0].content, "Run this:\n\n[SH Block]");
        assert!(messages[0].has_code);
        assert_eq!(messages[0].tags, vec!["deploy".to_string()]);

        assert_eq!(messages[1].content, "Thanks! That fixed it.");
        assert_eq!(messages[1].named_entities["tools"], vec!["npm".to_string()]);

        assert!(messages[2].is_media);
        assert!(!messages[2].has_code);
        assert_eq!(messages[2].content, "{\"prompt\":\"a cat\"}");
    }

    #[tokio::test]
    async fn test_exclude_patterns_skip_files() {
        let dir = sample_dir();
        let report = run(ImportOptions {
            paths: vec![dir.path().to_path_buf()],
            exclude: vec!["chat".to_string(), "broken".to_string()],
        })
        .await;

        assert_eq!(report.stats.files_count, 0);
        assert_eq!(report.stats.files_skipped, 0);
        assert!(report.conversations.is_empty());
    }

    #[tokio::test]
    async fn test_progress_phases_are_reported() {
        let dir = sample_dir();
        let phases = Arc::new(Mutex::new(Vec::new()));
        let captured = phases.clone();
        let reporter = ProgressReporter::new(Arc::new(move |event: ProgressEvent| {
            captured.lock().unwrap().push(event.phase);
        }));

        let options = ImportOptions {
            paths: vec![dir.path().join("chat.json")],
            exclude: Vec::new(),
        };
        import(&options, &DetectionConfig::default(), &reporter)
            .await
            .unwrap();

        let phases = phases.lock().unwrap();
        assert_eq!(phases.as_slice(), ["discover", "parse", "classify"]);
    }

    #[tokio::test]
    async fn test_write_report_round_trips() {
        let dir = sample_dir();
        let report = run(ImportOptions {
            paths: vec![dir.path().to_path_buf()],
            exclude: Vec::new(),
        })
        .await;

        let out = dir.path().join("report.json");
        write_report(&report, &out).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["stats"]["codeMessagesCount"], 1);
        assert_eq!(written["conversations"][0]["messages"][0]["hasCode"], true);
        assert!(written["generatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_missing_path_yields_empty_report() {
        let dir = TempDir::new().unwrap();
        let report = run(ImportOptions {
            paths: vec![dir.path().join("missing")],
            exclude: Vec::new(),
        })
        .await;
        assert_eq!(report.stats.files_count, 0);
        assert!(report.sources.is_empty());
    }
}
