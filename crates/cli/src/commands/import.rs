//! Import command handler.
//!
//! Runs the chat-export import pipeline.

use clap::Args;
use chatlens_core::{config::AppConfig, AppResult};
use chatlens_import::{ImportOptions, ProgressEvent, ProgressReporter};
use std::path::PathBuf;
use std::sync::Arc;

/// Import chat exports, classifying and redacting code
#[derive(Args, Debug)]
pub struct ImportCommand {
    /// Export files or directories
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Write the full report as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exclude paths containing this substring
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Output stats as JSON
    #[arg(long)]
    pub json: bool,
}

impl ImportCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing import command for {} path(s)", self.paths.len());

        let options = ImportOptions {
            paths: self.paths.clone(),
            exclude: self.exclude.clone(),
        };

        let reporter = if config.verbose {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| eprintln!("{}", event.format_simple())))
        } else {
            ProgressReporter::noop()
        };

        let report = chatlens_import::import(&options, &config.detection, &reporter).await?;

        if let Some(path) = &self.output {
            reporter.write(&path.display().to_string());
            chatlens_import::write_report(&report, path).await?;
        }

        let stats = &report.stats;
        if self.json {
            println!("{}", serde_json::to_string_pretty(stats)?);
        } else {
            println!(
                "Imported {} conversations ({} messages, {} with code, {} media) from {} files in {:.2}s",
                stats.conversations_count,
                stats.messages_count,
                stats.code_messages_count,
                stats.media_messages_count,
                stats.files_count,
                stats.duration_secs
            );
            if stats.files_skipped > 0 {
                println!("Skipped {} unreadable files", stats.files_skipped);
            }
            println!("Redacted {} code blocks", stats.code_blocks_redacted);
        }

        Ok(())
    }
}
