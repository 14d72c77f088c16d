//! Redact command handler.

use clap::Args;
use chatlens_core::{config::AppConfig, AppResult};
use chatlens_detect::Detector;
use std::path::PathBuf;

/// Replace code in a message with placeholders
#[derive(Args, Debug)]
pub struct RedactCommand {
    /// Message file (default: stdin)
    pub file: Option<PathBuf>,

    /// Write the redacted text here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RedactCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing redact command");

        let text = super::read_input(self.file.as_deref()).await?;
        let redacted = Detector::new(config.detection.clone()).remove_code(&text);

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, &redacted).await?;
                tracing::info!("Redacted text written to {}", path.display());
            }
            None => println!("{}", redacted),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_redact_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        std::fs::write(&input, "Run this:\n\n```sh\nnpm test\n```").unwrap();

        let command = RedactCommand {
            file: Some(input),
            output: Some(output.clone()),
        };
        command.execute(&AppConfig::default()).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "Run this:\n\n[SH Block]"
        );
    }
}
