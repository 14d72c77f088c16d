//! Scan command handler.
//!
//! Prints the code blocks detected in a message.

use clap::Args;
use chatlens_core::{config::AppConfig, AppResult};
use chatlens_detect::{filter_renderable_blocks, CodeBlock, Detector};
use std::path::PathBuf;

/// Detect code blocks in a message
#[derive(Args, Debug)]
pub struct ScanCommand {
    /// Message file (default: stdin)
    pub file: Option<PathBuf>,

    /// Run the aggressive detectors
    #[arg(short, long)]
    pub aggressive: bool,

    /// Show every candidate, not just renderable blocks
    #[arg(long)]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ScanCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing scan command");

        let text = super::read_input(self.file.as_deref()).await?;
        let blocks = self.blocks(&Detector::new(config.detection.clone()), &text);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&blocks)?);
            return Ok(());
        }

        if blocks.is_empty() {
            println!("No code blocks found");
            return Ok(());
        }

        for (i, block) in blocks.iter().enumerate() {
            println!("{}", summarize(i + 1, block));
        }
        Ok(())
    }

    fn blocks(&self, detector: &Detector, text: &str) -> Vec<CodeBlock> {
        let blocks = detector.find_code_blocks(text, self.aggressive);
        if self.all {
            blocks
        } else {
            filter_renderable_blocks(text, &blocks)
        }
    }
}

/// One line per block: index, kind, language, byte range, first line.
fn summarize(index: usize, block: &CodeBlock) -> String {
    let first_line = block.content.lines().next().unwrap_or_default();
    let more = if block.content.contains('\n') { " ..." } else { "" };
    format!(
        "#{} {} [{}] {}..{}: {}{}",
        index,
        block.kind,
        block.language.as_deref().unwrap_or("-"),
        block.start,
        block.end,
        first_line,
        more
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(aggressive: bool, all: bool) -> ScanCommand {
        ScanCommand {
            file: None,
            aggressive,
            all,
            json: false,
        }
    }

    #[test]
    fn test_scan_renderable_only_by_default() {
        let detector = Detector::default();
        let text = "```js\nconst x = 1;\n```";
        let blocks = command(false, false).blocks(&detector, text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            summarize(1, &blocks[0]),
            "#1 block [js] 0..22: ```js ..."
        );
    }

    #[test]
    fn test_scan_all_keeps_latex_candidates() {
        let detector = Detector::default();
        let text = r"\frac{1}{2} + \sqrt{2}";
        let all = command(true, true).blocks(&detector, text);
        let renderable = command(true, false).blocks(&detector, text);
        assert!(renderable.is_empty());
        assert!(all.len() >= renderable.len());
    }
}
