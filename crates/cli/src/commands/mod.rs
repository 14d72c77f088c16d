//! Command handlers for the chatlens CLI.

pub mod import;
pub mod redact;
pub mod scan;

pub use import::ImportCommand;
pub use redact::RedactCommand;
pub use scan::ScanCommand;

use std::path::Path;

use chatlens_core::AppResult;
use tokio::io::AsyncReadExt;

/// Read the command input from a file, or stdin when no file is given.
pub(crate) async fn read_input(file: Option<&Path>) -> AppResult<String> {
    match file {
        Some(path) => Ok(tokio::fs::read_to_string(path).await?),
        None => {
            let mut input = String::new();
            tokio::io::stdin().read_to_string(&mut input).await?;
            Ok(input)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_input_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("message.txt");
        std::fs::write(&path, "hello").unwrap();
        assert_eq!(read_input(Some(&path)).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_read_input_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_input(Some(&dir.path().join("nope.txt")))
            .await
            .unwrap_err();
        assert!(matches!(err, chatlens_core::AppError::Io(_)));
    }
}
