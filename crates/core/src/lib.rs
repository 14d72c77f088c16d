//! Chatlens Core Library
//!
//! Foundational utilities shared by the chatlens crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management, including detection thresholds

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, DetectionConfig};
pub use error::{AppError, AppResult};
