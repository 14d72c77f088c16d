//! Configuration management for chatlens.
//!
//! Configuration is merged from several sources, lowest precedence first:
//! - Built-in defaults
//! - Config file (`.chatlens/config.yaml` in the workspace)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .chatlens/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Tunable detection thresholds
    pub detection: DetectionConfig,
}

/// Thresholds for the code detector.
///
/// Every value here was calibrated empirically against real chat exports,
/// so they are exposed rather than baked into the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectionConfig {
    /// Strongly code-like messages needed before a conversation is treated
    /// as code-heavy (switches its messages to aggressive detection).
    pub code_heavy_threshold: usize,

    /// Merged block count at which all blocks collapse into one.
    pub unify_block_count: usize,

    /// Fraction of the text covered by blocks at which all blocks collapse
    /// into one.
    pub unify_coverage: f64,

    /// Minimum fraction of code-like lines for a segment to become a block.
    pub segment_score_threshold: f64,

    /// Characters of surrounding text captured as block context.
    pub context_chars: usize,

    /// Upper bound on redaction passes.
    pub max_redaction_passes: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            code_heavy_threshold: 20,
            unify_block_count: 8,
            unify_coverage: 0.5,
            segment_score_threshold: 0.6,
            context_chars: 100,
            max_redaction_passes: 8,
        }
    }
}

impl DetectionConfig {
    /// Check that all thresholds are in range.
    pub fn validate(&self) -> AppResult<()> {
        if self.code_heavy_threshold == 0 {
            return Err(AppError::Config(
                "codeHeavyThreshold must be at least 1".to_string(),
            ));
        }
        if self.unify_block_count < 2 {
            return Err(AppError::Config(
                "unifyBlockCount must be at least 2".to_string(),
            ));
        }
        if !(self.unify_coverage > 0.0 && self.unify_coverage <= 1.0) {
            return Err(AppError::Config(format!(
                "unifyCoverage must be in (0, 1], got {}",
                self.unify_coverage
            )));
        }
        if !(self.segment_score_threshold > 0.0 && self.segment_score_threshold <= 1.0) {
            return Err(AppError::Config(format!(
                "segmentScoreThreshold must be in (0, 1], got {}",
                self.segment_score_threshold
            )));
        }
        if self.max_redaction_passes < 2 {
            return Err(AppError::Config(
                "maxRedactionPasses must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    detection: Option<DetectionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            detection: DetectionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `CHATLENS_WORKSPACE`: Override workspace path
    /// - `CHATLENS_CONFIG`: Path to config file
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use chatlens_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("CHATLENS_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("CHATLENS_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config.config_path();
        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Path of the YAML config file that applies to this configuration.
    pub fn config_path(&self) -> PathBuf {
        match self.config_file {
            Some(ref cf) => cf.clone(),
            None => self.chatlens_dir().join("config.yaml"),
        }
    }

    /// Merge YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(detection) = config_file.detection {
            result.detection = detection;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config
    /// file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .chatlens directory.
    pub fn chatlens_dir(&self) -> PathBuf {
        self.workspace.join(".chatlens")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AppResult<()> {
        self.detection.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(!config.verbose);
        assert!(!config.no_color);
        assert_eq!(config.detection.code_heavy_threshold, 20);
        assert_eq!(config.detection.unify_block_count, 8);
        assert!((config.detection.unify_coverage - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_chatlens_dir() {
        let config = AppConfig::default();
        assert!(config.chatlens_dir().ends_with(".chatlens"));
        assert!(config.config_path().ends_with(".chatlens/config.yaml"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some(PathBuf::from("/tmp")),
            Some(PathBuf::from("/tmp/custom.yaml")),
            None,
            true,
            true,
        );

        assert_eq!(overridden.workspace, PathBuf::from("/tmp"));
        assert_eq!(overridden.config_path(), PathBuf::from("/tmp/custom.yaml"));
        assert!(overridden.verbose);
        assert!(overridden.no_color);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_explicit_log_level_wins_over_verbose() {
        let overridden = AppConfig::default().with_overrides(
            None,
            None,
            Some("trace".to_string()),
            true,
            false,
        );
        assert_eq!(overridden.log_level, Some("trace".to_string()));
    }

    #[test]
    fn test_merge_yaml_detection_section() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "logging:\n  level: info\n  color: false\ndetection:\n  codeHeavyThreshold: 5\n  unifyCoverage: 0.75"
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(file.path()).unwrap();
        assert_eq!(merged.log_level, Some("info".to_string()));
        assert!(merged.no_color);
        assert_eq!(merged.detection.code_heavy_threshold, 5);
        assert!((merged.detection.unify_coverage - 0.75).abs() < f64::EPSILON);
        // Unspecified fields keep their defaults.
        assert_eq!(merged.detection.unify_block_count, 8);
    }

    #[test]
    fn test_merge_yaml_rejects_garbage() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "detection: [1, 2").unwrap();
        let result = AppConfig::default().merge_yaml(file.path());
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_detection_ranges() {
        assert!(AppConfig::default().validate().is_ok());

        let mut config = AppConfig::default();
        config.detection.unify_coverage = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.detection.unify_block_count = 1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.detection.max_redaction_passes = 1;
        assert!(config.validate().is_err());
    }
}
