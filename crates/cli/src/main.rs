//! chatlens CLI
//!
//! Detects and redacts code in chat messages and imports chat exports.

mod commands;

use chatlens_core::{config::AppConfig, logging, AppResult};
use clap::{Parser, Subcommand};
use commands::{ImportCommand, RedactCommand, ScanCommand};
use std::path::PathBuf;

/// chatlens - find and redact code in chat text
#[derive(Parser, Debug)]
#[command(name = "chatlens")]
#[command(about = "Find and redact code in chat messages and exports", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CHATLENS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "CHATLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect code blocks in a message
    Scan(ScanCommand),

    /// Replace code in a message with placeholders
    Redact(RedactCommand),

    /// Import chat exports
    Import(ImportCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let relocated = cli.workspace.is_some() || cli.config.is_some();
    let mut config = AppConfig::load()?.with_overrides(cli.workspace, cli.config, None, false, false);

    // A workspace or config given on the command line brings its own file.
    if relocated {
        let path = config.config_path();
        if path.exists() {
            config = config.merge_yaml(&path)?;
        }
    }

    let config = config.with_overrides(None, None, cli.log_level, cli.verbose, cli.no_color);
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Detection config: {:?}", config.detection);

    let command_name = match &cli.command {
        Commands::Scan(_) => "scan",
        Commands::Redact(_) => "redact",
        Commands::Import(_) => "import",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Scan(cmd) => cmd.execute(&config).await,
        Commands::Redact(cmd) => cmd.execute(&config).await,
        Commands::Import(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
