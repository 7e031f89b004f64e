//! Command-line interface for APM.
//!
//! # Available Commands
//!
//! - `init` - Install official templates for an AI assistant
//! - `custom` - Install templates from a custom GitHub repository
//! - `update` - Move every installed assistant to a newer release
//! - `config` - Manage saved custom repositories
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Only log errors
//! - `--config` - Path to a custom global config file
//!
//! # Example
//!
//! ```bash
//! apm init --assistant claude
//! apm update --yes
//! apm custom --repo octo-org/apm-templates
//! ```

mod common;
mod config;
mod custom;
mod init;
mod prompts;
mod update;

pub use prompts::TerminalPrompter;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Explicit log filter; `None` defers to `RUST_LOG`
    pub log_level: Option<String>,

    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the tracing subscriber. Logs go to stderr so they never mix
    /// with command output.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "apm",
    about = "Agentic Project Management - install and update assistant templates",
    version,
    long_about = "APM installs prompt and guide templates for AI coding assistants from GitHub releases, and updates them with automatic backup and rollback."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the global config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install official templates into the current directory
    Init(init::InitCommand),

    /// Install templates from a custom GitHub repository
    Custom(custom::CustomCommand),

    /// Update installed templates
    Update(update::UpdateCommand),

    /// Manage saved custom repositories
    Config(config::ConfigCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let config_path = config.config_path;

        match self.command {
            Commands::Init(cmd) => cmd.execute(config_path).await,
            Commands::Custom(cmd) => cmd.execute(config_path).await,
            Commands::Update(cmd) => cmd.execute(config_path).await,
            Commands::Config(cmd) => cmd.execute(config_path).await,
        }
    }
}
