//! Shared wiring for the install and update commands

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::cli::prompts::TerminalPrompter;
use crate::config::GlobalConfig;
use crate::release::{GitHubTransport, ReleaseClient};
use crate::upgrade::{OperationReport, Outcome, UpdateOrchestrator};

/// Orchestrator for the current directory with the user's global config.
pub async fn orchestrator(
    assume_yes: bool,
    config_path: Option<PathBuf>,
) -> Result<UpdateOrchestrator<GitHubTransport, TerminalPrompter>> {
    let config = GlobalConfig::load_with_optional(config_path.clone()).await?;
    let transport = GitHubTransport::from_env().await?;
    let project_dir = std::env::current_dir().context("Failed to determine current directory")?;

    Ok(UpdateOrchestrator::new(
        ReleaseClient::new(transport),
        TerminalPrompter::new(assume_yes),
        project_dir,
    )
    .with_config(config, config_path))
}

pub fn print_report(report: &OperationReport) {
    for notice in &report.notices {
        println!("{} {notice}", "note:".yellow().bold());
    }

    match &report.outcome {
        Outcome::Installed {
            ..
        }
        | Outcome::Updated {
            ..
        } => println!("{} {}", "✓".green().bold(), report.outcome),
        Outcome::UpToDate {
            ..
        } => println!("{}", report.outcome.to_string().green()),
        Outcome::Cancelled => println!("{}", report.outcome.to_string().yellow()),
    }

    if let Some(archive) = &report.backup_archive {
        println!("  Previous files archived at {}", archive.display().to_string().dimmed());
    }
}
