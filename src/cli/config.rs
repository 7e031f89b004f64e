//! Manage saved custom repositories and their trust settings.
//!
//! # Examples
//!
//! ```bash
//! apm config                      # list saved repositories
//! apm config add octo/templates   # save a repository
//! apm config trust octo/templates --skip-disclaimer true
//! apm config remove octo/templates
//! apm config clear
//! apm config path
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::GlobalConfig;
use crate::release::Repository;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// List saved custom repositories
    List,

    /// Save a custom repository
    Add {
        /// Repository as owner/repo
        repo: String,

        /// Skip the security disclaimer for this repository
        #[arg(long)]
        trust: bool,
    },

    /// Forget a saved repository
    Remove {
        repo: String,
    },

    /// Forget every saved repository
    Clear,

    /// Change whether the security disclaimer is shown for a repository
    Trust {
        repo: String,

        #[arg(long, action = clap::ArgAction::Set, value_name = "BOOL")]
        skip_disclaimer: bool,
    },

    /// Show the config file location
    Path,
}

fn resolve_path(config_path: Option<PathBuf>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path),
        None => GlobalConfig::default_path(),
    }
}

impl ConfigCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        match self.command {
            Some(ConfigSubcommands::List) | None => Self::list(config_path).await,
            Some(ConfigSubcommands::Add {
                repo,
                trust,
            }) => Self::add(&repo, trust, config_path).await,
            Some(ConfigSubcommands::Remove {
                repo,
            }) => Self::remove(&repo, config_path).await,
            Some(ConfigSubcommands::Clear) => Self::clear(config_path).await,
            Some(ConfigSubcommands::Trust {
                repo,
                skip_disclaimer,
            }) => Self::trust(&repo, skip_disclaimer, config_path).await,
            Some(ConfigSubcommands::Path) => Self::show_path(config_path),
        }
    }

    async fn list(config_path: Option<PathBuf>) -> Result<()> {
        let config = GlobalConfig::load_with_optional(config_path.clone()).await?;
        let path = resolve_path(config_path)?;

        println!("{}", "Custom repositories".bold());
        println!("Location: {}\n", path.display());

        if config.custom_repos.is_empty() {
            println!("No custom repositories saved.");
            println!("\n{}", "Tip:".yellow());
            println!("  Run 'apm custom --repo owner/repo' to install from one");
            return Ok(());
        }

        for setting in &config.custom_repos {
            let trust = if setting.skip_disclaimer {
                "trusted".green()
            } else {
                "disclaimer shown".dimmed()
            };
            println!(
                "  {} ({}, added {})",
                setting.repo.cyan(),
                trust,
                setting.added_at.format("%Y-%m-%d")
            );
        }
        Ok(())
    }

    async fn add(repo: &str, trust: bool, config_path: Option<PathBuf>) -> Result<()> {
        let repo: Repository = repo.parse()?;
        let key = repo.to_string();
        let mut config = GlobalConfig::load_with_optional(config_path.clone()).await?;

        if !config.add_custom_repo(&key) {
            println!("⚠️  Repository '{key}' is already saved");
        }
        if trust {
            config.set_skip_disclaimer(&key, true);
        }
        config.save_with_optional(config_path).await?;

        println!("✅ Saved custom repository '{}'", key.green());
        Ok(())
    }

    async fn remove(repo: &str, config_path: Option<PathBuf>) -> Result<()> {
        let mut config = GlobalConfig::load_with_optional(config_path.clone()).await?;

        if config.remove_custom_repo(repo) {
            config.save_with_optional(config_path).await?;
            println!("✅ Removed custom repository '{}'", repo.red());
        } else {
            println!("❌ Repository '{repo}' is not saved");
        }
        Ok(())
    }

    async fn clear(config_path: Option<PathBuf>) -> Result<()> {
        let mut config = GlobalConfig::load_with_optional(config_path.clone()).await?;
        let removed = config.clear_custom_repos();
        config.save_with_optional(config_path).await?;

        println!("✅ Removed {removed} custom repositor{}", if removed == 1 { "y" } else { "ies" });
        Ok(())
    }

    async fn trust(repo: &str, skip: bool, config_path: Option<PathBuf>) -> Result<()> {
        let mut config = GlobalConfig::load_with_optional(config_path.clone()).await?;

        if !config.set_skip_disclaimer(repo, skip) {
            println!("❌ Repository '{repo}' is not saved");
            println!("   Add it first with 'apm config add {repo}'");
            return Ok(());
        }
        config.save_with_optional(config_path).await?;

        if skip {
            println!("✅ Disclaimer disabled for '{}'", repo.green());
        } else {
            println!("✅ Disclaimer enabled for '{}'", repo.green());
        }
        Ok(())
    }

    fn show_path(config_path: Option<PathBuf>) -> Result<()> {
        println!("{}", resolve_path(config_path)?.display());
        Ok(())
    }
}
