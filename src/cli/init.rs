//! Install official templates into the current directory.
//!
//! # Examples
//!
//! ```bash
//! # Latest stable release, pick the assistant interactively
//! apm init
//!
//! # Pinned release and assistant, no questions
//! apm init --tag v1.0.0+templates.3 --assistant claude --yes
//! ```

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::common::{orchestrator, print_report};
use crate::upgrade::{InstallOptions, InstallSource};

#[derive(Args, Debug)]
pub struct InitCommand {
    /// Release tag to install (default: latest stable)
    #[arg(long)]
    tag: Option<String>,

    /// Assistant id or name, e.g. `claude` or "Claude Code"
    #[arg(short, long)]
    assistant: Option<String>,

    /// Reinstall without asking when the directory is already initialized
    #[arg(short, long)]
    force: bool,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    yes: bool,
}

impl InitCommand {
    pub fn options(&self) -> InstallOptions {
        InstallOptions {
            source: InstallSource::Official,
            tag: self.tag.clone(),
            assistant: self.assistant.clone(),
            force: self.force,
        }
    }

    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let mut orchestrator = orchestrator(self.yes, config_path).await?;
        let report = orchestrator.resolve_and_install(self.options()).await?;
        print_report(&report);
        Ok(())
    }
}
