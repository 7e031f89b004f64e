//! Install templates from a custom GitHub repository.
//!
//! Without `--repo` the user picks one of the saved repositories or types a
//! new one. Unless the repository is trusted, a security disclaimer has to be
//! accepted first.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::common::{orchestrator, print_report};
use crate::config::GlobalConfig;
use crate::core::prompt::{Choice, Prompter};
use crate::release::Repository;
use crate::upgrade::{InstallOptions, InstallSource};

const OTHER_REPO: &str = "__other__";

#[derive(Args, Debug)]
pub struct CustomCommand {
    /// Repository as owner/repo
    #[arg(short, long)]
    repo: Option<String>,

    /// Release tag to install (default: choose from the repository's releases)
    #[arg(long, requires = "repo")]
    tag: Option<String>,

    /// Assistant id or name
    #[arg(short, long)]
    assistant: Option<String>,

    /// Reinstall without asking when the directory is already initialized
    #[arg(short, long)]
    force: bool,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    yes: bool,
}

impl CustomCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let mut orchestrator = orchestrator(self.yes, config_path).await?;

        let repo: Repository = match &self.repo {
            Some(repo) => repo.parse()?,
            None => ask_repository(orchestrator.prompter(), orchestrator.config()).await?,
        };

        let options = InstallOptions {
            source: InstallSource::Custom(repo),
            tag: self.tag.clone(),
            assistant: self.assistant.clone(),
            force: self.force,
        };
        let report = orchestrator.resolve_and_install(options).await?;
        print_report(&report);
        Ok(())
    }
}

async fn ask_repository(prompter: &impl Prompter, config: &GlobalConfig) -> Result<Repository> {
    if !config.custom_repos.is_empty() {
        let mut choices: Vec<Choice> =
            config.custom_repos.iter().map(|r| Choice::new(&r.repo, &r.repo)).collect();
        choices.push(Choice::new("Another repository...", OTHER_REPO));

        let picked = prompter.select_one("Install from", &choices).await?;
        if picked != OTHER_REPO {
            return Ok(picked.parse()?);
        }
    }

    let input = prompter.text_input("GitHub repository (owner/repo)", Repository::validate).await?;
    Ok(input.parse()?)
}
