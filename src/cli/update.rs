//! Update the installed templates of the current directory.
//!
//! Every installed assistant moves to the same release. Official
//! installations stay on their base version; a newer base version is only
//! reported. Custom installations ask whether to stay on the custom
//! repository or switch to official releases.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::common::{orchestrator, print_report};
use crate::upgrade::{InstallSource, UpdateOptions};

#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Switch a custom installation to official releases
    #[arg(long)]
    official: bool,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    yes: bool,
}

impl UpdateCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let mut orchestrator = orchestrator(self.yes, config_path).await?;
        let options = UpdateOptions {
            source: self.official.then_some(InstallSource::Official),
        };
        let report = orchestrator.resolve_and_update(options).await?;
        print_report(&report);
        Ok(())
    }
}
