//! Fork commands

use clap::{Args, Subcommand};
use quire_core::Config;

/// Manage the signed-in user's forks
#[derive(Args, Debug)]
pub struct ForkArgs {
    #[command(subcommand)]
    pub command: ForkCommand,
}

#[derive(Subcommand, Debug)]
pub enum ForkCommand {
    /// Create the fork if needed and bring its base branch up to date
    Sync {
        /// Repository name within the organization
        repo: String,
    },
}

impl ForkArgs {
    /// Execute the fork command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        match &self.command {
            ForkCommand::Sync { repo } => {
                let orch = super::orchestrator(config, true).await?;
                let fork = orch.sync_fork(repo).await.map_err(super::report)?;
                println!("{} is up to date", fork);
                Ok(())
            }
        }
    }
}
