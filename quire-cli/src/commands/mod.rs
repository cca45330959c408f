//! CLI command implementations

pub mod auth;
pub mod fork;
pub mod repos;
pub mod task;

pub use auth::AuthArgs;
pub use fork::ForkArgs;
pub use task::TaskArgs;

use quire_core::{Config, GitHost, SubmissionOrchestrator, TaskStore};
use quire_github::GitHubClient;

/// Build the orchestrator over GitHub
///
/// With `sign_in`, the token owner is looked up so commands that act as the
/// user (submit, fork sync) can run.
pub async fn orchestrator(
    config: &Config,
    sign_in: bool,
) -> anyhow::Result<SubmissionOrchestrator<GitHubClient>> {
    let client = GitHubClient::from_secrets(config.github.clone())?;
    let store = TaskStore::open(config.tasks_dir()?)?;

    let user = if sign_in {
        Some(
            client
                .current_user()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to identify GitHub user: {}", e))?,
        )
    } else {
        None
    };

    let mut orch = SubmissionOrchestrator::new(client, store, config.clone());
    if let Some(user) = user {
        orch.authenticate(user);
    }
    Ok(orch)
}

/// Turn a core error into what the editor should read
pub fn report(err: quire_core::Error) -> anyhow::Error {
    if let Some(source) = err.remote() {
        tracing::debug!(error = %source, "Remote failure");
    }
    anyhow::anyhow!("{}", err.user_message())
}
