//! Credential commands

use clap::{Args, Subcommand};
use quire_core::{Config, GitHost, Secrets};
use quire_github::GitHubClient;

/// Manage the stored GitHub token
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Verify a token and store it in the secrets file
    Login {
        /// Personal access token
        token: String,
    },

    /// Show which credentials are in use
    Status,
}

impl AuthArgs {
    /// Execute the auth command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        match &self.command {
            AuthCommand::Login { token } => login(token, config).await,
            AuthCommand::Status => status(),
        }
    }
}

async fn login(token: &str, config: &Config) -> anyhow::Result<()> {
    let path = Secrets::default_secrets_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    // verify before persisting so a typo never replaces a working token
    let client = GitHubClient::new(token, config.github.clone())?;
    let user = client
        .current_user()
        .await
        .map_err(|e| anyhow::anyhow!("Token rejected by GitHub: {}", e))?;

    Secrets::store_token(&path, token)?;

    println!("Logged in as {}", user.login);
    println!("Token stored in {}", path.display());
    Ok(())
}

fn status() -> anyhow::Result<()> {
    let secrets = Secrets::load()?;

    if std::env::var(quire_core::secrets::TOKEN_ENV).is_ok_and(|t| !t.trim().is_empty()) {
        println!("Using token from {}", quire_core::secrets::TOKEN_ENV);
    } else if secrets.github_token().is_some() {
        if let Some(path) = Secrets::default_secrets_path() {
            println!("Using token from {}", path.display());
        }
    } else {
        println!("Not logged in. Run `quire auth login <token>`.");
    }
    Ok(())
}
