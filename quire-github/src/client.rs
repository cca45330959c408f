//! GitHub API client using octocrab

use std::sync::RwLock;

use crate::{Error, Result};
use octocrab::Octocrab;
use quire_core::config::GitHubConfig;
use quire_core::Secrets;
use tracing::{debug, info};

/// Where raw catalog files are served from
const RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";

/// Branch of the catalog repository that raw catalog files are read from
const CATALOG_BRANCH: &str = "master";

/// Authenticated GitHub client for one organization
///
/// The octocrab handle sits behind a lock so a new token can be swapped in
/// without rebuilding anything that holds the client.
pub struct GitHubClient {
    client: RwLock<Octocrab>,
    http: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubClient {
    /// Create a client authenticated with `token`
    pub fn new(token: &str, config: GitHubConfig) -> Result<Self> {
        let client = build_octocrab(token)?;
        info!(org = %config.org, "Created GitHub client");

        Ok(Self {
            client: RwLock::new(client),
            http: reqwest::Client::new(),
            config,
        })
    }

    /// Create a client from stored credentials
    ///
    /// Token is loaded from (in priority order):
    /// 1. GITHUB_TOKEN environment variable
    /// 2. ~/.config/quire/secrets.toml
    pub fn from_secrets(config: GitHubConfig) -> Result<Self> {
        let secrets = Secrets::load().map_err(|e| Error::Auth(e.to_string()))?;

        let token = secrets.github_token().ok_or_else(|| {
            Error::Auth(
                "GitHub token not found. Set GITHUB_TOKEN environment variable \
                 or run `quire auth login <token>`"
                    .to_string(),
            )
        })?;

        Self::new(&token, config)
    }

    /// Replace the token used for every later request
    pub fn reauthenticate(&self, token: &str) -> Result<()> {
        let client = build_octocrab(token)?;
        *self.client.write().unwrap_or_else(|e| e.into_inner()) = client;
        info!(org = %self.config.org, "Replaced GitHub credentials");
        Ok(())
    }

    /// Get the organization name
    pub fn org(&self) -> &str {
        &self.config.org
    }

    /// Get the underlying octocrab client
    pub fn client(&self) -> Octocrab {
        self.client
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Raw URL of the catalog entry for a repository
    pub(crate) fn catalog_url(&self, repo: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}/{}.yml",
            RAW_CONTENT_BASE,
            self.config.org,
            self.config.catalog_repo,
            CATALOG_BRANCH,
            self.config.catalog_path.trim_matches('/'),
            repo
        )
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("org", &self.config.org)
            .finish_non_exhaustive()
    }
}

fn build_octocrab(token: &str) -> Result<Octocrab> {
    debug!("Building octocrab client");
    Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))
}
