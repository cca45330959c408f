//! Configuration management for Quire
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (QUIRE_*)
//! 3. Config file (~/.config/quire/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where tasks come from and where pull requests go
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Organization owning the editable repositories
    pub org: String,

    /// Base branch override; the repository default branch when unset
    pub base_branch: Option<String>,

    /// Extension of the documents a checkout tracks
    pub file_extension: String,

    /// Repository holding the catalog of editable repositories
    pub catalog_repo: String,

    /// Directory in the catalog repository with one `<repo>.yml` per entry
    pub catalog_path: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            org: "friends-library".to_string(),
            base_branch: None,
            file_extension: "adoc".to_string(),
            catalog_repo: "friends-library".to_string(),
            catalog_path: "packages/friends/yml/en".to_string(),
        }
    }
}

/// How pull request bodies are written
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PullRequestConfig {
    /// Logins mentioned in the body of every pull request
    pub reviewers: Vec<String>,

    /// Authors whose pull requests get an empty body
    pub quiet_authors: Vec<String>,

    /// Body text; `{mentions}` is replaced by the reviewer mentions
    pub body_template: Option<String>,

    /// Let maintainers push to the pull request branch
    pub maintainer_can_modify: bool,
}

impl Default for PullRequestConfig {
    fn default() -> Self {
        Self {
            reviewers: Vec::new(),
            quiet_authors: Vec::new(),
            body_template: None,
            maintainer_can_modify: true,
        }
    }
}

/// Bounds for waiting on an asynchronously created fork
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ForkConfig {
    /// Delay between existence checks
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Maximum number of existence checks
    pub max_attempts: u32,

    /// Overall deadline for the fork to appear
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ForkConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            max_attempts: 40,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Local storage locations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding task files; platform data dir when unset
    pub tasks_dir: Option<PathBuf>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub pull_request: PullRequestConfig,
    pub fork: ForkConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/quire/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("quire").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - QUIRE_ORG: GitHub organization
    /// - QUIRE_BASE_BRANCH: Base branch for pull requests
    /// - QUIRE_TASKS_DIR: Task storage directory
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(org) = std::env::var("QUIRE_ORG") {
            self.github.org = org;
        }

        if let Ok(branch) = std::env::var("QUIRE_BASE_BRANCH") {
            self.github.base_branch = Some(branch);
        }

        if let Ok(dir) = std::env::var("QUIRE_TASKS_DIR") {
            self.storage.tasks_dir = Some(PathBuf::from(dir));
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, org: Option<String>, tasks_dir: Option<PathBuf>) -> Self {
        if let Some(org) = org {
            self.github.org = org;
        }

        if let Some(dir) = tasks_dir {
            self.storage.tasks_dir = Some(dir);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(org: Option<String>, tasks_dir: Option<PathBuf>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(org, tasks_dir))
    }

    /// Resolved task storage directory
    pub fn tasks_dir(&self) -> Result<PathBuf> {
        self.storage
            .tasks_dir
            .clone()
            .or_else(crate::TaskStore::default_dir)
            .ok_or_else(|| Error::Config("Could not determine task storage directory".to_string()))
    }
}
