//! Credential storage for Quire
//!
//! The GitHub token is kept apart from configuration so config files can be
//! shared freely. The secrets file lives at `~/.config/quire/secrets.toml`
//! and must not be readable by group or others on Unix.
//!
//! Lookup order:
//! 1. `GITHUB_TOKEN` environment variable
//! 2. The secrets file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// Environment variable consulted before the secrets file
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    pub github: GitHubSecrets,
}

/// GitHub-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubSecrets {
    /// Personal access token or OAuth token
    pub token: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location, empty if absent
    pub fn load() -> Result<Self> {
        match Self::default_secrets_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load secrets from a specific file, refusing loose permissions
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = std::fs::metadata(path)?.permissions().mode();
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }
        }

        let contents = std::fs::read_to_string(path)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        secrets.github.token = secrets
            .github
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(secrets)
    }

    /// Returns `~/.config/quire/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("quire").join("secrets.toml"))
    }

    /// The GitHub token, environment first
    pub fn github_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                debug!("Using GitHub token from {}", TOKEN_ENV);
                return Some(token);
            }
        }

        self.github.token.clone().filter(|t| !t.is_empty())
    }

    /// Replace the stored token and write the file with owner-only permissions
    pub fn store_token(path: &Path, token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Config("Refusing to store an empty token".to_string()));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let secrets = Secrets {
            github: GitHubSecrets {
                token: Some(token.to_string()),
            },
        };
        let contents = toml::to_string_pretty(&secrets)
            .map_err(|e| Error::Config(format!("Failed to serialize secrets: {}", e)))?;

        std::fs::write(path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        info!(path = %path.display(), "Stored GitHub token");
        Ok(secrets)
    }
}
