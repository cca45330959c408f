//! Fork creation and synchronization
//!
//! Not part of the default submission flow: branches are created in the
//! organization repository because the lint-check integration cannot post
//! check results against forks.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ForkConfig;
use crate::remote::{GitHost, RemoteError, RemoteResult, RepoRef};

/// Bounded fixed-interval polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        ForkConfig::default().into()
    }
}

impl From<ForkConfig> for RetryPolicy {
    fn from(config: ForkConfig) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.max_attempts,
            timeout: config.timeout,
        }
    }
}

/// Keeps a user's fork's default branch level with upstream
pub struct ForkSynchronizer<'a, H: GitHost + ?Sized> {
    host: &'a H,
    policy: RetryPolicy,
}

impl<'a, H: GitHost + ?Sized> ForkSynchronizer<'a, H> {
    pub fn new(host: &'a H, policy: RetryPolicy) -> Self {
        Self { host, policy }
    }

    /// Make sure `user` has a fork of `upstream` whose `branch` matches upstream
    ///
    /// Creates the fork when missing and waits for it to become queryable,
    /// then force-moves the fork's `branch` to upstream's head.
    pub async fn ensure_synced_fork(
        &self,
        upstream: &RepoRef,
        user: &str,
        branch: &str,
    ) -> RemoteResult<RepoRef> {
        let fork = upstream.with_owner(user);

        if !self.host.repository_exists(&fork).await? {
            info!(upstream = %upstream, fork = %fork, "Creating fork");
            self.host.create_fork(upstream).await?;
            self.wait_for_fork(&fork).await?;
        }

        let head = self.host.head_sha(upstream, branch).await?;
        self.host.update_ref(&fork, branch, &head).await?;
        info!(fork = %fork, branch, head = %head, "Fork synced with upstream");

        Ok(fork)
    }

    /// Poll until the fork exists, attempts run out, or the deadline passes
    async fn wait_for_fork(&self, fork: &RepoRef) -> RemoteResult<()> {
        let started = Instant::now();
        let mut attempts = 0;

        loop {
            tokio::time::sleep(self.policy.interval).await;
            attempts += 1;

            match self.host.repository_exists(fork).await {
                Ok(true) => {
                    debug!(fork = %fork, attempts, "Fork is available");
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => debug!(fork = %fork, error = %e, "Fork check failed, polling again"),
            }

            let waited = started.elapsed();
            if attempts >= self.policy.max_attempts || waited >= self.policy.timeout {
                warn!(fork = %fork, attempts, ?waited, "Fork never became available");
                return Err(RemoteError::ForkTimeout {
                    repo: fork.to_string(),
                    attempts,
                    waited,
                });
            }
        }
    }
}
