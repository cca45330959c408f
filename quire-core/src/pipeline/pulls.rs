//! Opening and tracking the pull request for a task

use tracing::{debug, info};

use crate::config::PullRequestConfig;
use crate::remote::{GitHost, NewPullRequest, RemoteResult, RepoRef};
use crate::task::PullRequestStatus;

/// Body text for a pull request opened by `author`
///
/// Quiet authors get an empty body. Everyone else gets the configured
/// reviewers mentioned, minus the author, optionally wrapped in the body
/// template.
pub fn pull_request_body(config: &PullRequestConfig, author: &str) -> String {
    if config.quiet_authors.iter().any(|a| a == author) {
        return String::new();
    }

    let mentions = config
        .reviewers
        .iter()
        .filter(|r| r.as_str() != author)
        .map(|r| format!("@{}", r))
        .collect::<Vec<_>>()
        .join(" ");

    match &config.body_template {
        Some(template) => template.replace("{mentions}", &mentions),
        None => mentions,
    }
}

/// Opens review requests and reads back their status
pub struct PullRequestGateway<'a, H: GitHost + ?Sized> {
    host: &'a H,
    config: &'a PullRequestConfig,
}

impl<'a, H: GitHost + ?Sized> PullRequestGateway<'a, H> {
    pub fn new(host: &'a H, config: &'a PullRequestConfig) -> Self {
        Self { host, config }
    }

    /// Open a pull request from `branch` into `base`, returning its number
    pub async fn open_pull_request(
        &self,
        repo: &RepoRef,
        branch: &str,
        base: &str,
        title: &str,
        author: &str,
    ) -> RemoteResult<u64> {
        let request = NewPullRequest {
            title: title.to_string(),
            head: branch.to_string(),
            base: base.to_string(),
            body: pull_request_body(self.config, author),
            maintainer_can_modify: self.config.maintainer_can_modify,
        };

        debug!(repo = %repo, branch, base, "Opening pull request");
        let number = self.host.create_pull_request(repo, &request).await?;
        info!(repo = %repo, branch, number, "Opened pull request");
        Ok(number)
    }

    pub async fn status(&self, repo: &RepoRef, number: u64) -> RemoteResult<PullRequestStatus> {
        let status = self.host.pull_request_status(repo, number).await?;
        debug!(repo = %repo, number, %status, "Fetched pull request status");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;

    fn config() -> PullRequestConfig {
        PullRequestConfig {
            reviewers: vec!["jaredh159".to_string(), "Henderjay".to_string()],
            quiet_authors: vec!["jaredh159".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_body_mentions_reviewers() {
        assert_eq!(pull_request_body(&config(), "editor"), "@jaredh159 @Henderjay");
    }

    #[test]
    fn test_quiet_author_gets_empty_body() {
        assert_eq!(pull_request_body(&config(), "jaredh159"), "");
    }

    #[test]
    fn test_author_not_mentioned() {
        assert_eq!(pull_request_body(&config(), "Henderjay"), "@jaredh159");
    }

    #[test]
    fn test_body_template() {
        let config = PullRequestConfig {
            reviewers: vec!["Henderjay".to_string()],
            body_template: Some("Edited in Quire. cc {mentions}".to_string()),
            ..Default::default()
        };
        assert_eq!(
            pull_request_body(&config, "editor"),
            "Edited in Quire. cc @Henderjay"
        );
    }

    #[tokio::test]
    async fn test_open_pull_request_payload() {
        let host = FakeHost::new();
        let config = config();
        let gateway = PullRequestGateway::new(&host, &config);

        let number = gateway
            .open_pull_request(&host.repo(), "task-1", "master", "Fix typos", "editor")
            .await
            .unwrap();

        assert_eq!(number, 42);
        let opened = host.opened_pull_requests();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].head, "task-1");
        assert_eq!(opened[0].base, "master");
        assert!(opened[0].maintainer_can_modify);
    }
}
