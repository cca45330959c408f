//! Pull request creation and status checking

use crate::error::classify;
use crate::{GitHubClient, Result};
use quire_core::remote::NewPullRequest;
use quire_core::{PullRequestStatus, RepoRef};
use tracing::{debug, info};

impl GitHubClient {
    /// Open a pull request, returning its number
    pub async fn open_pr(&self, repo: &RepoRef, request: &NewPullRequest) -> Result<u64> {
        debug!(repo = %repo, head = %request.head, base = %request.base, "Opening pull request");

        let client = self.client();
        let pr = client
            .pulls(&repo.owner, &repo.name)
            .create(&request.title, &request.head, &request.base)
            .body(&request.body)
            .maintainer_can_modify(request.maintainer_can_modify)
            .send()
            .await?;

        info!(repo = %repo, number = pr.number, "Opened pull request");
        Ok(pr.number)
    }

    /// Whether a pull request is open, merged, or closed unmerged
    pub async fn get_pr_status(&self, repo: &RepoRef, number: u64) -> Result<PullRequestStatus> {
        debug!(repo = %repo, number, "Fetching pull request");

        let pr = self
            .client()
            .pulls(&repo.owner, &repo.name)
            .get(number)
            .await
            .map_err(|e| classify(e, format!("pull request #{}", number)))?;

        Ok(PullRequestStatus::from_timestamps(pr.merged_at, pr.closed_at))
    }
}
