//! Git data API: refs, trees, blobs and commits

use crate::error::{api_message, classify};
use crate::{Error, GitHubClient, Result};
use base64::Engine;
use quire_core::graph::TreeEntry;
use quire_core::remote::TreeNode;
use quire_core::RepoRef;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeNode>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    tree: GitObject,
}

#[derive(Debug, Serialize)]
struct NewTree<'a> {
    base_tree: &'a str,
    tree: &'a [TreeEntry],
}

/// Decode a blob payload; GitHub wraps base64 content at 60 columns
fn decode_blob(content: &str, encoding: &str) -> Result<String> {
    match encoding {
        "utf-8" => Ok(content.to_string()),
        "base64" => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| Error::Parse(format!("Invalid blob encoding: {}", e)))?;
            String::from_utf8(bytes).map_err(|e| Error::Parse(format!("Blob is not UTF-8: {}", e)))
        }
        other => Err(Error::Parse(format!("Unknown blob encoding: {}", other))),
    }
}

fn repo_route(repo: &RepoRef, rest: &str) -> String {
    format!("/repos/{}/{}/{}", repo.owner, repo.name, rest)
}

impl GitHubClient {
    /// Head commit sha of a branch
    pub async fn get_branch_head(&self, repo: &RepoRef, branch: &str) -> Result<String> {
        debug!(repo = %repo, branch, "Fetching branch head");

        let route = repo_route(repo, &format!("git/ref/heads/{}", branch));
        let head: RefResponse = self
            .client()
            .get(route, None::<&()>)
            .await
            .map_err(|e| classify(e, format!("{}@{}", repo, branch)))?;

        Ok(head.object.sha)
    }

    /// Every node reachable from a commit's tree
    pub async fn get_tree_recursive(&self, repo: &RepoRef, commit_sha: &str) -> Result<Vec<TreeNode>> {
        debug!(repo = %repo, commit = commit_sha, "Fetching recursive tree");

        let route = repo_route(repo, &format!("git/trees/{}?recursive=1", commit_sha));
        let listing: TreeResponse = self
            .client()
            .get(route, None::<&()>)
            .await
            .map_err(|e| classify(e, format!("{}@{}", repo, commit_sha)))?;

        if listing.truncated {
            return Err(Error::Parse(format!(
                "Tree listing for {} at {} was truncated",
                repo, commit_sha
            )));
        }

        Ok(listing.tree)
    }

    /// Blob content as text
    pub async fn get_blob_text(&self, repo: &RepoRef, blob_sha: &str) -> Result<String> {
        let route = repo_route(repo, &format!("git/blobs/{}", blob_sha));
        let blob: BlobResponse = self
            .client()
            .get(route, None::<&()>)
            .await
            .map_err(|e| classify(e, format!("blob {}", blob_sha)))?;

        decode_blob(&blob.content, &blob.encoding)
    }

    /// Tree sha of a commit
    pub async fn get_commit_tree(&self, repo: &RepoRef, commit_sha: &str) -> Result<String> {
        let route = repo_route(repo, &format!("git/commits/{}", commit_sha));
        let commit: CommitResponse = self
            .client()
            .get(route, None::<&()>)
            .await
            .map_err(|e| classify(e, format!("commit {}", commit_sha)))?;

        Ok(commit.tree.sha)
    }

    /// Create a tree overlaying `entries` on `base_tree`
    pub async fn post_tree(&self, repo: &RepoRef, base_tree: &str, entries: &[TreeEntry]) -> Result<String> {
        let body = NewTree {
            base_tree,
            tree: entries,
        };
        let tree: GitObject = self
            .client()
            .post(repo_route(repo, "git/trees"), Some(&body))
            .await?;

        debug!(repo = %repo, tree = %tree.sha, entries = entries.len(), "Created tree");
        Ok(tree.sha)
    }

    /// Create a commit with a single parent
    pub async fn post_commit(
        &self,
        repo: &RepoRef,
        tree_sha: &str,
        parent_sha: &str,
        message: &str,
    ) -> Result<String> {
        let body = json!({
            "message": message,
            "tree": tree_sha,
            "parents": [parent_sha],
        });
        let commit: CommitResponse = self
            .client()
            .post(repo_route(repo, "git/commits"), Some(&body))
            .await?;

        debug!(repo = %repo, commit = %commit.sha, parent = parent_sha, "Created commit");
        Ok(commit.sha)
    }

    /// Create `refs/heads/<branch>` pointing at `sha`
    pub async fn post_branch(&self, repo: &RepoRef, branch: &str, sha: &str) -> Result<()> {
        let body = json!({
            "ref": format!("refs/heads/{}", branch),
            "sha": sha,
        });
        let result: std::result::Result<serde_json::Value, _> = self
            .client()
            .post(repo_route(repo, "git/refs"), Some(&body))
            .await;

        match result {
            Ok(_) => {
                info!(repo = %repo, branch, sha, "Created branch");
                Ok(())
            }
            Err(e) if api_message(&e).is_some_and(|m| m.contains("already exists")) => {
                Err(Error::BranchExists(branch.to_string()))
            }
            Err(e) => Err(Error::Api(e)),
        }
    }

    /// Move a branch to `sha`, even if that is not a fast-forward
    pub async fn patch_branch(&self, repo: &RepoRef, branch: &str, sha: &str) -> Result<()> {
        let body = json!({
            "sha": sha,
            "force": true,
        });
        let _: serde_json::Value = self
            .client()
            .patch(repo_route(repo, &format!("git/refs/heads/{}", branch)), Some(&body))
            .await
            .map_err(|e| classify(e, format!("{}@{}", repo, branch)))?;

        info!(repo = %repo, branch, sha, "Updated branch head");
        Ok(())
    }
}
