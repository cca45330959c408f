//! Repositories, forks, the authenticated user and the document catalog

use std::collections::BTreeMap;

use crate::error::classify;
use crate::{Error, GitHubClient, Result};
use quire_core::remote::RepoSummary;
use quire_core::{RepoRef, UserIdentity};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

/// Largest page the list endpoints serve
const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
    name: Option<String>,
    #[serde(default)]
    avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    id: u64,
    name: String,
    description: Option<String>,
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
}

/// Catalog entry describing one author's documents
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    documents: Vec<CatalogDocument>,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    slug: String,
    title: String,
}

/// Slug to title map from a catalog yml file
fn parse_document_titles(yml: &str) -> Result<BTreeMap<String, String>> {
    let entry: CatalogEntry =
        serde_yaml::from_str(yml).map_err(|e| Error::Parse(format!("Invalid catalog file: {}", e)))?;
    Ok(entry
        .documents
        .into_iter()
        .map(|doc| (doc.slug, doc.title))
        .collect())
}

impl GitHubClient {
    /// The user the token belongs to
    pub async fn get_current_user(&self) -> Result<UserIdentity> {
        let user: UserResponse = self.client().get("/user", None::<&()>).await?;
        debug!(login = %user.login, "Fetched current user");

        Ok(UserIdentity {
            login: user.login,
            name: user.name,
            avatar_url: user.avatar_url,
        })
    }

    async fn get_repo(&self, repo: &RepoRef) -> Result<RepoResponse> {
        let route = format!("/repos/{}/{}", repo.owner, repo.name);
        self.client()
            .get(route, None::<&()>)
            .await
            .map_err(|e| classify(e, repo.to_string()))
    }

    /// Name of the repository's default branch
    pub async fn get_default_branch(&self, repo: &RepoRef) -> Result<String> {
        self.get_repo(repo)
            .await?
            .default_branch
            .ok_or_else(|| Error::Parse(format!("{} has no default branch", repo)))
    }

    /// Whether the repository exists and is visible to us
    pub async fn repo_exists(&self, repo: &RepoRef) -> Result<bool> {
        match self.get_repo(repo).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Request a fork into the authenticated user's account
    ///
    /// GitHub answers before the fork is usable; callers poll for it.
    pub async fn request_fork(&self, upstream: &RepoRef) -> Result<()> {
        let route = format!("/repos/{}/{}/forks", upstream.owner, upstream.name);
        let _: serde_json::Value = self.client().post(route, Some(&json!({}))).await?;
        info!(upstream = %upstream, "Requested fork");
        Ok(())
    }

    /// Every repository of an organization, following pagination
    pub async fn get_org_repos(&self, org: &str) -> Result<Vec<RepoSummary>> {
        let mut repos = Vec::new();
        for page in 1.. {
            let route = format!("/orgs/{}/repos?per_page={}&page={}", org, PER_PAGE, page);
            let batch: Vec<RepoResponse> = self
                .client()
                .get(route, None::<&()>)
                .await
                .map_err(|e| classify(e, format!("organization {}", org)))?;

            let done = batch.len() < PER_PAGE;
            repos.extend(batch.into_iter().map(|r| RepoSummary {
                id: r.id,
                name: r.name,
                description: r.description,
            }));
            if done {
                break;
            }
        }

        info!(org, count = repos.len(), "Fetched organization repositories");
        Ok(repos)
    }

    /// File names directly under a directory
    pub async fn get_directory(&self, repo: &RepoRef, path: &str) -> Result<Vec<String>> {
        let route = format!(
            "/repos/{}/{}/contents/{}",
            repo.owner,
            repo.name,
            path.trim_matches('/')
        );
        let entries: Vec<ContentEntry> = self
            .client()
            .get(route, None::<&()>)
            .await
            .map_err(|e| classify(e, format!("{}:{}", repo, path)))?;

        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    /// Document titles listed in the catalog for a repository
    pub async fn get_document_titles(&self, repo: &RepoRef) -> Result<BTreeMap<String, String>> {
        let url = self.catalog_url(&repo.name);
        debug!(url = %url, "Fetching catalog entry");

        let response = self.http().get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url));
        }
        let yml = response.error_for_status()?.text().await?;

        parse_document_titles(&yml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_titles() {
        let yml = "\
name: George Fox
slug: george-fox
documents:
  - slug: journal
    title: The Journal of George Fox
    editions: []
  - slug: epistles
    title: Epistles
";
        let titles = parse_document_titles(yml).unwrap();
        assert_eq!(titles.len(), 2);
        assert_eq!(titles["journal"], "The Journal of George Fox");
        assert_eq!(titles["epistles"], "Epistles");
    }

    #[test]
    fn test_parse_document_titles_without_documents() {
        assert!(parse_document_titles("name: Nobody\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_document_titles_rejects_garbage() {
        assert!(matches!(
            parse_document_titles("documents: [unterminated"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_repo_response_parse() {
        let repo: RepoResponse = serde_json::from_value(json!({
            "id": 7,
            "name": "george-fox",
            "description": "📖 George Fox (1624 - 1691)",
            "default_branch": "master",
            "private": false,
        }))
        .unwrap();
        assert_eq!(repo.default_branch.as_deref(), Some("master"));
        assert_eq!(repo.id, 7);
    }
}
