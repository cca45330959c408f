//! Which organization repositories are open for editing

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::GitHubConfig;
use crate::remote::{GitHost, RemoteResult, RepoRef, RepoSummary};

/// A repository an editor may create tasks against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableRepo {
    pub id: u64,
    pub slug: String,
    pub display_name: String,
}

/// Human name from a description like `"📖 George Fox (1624 - 1691)"`
///
/// The leading glyph and the trailing parenthesized dates are dropped.
/// Descriptions that don't have that shape come back unchanged.
pub fn display_name(description: &str) -> String {
    let Some((glyph, rest)) = description.split_once(' ') else {
        return description.to_string();
    };
    if glyph.chars().any(char::is_alphanumeric) {
        return description.to_string();
    }

    let dates_at = rest
        .match_indices(" (")
        .map(|(idx, _)| idx)
        .filter(|idx| rest[idx + 2..].starts_with(|c: char| c.is_ascii_digit()))
        .last();

    match dates_at {
        Some(idx) if idx > 0 => rest[..idx].to_string(),
        _ => description.to_string(),
    }
}

/// Keep repositories listed in the catalog, skipping the organization's own repo
///
/// `catalog_files` are the file names in the catalog directory; a repository
/// is listed when `<name>.yml` is among them.
pub fn eligible_repos(
    org: &str,
    repos: Vec<RepoSummary>,
    catalog_files: &[String],
) -> Vec<EditableRepo> {
    repos
        .into_iter()
        .filter(|repo| repo.name != org)
        .filter(|repo| {
            let wanted = format!("{}.yml", repo.name);
            catalog_files.iter().any(|f| *f == wanted)
        })
        .map(|repo| EditableRepo {
            id: repo.id,
            display_name: repo
                .description
                .as_deref()
                .map(display_name)
                .unwrap_or_else(|| repo.name.clone()),
            slug: repo.name,
        })
        .collect()
}

/// Fetch the editable repositories of the configured organization
pub async fn fetch_editable_repos<H: GitHost + ?Sized>(
    host: &H,
    config: &GitHubConfig,
) -> RemoteResult<Vec<EditableRepo>> {
    let repos = host.list_org_repos(&config.org).await?;
    let catalog = RepoRef::new(&config.org, &config.catalog_repo);
    let files = host.list_directory(&catalog, &config.catalog_path).await?;
    let editable = eligible_repos(&config.org, repos, &files);
    info!(org = %config.org, count = editable.len(), "Fetched editable repositories");
    Ok(editable)
}
