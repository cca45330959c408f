//! List repositories open for editing

use quire_core::Config;

pub async fn list(config: &Config, verbose: bool) -> anyhow::Result<()> {
    let orch = super::orchestrator(config, false).await?;

    if verbose {
        println!("Fetching repositories of {}...", config.github.org);
    }

    let repos = orch.editable_repos().await.map_err(super::report)?;
    if repos.is_empty() {
        println!("No editable repositories found.");
        return Ok(());
    }

    for repo in repos {
        println!("  {:<30} {}", repo.slug, repo.display_name);
    }
    Ok(())
}
