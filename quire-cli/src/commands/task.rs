//! Task commands

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Subcommand};
use quire_core::{Config, Task};

/// Create, edit and submit tasks
#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a task against a repository
    New {
        /// Short description, used as pull request title
        name: String,

        /// Repository name within the organization
        #[arg(short, long)]
        repo: String,

        /// Check the task out right away
        #[arg(long)]
        checkout: bool,
    },

    /// List stored tasks, most recently updated first
    #[command(visible_alias = "ls")]
    List,

    /// Show a task and its edited files
    Show {
        /// Task id or unique prefix
        id: String,
    },

    /// Fetch the repository's current documents into a task
    Checkout {
        /// Task id or unique prefix
        id: String,
    },

    /// Replace the edited content of one file
    Edit {
        /// Task id or unique prefix
        id: String,

        /// Path of the file within the repository
        path: String,

        /// Read the new content from this file
        #[arg(long, conflicts_with = "revert")]
        from_file: Option<PathBuf>,

        /// Drop the local edit instead
        #[arg(long)]
        revert: bool,
    },

    /// Submit a task, or push follow-up edits once it has a pull request
    Submit {
        /// Task id or unique prefix
        id: String,
    },

    /// Check the task's pull request on GitHub
    Status {
        /// Task id or unique prefix
        id: String,
    },

    /// Start over with the same files after the pull request was merged or closed
    Recover {
        /// Task id or unique prefix
        id: String,
    },

    /// Delete a task locally; the remote branch and pull request stay
    #[command(visible_alias = "rm")]
    Delete {
        /// Task id or unique prefix
        id: String,
    },
}

impl TaskArgs {
    /// Execute the task command
    pub async fn execute(&self, config: &Config, verbose: bool) -> anyhow::Result<()> {
        match &self.command {
            TaskCommand::New {
                name,
                repo,
                checkout,
            } => {
                let orch = super::orchestrator(config, false).await?;
                let mut task = orch.create_task(name, repo)?;
                println!("Created task {}", short_id(&task));
                if *checkout {
                    orch.checkout(&mut task).await.map_err(super::report)?;
                    println!("Checked out {} files", task.files.len());
                }
                Ok(())
            }
            TaskCommand::List => list(config),
            TaskCommand::Show { id } => show(config, id, verbose),
            TaskCommand::Checkout { id } => {
                let orch = super::orchestrator(config, false).await?;
                let mut task = orch.store().find(id)?;
                orch.checkout(&mut task).await.map_err(super::report)?;
                println!(
                    "Checked out {} files at {}",
                    task.files.len(),
                    task.parent_commit.as_deref().unwrap_or_default()
                );
                Ok(())
            }
            TaskCommand::Edit {
                id,
                path,
                from_file,
                revert,
            } => edit(config, id, path, from_file.as_ref(), *revert),
            TaskCommand::Submit { id } => {
                let orch = super::orchestrator(config, true).await?;
                let mut task = orch.store().find(id)?;
                if task.pull_request.is_some() {
                    let commit = orch.resubmit(&mut task).await.map_err(super::report)?;
                    println!("Pushed {} to {}", short_sha(&commit), task.branch_name());
                } else {
                    let outcome = orch.submit(&mut task).await.map_err(super::report)?;
                    for path in &outcome.fixed_paths {
                        println!("  fixed whitespace in {}", path);
                    }
                    println!(
                        "Opened pull request #{} from {}",
                        outcome.pull_request, outcome.branch
                    );
                }
                Ok(())
            }
            TaskCommand::Status { id } => {
                let orch = super::orchestrator(config, false).await?;
                let mut task = orch.store().find(id)?;
                let status = orch
                    .refresh_pull_request(&mut task)
                    .await
                    .map_err(super::report)?;
                println!("{}: pull request {}", task.name, status);
                if status.is_finished() {
                    println!("Run `quire task recover {}` to keep working.", short_id(&task));
                }
                Ok(())
            }
            TaskCommand::Recover { id } => {
                let orch = super::orchestrator(config, false).await?;
                let task = orch.store().find(id)?;
                let fresh = orch.recover(&task)?;
                println!("Recovered as task {}", short_id(&fresh));
                Ok(())
            }
            TaskCommand::Delete { id } => {
                let orch = super::orchestrator(config, false).await?;
                let task = orch.store().find(id)?;
                orch.delete_task(&task.id)?;
                println!("Deleted task {}", short_id(&task));
                Ok(())
            }
        }
    }
}

fn store(config: &Config) -> anyhow::Result<quire_core::TaskStore> {
    Ok(quire_core::TaskStore::open(config.tasks_dir()?)?)
}

fn list(config: &Config) -> anyhow::Result<()> {
    let tasks = store(config)?.list()?;
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    let now = Utc::now();
    for task in tasks {
        println!(
            "  {}  {:<14} {:<24} {} ({} ago)",
            short_id(&task),
            task.phase.to_string(),
            task.repo,
            task.name,
            format_age((now - task.updated).num_seconds())
        );
    }
    Ok(())
}

fn show(config: &Config, id: &str, verbose: bool) -> anyhow::Result<()> {
    let task = store(config)?.find(id)?;

    println!("{} [{}]", task.name, task.id);
    println!("  repo:    {}", task.repo);
    println!("  phase:   {} ({})", task.phase, task.phase.description());
    println!("  branch:  {}", task.branch_name());
    if let Some(parent) = &task.parent_commit {
        println!("  parent:  {}", parent);
    }
    if let Some(pr) = &task.pull_request {
        println!("  pull request: #{} ({})", pr.number, pr.status);
    }

    let edited = task.edited_paths();
    println!("  files:   {} ({} edited)", task.files.len(), edited.len());
    for path in edited {
        println!("    * {}", path);
    }
    if verbose {
        for (slug, title) in &task.document_titles {
            println!("  document {}: {}", slug, title);
        }
    }
    Ok(())
}

fn edit(
    config: &Config,
    id: &str,
    path: &str,
    from_file: Option<&PathBuf>,
    revert: bool,
) -> anyhow::Result<()> {
    let store = store(config)?;
    let mut task = store.find(id)?;

    if revert {
        task.revert(path)?;
    } else {
        let source =
            from_file.ok_or_else(|| anyhow::anyhow!("Pass --from-file <FILE> or --revert"))?;
        let content = std::fs::read_to_string(source)?;
        task.edit(path, content)?;
    }

    store.save(&task)?;
    println!("{} edited files", task.edited_paths().len());
    Ok(())
}

fn short_id(task: &Task) -> String {
    task.id.to_string().chars().take(8).collect()
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// Format seconds as a coarse human-readable age
fn format_age(seconds: i64) -> String {
    match seconds {
        s if s < 60 => format!("{}s", s.max(0)),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(-5), "0s");
        assert_eq!(format_age(42), "42s");
        assert_eq!(format_age(600), "10m");
        assert_eq!(format_age(7200), "2h");
        assert_eq!(format_age(3 * 86400 + 5), "3d");
    }

    #[test]
    fn test_short_sha() {
        assert_eq!(short_sha("0123456789abcdef"), "0123456");
        assert_eq!(short_sha("c2"), "c2");
    }
}
