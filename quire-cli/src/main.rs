//! Quire CLI - Command line interface for Quire
//!
//! Edit documents of a GitHub organization's repositories as tasks, and
//! submit each task as a branch and pull request.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quire_core::{Config, GitHost};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{AuthArgs, ForkArgs, TaskArgs};

/// Quire: task-based document editing on GitHub
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// GitHub organization (overrides config and env)
    #[arg(long, global = true)]
    org: Option<String>,

    /// Task storage directory (overrides config and env)
    #[arg(long, global = true)]
    tasks_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Create, edit and submit tasks
    #[command(visible_alias = "t")]
    Task(TaskArgs),

    /// List repositories open for editing
    Repos,

    /// Manage your forks of organization repositories
    Fork(ForkArgs),

    /// Manage the stored GitHub token
    Auth(AuthArgs),

    /// Show the GitHub user the token belongs to
    Whoami,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = Config::load_with_overrides(cli.org.clone(), cli.tasks_dir.clone())?;

    if cli.verbose {
        tracing::info!(
            org = %config.github.org,
            base_branch = ?config.github.base_branch,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("quire {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Task(args)) => {
            args.execute(&config, cli.verbose).await?;
        }
        Some(Commands::Repos) => {
            commands::repos::list(&config, cli.verbose).await?;
        }
        Some(Commands::Fork(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Auth(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Whoami) => {
            let client = quire_github::GitHubClient::from_secrets(config.github.clone())?;
            let user = client
                .current_user()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to identify GitHub user: {}", e))?;
            match &user.name {
                Some(name) => println!("{} ({})", user.login, name),
                None => println!("{}", user.login),
            }
        }
        Some(Commands::Config) => {
            print_config(&config)?;
        }
        None => {
            println!("Quire - Task-based document editing on GitHub");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn print_config(config: &Config) -> anyhow::Result<()> {
    println!("Quire Configuration");
    println!("===================");
    println!();
    println!("GitHub:");
    println!("  org: {}", config.github.org);
    println!(
        "  base_branch: {}",
        config.github.base_branch.as_deref().unwrap_or("(repository default)")
    );
    println!("  file_extension: {}", config.github.file_extension);
    println!(
        "  catalog: {}/{}",
        config.github.catalog_repo, config.github.catalog_path
    );
    println!();
    println!("Pull requests:");
    println!("  reviewers: {}", config.pull_request.reviewers.join(", "));
    println!();
    println!("Fork polling:");
    println!(
        "  every {:?}, at most {} attempts within {:?}",
        config.fork.poll_interval, config.fork.max_attempts, config.fork.timeout
    );
    println!();
    println!("Tasks directory: {}", config.tasks_dir()?.display());
    if let Some(path) = Config::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
    Ok(())
}
