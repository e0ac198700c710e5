//! skilldock - install Agent Skills once, use them from every agent.
//!
//! Skills live under a single managed root (`~/.skilldock`); host programs
//! like Claude Code and Codex see them through backend symlinks. This binary
//! is a thin surface over `skilldock-core`, which does all the work.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use skilldock_core::config::Config;
use skilldock_core::paths::Layout;

mod commands;

#[derive(Parser)]
#[command(name = "skilldock", version, about = "A package manager for Agent Skills")]
struct Cli {
    /// Managed root directory (default: ~/.skilldock, or $SKILLDOCK_HOME)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a skill from the registry
    ///
    /// Accepts `name` or `name@tag`. Reinstalls over local modifications
    /// only after confirmation (or with --force).
    Install {
        /// Skill name, optionally with a version tag (`name@v1.2.0`)
        spec: String,
        /// Overwrite local modifications without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Remove an installed skill (the shared repo clone is kept)
    Remove {
        name: String,
    },

    /// Update one or all installed skills
    Update {
        /// Skill to update; all installed skills when omitted
        name: Option<String>,
        /// Discard local modifications instead of skipping
        #[arg(short, long)]
        force: bool,
        /// Show what would change without touching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List installed and locally present skills
    List,

    /// Search the merged skill index
    Search {
        /// Substring matched against name, description, author, and tags
        query: Option<String>,
    },

    /// Show details for one skill
    Info {
        name: String,
    },

    /// Force-refresh the skill index from every configured repository
    Sync,

    /// Manage skill repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },

    /// Manage AI agent backends (symlinked host directories)
    Backend {
        #[command(subcommand)]
        command: BackendCommands,
    },
}

#[derive(Subcommand)]
enum RepoCommands {
    /// Add a repository (or repoint an existing name)
    Add { name: String, url: String },
    /// Remove a repository
    #[command(alias = "rm")]
    Remove { name: String },
    /// List configured repositories
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
enum BackendCommands {
    /// List configured backends and their link status
    #[command(alias = "ls")]
    List,
    /// Create the symlink for a backend (or all unlinked backends)
    ///
    /// A backend directory that already holds files is migrated into the
    /// managed skills directory first.
    Link {
        name: Option<String>,
        /// Migrate pre-existing directories without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove a backend's symlink (never deletes a real directory)
    Unlink { name: String },
    /// Add a custom backend
    Add {
        name: String,
        /// Skills path, may contain `~` or `$XDG_CONFIG_HOME`
        path: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Remove a custom backend (built-ins cannot be removed)
    #[command(alias = "rm")]
    Remove { name: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let layout = match &cli.root {
        Some(root) => Layout::at_root(root),
        None => Layout::discover()?,
    };
    let mut cfg = Config::load(layout)?;

    match cli.command {
        Commands::Install { spec, force } => commands::install::run(&cfg, &spec, force),
        Commands::Remove { name } => commands::remove::run(&cfg, &name),
        Commands::Update {
            name,
            force,
            dry_run,
        } => commands::update::run(&cfg, name.as_deref(), force, dry_run),
        Commands::List => commands::list::run(&cfg),
        Commands::Search { query } => commands::search::run(&cfg, query.as_deref().unwrap_or("")),
        Commands::Info { name } => commands::info::run(&cfg, &name),
        Commands::Sync => commands::sync::run(&cfg),
        Commands::Repo { command } => match command {
            RepoCommands::Add { name, url } => commands::repo::add(&mut cfg, &name, &url),
            RepoCommands::Remove { name } => commands::repo::remove(&mut cfg, &name),
            RepoCommands::List => commands::repo::list(&cfg),
        },
        Commands::Backend { command } => match command {
            BackendCommands::List => commands::backend::list(&cfg),
            BackendCommands::Link { name, yes } => {
                commands::backend::link(&cfg, name.as_deref(), yes)
            }
            BackendCommands::Unlink { name } => commands::backend::unlink(&cfg, &name),
            BackendCommands::Add {
                name,
                path,
                description,
            } => commands::backend::add(&mut cfg, &name, &path, &description),
            BackendCommands::Remove { name } => commands::backend::remove(&mut cfg, &name),
        },
    }
}
