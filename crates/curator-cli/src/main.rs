mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::sync::SyncFlags;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "curator",
    about = "Catalog registry sync and consistency engine — rebuild registries, propagate counts, validate drift, sync clients",
    version,
    propagate_version = true
)]
struct Cli {
    /// Root directory (default: auto-detect from .curator/, skills/, or .git/)
    #[arg(long, global = true, env = "CURATOR_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild registries from the source directories and refresh derived docs
    Build,

    /// Check every registry and downstream document against the source of truth
    Validate,

    /// Sync the remote catalog into this project
    Sync {
        #[command(flatten)]
        flags: SyncFlags,
    },

    /// Sync a single category (skills or tools)
    Update {
        /// Category to sync
        category: String,

        #[command(flatten)]
        flags: SyncFlags,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Build => cmd::build::run(&root),
        Commands::Validate => cmd::validate::run(&root, cli.json),
        Commands::Sync { flags } => cmd::sync::run(&root, &flags, None),
        Commands::Update { category, flags } => cmd::update::run(&root, &category, &flags),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
