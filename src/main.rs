//! `anistream` CLI - Browse WordPress anime sites and play episodes in an external player

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use anistream::Config;

#[derive(Parser)]
#[command(name = "anistream")]
#[command(about = "Find and play episodes from WordPress anime streaming sites")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/anistream/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for anistream.log (overrides [log] dir)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse interactively in the terminal (default)
    Browse {
        /// Prefill the search field
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List configured sources
    Sources,

    /// Search a source for shows
    Search {
        /// Search term
        term: String,

        /// Source id (default: first configured)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// List the episodes of a show
    Episodes {
        /// Show page URL
        url: String,

        /// Source id (default: first configured)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Decode the stream providers of an episode
    Providers {
        /// Episode page URL
        url: String,

        /// Source id (default: first configured)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Resolve an embed URL to playable qualities
    Resolve {
        /// Embed URL (as printed by `providers`)
        url: String,

        /// Mirror label used for hosts without a known name
        #[arg(short, long, default_value = "Embed")]
        label: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let log_dir = cli.log_dir.unwrap_or_else(|| config.log.dir.clone());
    let _guard = anistream::logging::init(&log_dir)?;

    let ctx = cmd::Context::new(config)?;

    match cli.command.unwrap_or(Commands::Browse { search: None }) {
        Commands::Browse { search } => {
            cmd::cmd_browse(&ctx, search.as_deref()).await?;
        }
        Commands::Sources => {
            cmd::cmd_sources(&ctx);
        }
        Commands::Search { term, source } => {
            cmd::cmd_search(&ctx, &term, source.as_deref()).await?;
        }
        Commands::Episodes { url, source } => {
            cmd::cmd_episodes(&ctx, &url, source.as_deref()).await?;
        }
        Commands::Providers { url, source } => {
            cmd::cmd_providers(&ctx, &url, source.as_deref()).await?;
        }
        Commands::Resolve { url, label } => {
            cmd::cmd_resolve(&ctx, &url, &label).await?;
        }
    }

    Ok(())
}
