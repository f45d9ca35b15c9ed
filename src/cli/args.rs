use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    pub generate_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze the comment sections of one or more videos
    Analyze {
        /// Video ids or free-text searches such as "artist - title"
        #[arg(required = true)]
        queries: Vec<String>,

        /// Neither consult nor fill the cache for this run
        #[arg(long)]
        no_cache: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Inspect and maintain the analysis cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CacheAction {
    /// Show entry count, age range and file size
    Stats,

    /// Remove expired entries
    Purge {
        /// Override the configured maximum age
        #[arg(long)]
        max_age_hours: Option<u64>,
    },

    /// Remove every entry
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List cached videos, oldest first
    List,
}

#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub queries: Vec<String>,
    pub no_cache: bool,
    pub pretty: bool,
}

pub fn validate_analyze_args(args: &AnalyzeArgs) -> Result<()> {
    if args.queries.iter().all(|q| q.trim().is_empty()) {
        return Err(anyhow!("At least one non-empty query must be given"));
    }
    Ok(())
}
