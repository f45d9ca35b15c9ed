use anyhow::Result;
use clap::Parser;
use std::collections::HashMap;

use crate::cli::args::{AnalyzeArgs, Args, Commands, validate_analyze_args};
use crate::cli::commands::{handle_cache_command, run_analyze_command};
use crate::config::TunesenseConfig;

pub struct RootCommand;

impl RootCommand {
    pub async fn execute() -> Result<()> {
        let args = Args::parse();

        if args.generate_config {
            println!("{}", TunesenseConfig::generate_default_config());
            return Ok(());
        }

        let env_vars: HashMap<String, String> = std::env::vars().collect();
        let config = TunesenseConfig::load_with_precedence(args.config.as_deref(), &env_vars)?;

        match &args.command {
            Some(Commands::Analyze {
                queries,
                no_cache,
                pretty,
            }) => {
                let analyze_args = AnalyzeArgs {
                    queries: queries.clone(),
                    no_cache: *no_cache,
                    pretty: *pretty,
                };

                validate_analyze_args(&analyze_args)?;
                run_analyze_command(analyze_args, &config).await
            }
            Some(Commands::Cache { action }) => handle_cache_command(action, &config).await,
            None => Err(anyhow::anyhow!(
                "No command given. Try `tunesense analyze <QUERY>` or `tunesense --help`"
            )),
        }
    }
}
