//! Builds text-to-SQL benchmark inputs from a SQLite schema script and a
//! CSV of natural-language questions with their SQL answers.
//!
//! The steps run in order and each one is all-or-nothing:
//! 1. **create-db** - execute the schema script into a fresh SQLite file.
//! 2. **tables** - introspect that file into the tables-metadata JSON.
//! 3. **ground-truth** - normalize the CSV into a list of examples.
//! 4. **enrich** - add the parsed SQL and the tokenized question to every example.

mod cli;
mod config;
mod db;
mod enrich;
mod models;
mod normalize;
mod parser;
mod pipeline;
mod tokenizer;

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use std::path::Path;
use std::process::ExitCode;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::parser::AstSqlParser;
use crate::pipeline::Pipeline;
use crate::tokenizer::PretrainedTokenizer;

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli.overrides.apply(&mut config);

    let pipeline = Pipeline::new(config);
    match cli.command.unwrap_or(Commands::All) {
        Commands::All => {
            let tokenizer = load_tokenizer(pipeline.config())?;
            pipeline.run_all(&AstSqlParser, &tokenizer)?;
        }
        Commands::CreateDb => {
            pipeline.create_db()?;
        }
        Commands::Tables => {
            pipeline.create_tables()?;
        }
        Commands::GroundTruth => {
            pipeline.ground_truth()?;
        }
        Commands::Enrich => {
            let tokenizer = load_tokenizer(pipeline.config())?;
            pipeline.enrich(&AstSqlParser, &tokenizer)?;
        }
        Commands::Config { save } => {
            show_config(pipeline.config(), save, cli.config.as_deref())?;
        }
    }
    Ok(())
}

fn show_config(config: &Config, save: bool, path: Option<&Path>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if save {
        let path = match path {
            Some(path) => {
                config.save_to(path)?;
                path.to_path_buf()
            }
            None => config.save()?,
        };
        info!("Saved configuration to {}", path.display());
    }
    Ok(())
}

fn load_tokenizer(config: &Config) -> Result<PretrainedTokenizer> {
    PretrainedTokenizer::load(&config.tokenizer, config.skip_token_id)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _r = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .format_timestamp(None)
        .try_init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
