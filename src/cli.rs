use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "spider-prep",
    about = "Prepare a SQLite schema and question/query CSV as text-to-SQL benchmark files.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Configuration file to use instead of `~/.config/spider-prep/config.json`.
    #[arg(
        long,
        env = "SPIDER_PREP_CONFIG",
        value_hint = ValueHint::FilePath,
        global = true,
        help_heading = "Global Options"
    )]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Per-run overrides of the configuration file.
#[derive(Args, Default)]
pub struct ConfigOverrides {
    /// Identifier of the database written into every output document.
    #[arg(long, global = true, help_heading = "Global Options")]
    pub db_id: Option<String>,
    /// Folder holding the schema script and the ground-truth CSV.
    #[arg(long, value_hint = ValueHint::DirPath, global = true, help_heading = "Global Options")]
    pub in_data_folder: Option<PathBuf>,
    /// Folder receiving the database and every generated JSON file.
    #[arg(long, value_hint = ValueHint::DirPath, global = true, help_heading = "Global Options")]
    pub out_data_folder: Option<PathBuf>,
    /// Schema script file name, relative to the input folder.
    #[arg(long, global = true, help_heading = "Global Options")]
    pub schema_file: Option<String>,
    /// Database file name, relative to the output folder.
    #[arg(long, global = true, help_heading = "Global Options")]
    pub db_file: Option<String>,
    /// Ground-truth CSV file name, relative to the input folder.
    #[arg(long, global = true, help_heading = "Global Options")]
    pub csv_file: Option<String>,
    /// Tables-metadata file name, relative to the output folder.
    #[arg(long, global = true, help_heading = "Global Options")]
    pub tables_file: Option<String>,
    /// Normalized ground-truth file name, relative to the output folder.
    #[arg(long, global = true, help_heading = "Global Options")]
    pub ground_truth_file: Option<String>,
    /// Enriched examples file name, relative to the output folder.
    #[arg(long, global = true, help_heading = "Global Options")]
    pub dev_file: Option<String>,
    /// Pretrained tokenizer identifier or path to a `tokenizer.json`.
    #[arg(long, global = true, help_heading = "Global Options")]
    pub tokenizer: Option<String>,
    /// Token id dropped from every tokenized question.
    #[arg(long, global = true, help_heading = "Global Options")]
    pub skip_token_id: Option<u32>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut Config) {
        if let Some(db_id) = self.db_id {
            config.db_id = db_id;
        }
        if let Some(folder) = self.in_data_folder {
            config.in_data_folder = folder;
        }
        if let Some(folder) = self.out_data_folder {
            config.out_data_folder = folder;
        }
        if let Some(file) = self.schema_file {
            config.schema_file = file;
        }
        if let Some(file) = self.db_file {
            config.db_file = file;
        }
        if let Some(file) = self.csv_file {
            config.csv_file = file;
        }
        if let Some(file) = self.tables_file {
            config.tables_file = file;
        }
        if let Some(file) = self.ground_truth_file {
            config.ground_truth_file = file;
        }
        if let Some(file) = self.dev_file {
            config.dev_file = file;
        }
        if let Some(tokenizer) = self.tokenizer {
            config.tokenizer = tokenizer;
        }
        if let Some(id) = self.skip_token_id {
            config.skip_token_id = id;
        }
    }
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq)]
pub enum Commands {
    /// Run every step in order (the default).
    All,
    /// Build the SQLite database from the schema script.
    CreateDb,
    /// Introspect the database and write the tables metadata.
    Tables,
    /// Normalize the question/query CSV into ground-truth JSON.
    GroundTruth,
    /// Add parsed SQL and question tokens to the ground-truth examples.
    Enrich,
    /// Print the effective configuration.
    Config {
        /// Persist the effective configuration to the config file.
        #[arg(long)]
        save: bool,
    },
}
