use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A literal text replacement applied to both the question and the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

impl Substitution {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_id: String,
    pub in_data_folder: PathBuf,
    pub out_data_folder: PathBuf,
    pub schema_file: String,
    pub db_file: String,
    pub csv_file: String,
    pub tables_file: String,
    pub ground_truth_file: String,
    pub dev_file: String,
    // Model identifier or path to a tokenizer.json
    pub tokenizer: String,
    pub skip_token_id: u32,
    pub substitutions: Vec<Substitution>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_id: "asana".to_string(),
            in_data_folder: PathBuf::from("data/in"),
            out_data_folder: PathBuf::from("data/out"),
            schema_file: "schema.sql".to_string(),
            db_file: "asana.sqlite".to_string(),
            csv_file: "rasat_csv.csv".to_string(),
            tables_file: "tables.json".to_string(),
            ground_truth_file: "dev_out.json".to_string(),
            dev_file: "dev.json".to_string(),
            tokenizer: "t5-base".to_string(),
            skip_token_id: 1,
            substitutions: vec![Substitution::new("\u{201c}High\u{201d}", "'High'")],
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("reading config {}", config_path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("parsing config {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Self::new())
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content)
            .with_context(|| format!("writing config {}", config_path.display()))?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".config").join("spider-prep").join("config.json"))
    }

    pub fn schema_path(&self) -> PathBuf {
        self.in_data_folder.join(&self.schema_file)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.in_data_folder.join(&self.csv_file)
    }

    pub fn db_path(&self) -> PathBuf {
        self.out_data_folder.join(&self.db_file)
    }

    pub fn tables_path(&self) -> PathBuf {
        self.out_data_folder.join(&self.tables_file)
    }

    pub fn ground_truth_path(&self) -> PathBuf {
        self.out_data_folder.join(&self.ground_truth_file)
    }

    pub fn dev_path(&self) -> PathBuf {
        self.out_data_folder.join(&self.dev_file)
    }

    /// Schema-name qualifiers stripped from question and query text,
    /// e.g. `asana.` and `Asana.` for the `asana` database.
    pub fn qualifier_prefixes(&self) -> Vec<String> {
        let lower = self.db_id.to_lowercase();
        let mut chars = lower.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => return vec![],
        };

        let mut prefixes = vec![format!("{}.", lower)];
        if capitalized != lower {
            prefixes.push(format!("{}.", capitalized));
        }
        prefixes
    }
}
