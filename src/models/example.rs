use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One natural-language question paired with its SQL answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthExample {
    pub db_id: String,
    pub query: String,
    pub question: String,
}

impl GroundTruthExample {
    pub fn new(db_id: &str, query: String, question: String) -> Self {
        Self {
            db_id: db_id.to_string(),
            query,
            question,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedExample {
    pub db_id: String,
    pub query: String,
    pub question: String,
    pub sql: serde_json::Value,
    pub question_toks: Vec<String>,
}

pub fn write_json_list<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string(items)?;
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn read_json_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let items = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(items)
}
