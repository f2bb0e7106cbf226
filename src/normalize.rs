use anyhow::{bail, Context, Result};
use log::{debug, info, trace};
use std::io::Read;
use std::path::Path;
use crate::config::{Config, Substitution};
use crate::models::{write_json_list, GroundTruthExample};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Text cleanup applied to every question and query.
#[derive(Debug, Clone, Default)]
pub struct TextRules {
    // Schema-name prefixes such as `asana.`, removed wherever they appear
    pub qualifiers: Vec<String>,
    pub substitutions: Vec<Substitution>,
}

impl TextRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            qualifiers: config.qualifier_prefixes(),
            substitutions: config.substitutions.clone(),
        }
    }

    pub fn apply(&self, text: &str) -> String {
        let mut text = text.to_string();
        for qualifier in &self.qualifiers {
            text = text.replace(qualifier.as_str(), "");
        }
        for sub in &self.substitutions {
            text = text.replace(sub.from.as_str(), &sub.to);
        }
        text
    }
}

/// Reads header-less (question, query) rows into ground-truth examples.
pub fn normalize_records<R: Read>(
    reader: R,
    db_id: &str,
    rules: &TextRules,
) -> Result<Vec<GroundTruthExample>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut examples = Vec::new();
    let mut skipped = 0;
    for (row_idx, record) in csv_reader.records().enumerate() {
        let row = row_idx + 1;
        let record = record.with_context(|| format!("reading CSV row {}", row))?;
        trace!("Row {}: {:?}", row, record);

        let (question, query) = match (record.get(0), record.get(1)) {
            (Some(question), Some(query)) => (question, query),
            _ => bail!("CSV row {} has {} field(s), expected question and query", row, record.len()),
        };

        // Only the question column can carry the byte-order mark
        let question = question.strip_prefix(BYTE_ORDER_MARK).unwrap_or(question);
        if question.is_empty() || query.is_empty() {
            debug!("Skipping row {}: empty question or query", row);
            skipped += 1;
            continue;
        }

        examples.push(GroundTruthExample::new(
            db_id,
            rules.apply(query),
            rules.apply(question),
        ));
    }

    info!(
        "Normalized {} examples ({} rows skipped)",
        examples.len(),
        skipped
    );
    Ok(examples)
}

pub fn process_ground_truth(
    csv_in: &Path,
    json_out: &Path,
    db_id: &str,
    rules: &TextRules,
) -> Result<Vec<GroundTruthExample>> {
    let file = std::fs::File::open(csv_in)
        .with_context(|| format!("opening ground truth CSV {}", csv_in.display()))?;
    let examples = normalize_records(file, db_id, rules)
        .with_context(|| format!("normalizing {}", csv_in.display()))?;
    write_json_list(json_out, &examples)?;
    info!("Wrote {} examples to {}", examples.len(), json_out.display());
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rules() -> TextRules {
        TextRules::from_config(&Config::default())
    }

    fn normalize(csv: &str) -> Result<Vec<GroundTruthExample>> {
        normalize_records(csv.as_bytes(), "asana", &rules())
    }

    #[test]
    fn test_qualifiers_are_stripped() {
        let examples =
            normalize("\"asana.Task.Name\",\"SELECT asana.Task.Name FROM asana.Task\"\n").unwrap();
        assert_eq!(
            examples,
            vec![GroundTruthExample::new(
                "asana",
                "SELECT Task.Name FROM Task".to_string(),
                "Task.Name".to_string(),
            )]
        );
        assert_eq!(
            serde_json::to_string(&examples[0]).unwrap(),
            r#"{"db_id":"asana","query":"SELECT Task.Name FROM Task","question":"Task.Name"}"#
        );
    }

    #[test]
    fn test_capitalized_qualifier_and_smart_quotes() {
        let examples = normalize(
            "Tasks with “High” priority in Asana.Task,SELECT * FROM Asana.Task WHERE Priority = “High”\n",
        )
        .unwrap();
        assert_eq!(examples[0].question, "Tasks with 'High' priority in Task");
        assert_eq!(examples[0].query, "SELECT * FROM Task WHERE Priority = 'High'");
    }

    #[test]
    fn test_empty_rows_are_skipped() {
        let examples = normalize("q1,SELECT 1\n,SELECT 2\nq3,\n\"\",\"\"\nq5,SELECT 5\n").unwrap();
        let questions: Vec<&str> = examples.iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, vec!["q1", "q5"]);
    }

    #[test]
    fn test_byte_order_mark_is_removed() {
        let examples = normalize("\u{feff}How many tasks?,SELECT count(*) FROM Task\n").unwrap();
        assert_eq!(examples[0].question, "How many tasks?");

        // A cell holding only the mark counts as empty
        let examples = normalize("\u{feff},SELECT 1\nq,SELECT 2\n").unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].question, "q");
    }

    #[test]
    fn test_short_row_aborts() {
        let err = normalize("q1,SELECT 1\nonly one field\n").unwrap_err();
        assert!(format!("{:#}", err).contains("row 2"));
    }

    #[test]
    fn test_process_ground_truth_writes_json() {
        let dir = TempDir::new().unwrap();
        let csv_in = dir.path().join("gt.csv");
        let json_out = dir.path().join("out").join("dev_out.json");
        std::fs::write(&csv_in, "Name of asana.Task,SELECT Name FROM asana.Task\n").unwrap();

        process_ground_truth(&csv_in, &json_out, "asana", &rules()).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_out).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!([
                {"db_id": "asana", "query": "SELECT Name FROM Task", "question": "Name of Task"}
            ])
        );
    }
}
