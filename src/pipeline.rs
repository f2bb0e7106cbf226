use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;
use crate::config::Config;
use crate::db::Database;
use crate::enrich::{prepare_dev_json, QuestionTokenizer, SqlParser};
use crate::models::{write_tables_json, EnrichedExample, GroundTruthExample, TablesMetadata};
use crate::normalize::{process_ground_truth, TextRules};

// Outputs are write-once: a step that fails must not leave an older file behind
fn clear_output(path: &Path) -> Result<()> {
    if path.exists() {
        debug!("Removing previous output {}", path.display());
        fs::remove_file(path).with_context(|| format!("removing {}", path.display()))?;
    }
    Ok(())
}

/// The four preparation steps, each reading and writing files named by the config.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn create_db(&self) -> Result<Database> {
        Database::materialize(&self.config.schema_path(), &self.config.db_path())
    }

    pub fn create_tables(&self) -> Result<TablesMetadata> {
        clear_output(&self.config.tables_path())?;
        let db = Database::open(&self.config.db_path())?;
        let metadata = TablesMetadata::build(&self.config.db_id, &db.introspect()?);
        let path = self.config.tables_path();
        write_tables_json(&path, std::slice::from_ref(&metadata))?;
        info!("Wrote tables metadata to {}", path.display());
        Ok(metadata)
    }

    pub fn ground_truth(&self) -> Result<Vec<GroundTruthExample>> {
        clear_output(&self.config.ground_truth_path())?;
        process_ground_truth(
            &self.config.csv_path(),
            &self.config.ground_truth_path(),
            &self.config.db_id,
            &TextRules::from_config(&self.config),
        )
    }

    pub fn enrich(
        &self,
        parser: &dyn SqlParser,
        tokenizer: &dyn QuestionTokenizer,
    ) -> Result<Vec<EnrichedExample>> {
        clear_output(&self.config.dev_path())?;
        prepare_dev_json(
            &self.config.ground_truth_path(),
            &self.config.tables_path(),
            &self.config.dev_path(),
            &self.config.db_id,
            parser,
            tokenizer,
        )
    }

    pub fn run_all(
        &self,
        parser: &dyn SqlParser,
        tokenizer: &dyn QuestionTokenizer,
    ) -> Result<Vec<EnrichedExample>> {
        for path in [
            self.config.tables_path(),
            self.config.ground_truth_path(),
            self.config.dev_path(),
        ] {
            clear_output(&path)?;
        }
        self.create_db()?;
        self.create_tables()?;
        self.ground_truth()?;
        self.enrich(parser, tokenizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{read_tables_json, Schema};
    use crate::parser::AstSqlParser;
    use tempfile::TempDir;

    struct CharCountTokenizer;

    impl QuestionTokenizer for CharCountTokenizer {
        fn tokenize(&self, text: &str) -> Result<Vec<String>> {
            Ok(text.split_whitespace().map(|w| w.len().to_string()).collect())
        }
    }

    fn setup(csv: &str) -> (TempDir, Pipeline) {
        let dir = TempDir::new().unwrap();
        let in_dir = dir.path().join("in");
        fs::create_dir_all(&in_dir).unwrap();
        fs::write(
            in_dir.join("schema.sql"),
            "CREATE TABLE Project (Id INTEGER PRIMARY KEY, Name TEXT);
             CREATE TABLE Task (
                 Id INTEGER PRIMARY KEY,
                 Name TEXT,
                 ProjectId INTEGER REFERENCES Project(Id),
                 Assignee INTEGER REFERENCES User(Id)
             );
             INSERT INTO Project VALUES (1, 'Launch');",
        )
        .unwrap();
        fs::write(in_dir.join("rasat_csv.csv"), csv).unwrap();

        let config = Config {
            in_data_folder: in_dir,
            out_data_folder: dir.path().join("out"),
            ..Config::default()
        };
        (dir, Pipeline::new(config))
    }

    #[test]
    fn test_run_all_end_to_end() {
        let (_dir, pipeline) = setup(
            "\u{feff}asana.Task.Name,SELECT asana.Task.Name FROM asana.Task\n\
             ,SELECT 1\n\
             Projects named “High”,SELECT Name FROM Asana.Project WHERE Name = “High”\n",
        );
        let enriched = pipeline.run_all(&AstSqlParser, &CharCountTokenizer).unwrap();

        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].query, "SELECT Task.Name FROM Task");
        assert_eq!(enriched[0].question, "Task.Name");
        assert_eq!(enriched[0].question_toks, vec!["9"]);
        assert_eq!(
            enriched[1].query,
            "SELECT Name FROM Project WHERE Name = 'High'"
        );

        let config = pipeline.config();
        assert!(config.db_path().exists());
        assert!(config.ground_truth_path().exists());
        assert!(config.dev_path().exists());
    }

    #[test]
    fn test_tables_metadata_from_materialized_db() {
        let (_dir, pipeline) = setup("");
        pipeline.create_db().unwrap();
        let metadata = pipeline.create_tables().unwrap();

        assert_eq!(metadata.table_names, vec!["project", "task"]);
        assert_eq!(metadata.column_names.len(), 7);
        assert_eq!(metadata.primary_keys, vec![1, 3]);
        // Task.Assignee references a table that does not exist
        assert_eq!(metadata.foreign_keys, vec![[5, 1]]);

        let docs = read_tables_json(&pipeline.config().tables_path()).unwrap();
        assert_eq!(docs, vec![metadata]);
        let schema = Schema::from_metadata(&docs[0]);
        assert!(schema.has_column("task", "projectid"));
    }

    #[test]
    fn test_unparseable_query_writes_no_dev_file() {
        let (_dir, pipeline) = setup("q,SELECT Name FROM Tag\n");
        assert!(pipeline.run_all(&AstSqlParser, &CharCountTokenizer).is_err());
        assert!(!pipeline.config().dev_path().exists());
    }

    #[test]
    fn test_failed_rerun_removes_previous_dev_file() {
        let (_dir, pipeline) = setup("q,SELECT Name FROM Task\n");
        pipeline.run_all(&AstSqlParser, &CharCountTokenizer).unwrap();
        let config = pipeline.config();
        assert!(config.dev_path().exists());

        fs::write(config.csv_path(), "q,SELECT Name FROM Tag\n").unwrap();
        assert!(pipeline.run_all(&AstSqlParser, &CharCountTokenizer).is_err());
        assert!(!config.dev_path().exists());

        // The ground truth on disk belongs to the failed run, not the earlier one
        let written = fs::read_to_string(config.ground_truth_path()).unwrap();
        assert!(written.contains("FROM Tag"));
    }

    #[test]
    fn test_missing_script_clears_every_output() {
        let (_dir, pipeline) = setup("q,SELECT Name FROM Task\n");
        pipeline.run_all(&AstSqlParser, &CharCountTokenizer).unwrap();
        let config = pipeline.config();

        fs::remove_file(config.schema_path()).unwrap();
        assert!(pipeline.run_all(&AstSqlParser, &CharCountTokenizer).is_err());
        assert!(!config.db_path().exists());
        assert!(!config.tables_path().exists());
        assert!(!config.ground_truth_path().exists());
        assert!(!config.dev_path().exists());
    }

    #[test]
    fn test_tables_step_requires_database() {
        let (_dir, pipeline) = setup("");
        assert!(pipeline.create_tables().is_err());
    }
}
