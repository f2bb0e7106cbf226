use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;
use crate::models::{
    find_db, read_json_list, read_tables_json, write_json_list, EnrichedExample,
    GroundTruthExample, Schema,
};

/// Turns a SQL string into a structured representation against a schema.
pub trait SqlParser {
    fn parse(&self, schema: &Schema, sql: &str) -> Result<serde_json::Value>;
}

/// Splits a question into an ordered list of tokens.
pub trait QuestionTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;
}

pub fn enrich_examples(
    examples: Vec<GroundTruthExample>,
    schema: &Schema,
    parser: &dyn SqlParser,
    tokenizer: &dyn QuestionTokenizer,
) -> Result<Vec<EnrichedExample>> {
    let mut enriched = Vec::with_capacity(examples.len());
    for (idx, example) in examples.into_iter().enumerate() {
        let sql = parser
            .parse(schema, &example.query)
            .with_context(|| format!("parsing query of example {}: {}", idx, example.query))?;
        let question_toks = tokenizer
            .tokenize(&example.question)
            .with_context(|| format!("tokenizing question of example {}", idx))?;
        debug!("Example {}: {} question tokens", idx, question_toks.len());

        enriched.push(EnrichedExample {
            db_id: example.db_id,
            query: example.query,
            question: example.question,
            sql,
            question_toks,
        });
    }
    Ok(enriched)
}

/// Adds parsed SQL and question tokens to every ground-truth example.
///
/// The schema is taken from the `db_id` entry of the tables-metadata file.
/// Any example that fails to parse aborts the whole batch and nothing is written.
pub fn prepare_dev_json(
    ground_truth: &Path,
    tables: &Path,
    dev_out: &Path,
    db_id: &str,
    parser: &dyn SqlParser,
    tokenizer: &dyn QuestionTokenizer,
) -> Result<Vec<EnrichedExample>> {
    let docs = read_tables_json(tables)?;
    let schema = Schema::from_metadata(find_db(&docs, db_id)?);

    let examples: Vec<GroundTruthExample> = read_json_list(ground_truth)?;
    info!("Enriching {} examples from {}", examples.len(), ground_truth.display());

    let enriched = enrich_examples(examples, &schema, parser, tokenizer)?;
    write_json_list(dev_out, &enriched)?;
    info!("Wrote {} enriched examples to {}", enriched.len(), dev_out.display());
    Ok(enriched)
}
