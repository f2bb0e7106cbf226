use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use crate::db::{ForeignKeyInfo, SchemaInfo};

/// Table index used for the `*` sentinel in `column_names`.
pub const WILDCARD_TABLE: i64 = -1;
pub const WILDCARD_COLUMN: &str = "*";
pub const WILDCARD_TYPE: &str = "TEXT";

/// The tables-metadata document of one database.
///
/// Every column is identified by its position in `column_names`. Position 0
/// is the `*` sentinel, so real columns occupy `1..=C` and `primary_keys` /
/// `foreign_keys` refer to those positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablesMetadata {
    pub db_id: String,
    pub column_names: Vec<(i64, String)>,
    pub column_names_original: Vec<(i64, String)>,
    pub column_types: Vec<String>,
    pub table_names: Vec<String>,
    pub table_names_original: Vec<String>,
    pub primary_keys: Vec<usize>,
    // [referencing column, referenced column]
    pub foreign_keys: Vec<[usize; 2]>,
}

impl TablesMetadata {
    pub fn build(db_id: &str, schema: &SchemaInfo) -> Self {
        let mut column_names = vec![(WILDCARD_TABLE, WILDCARD_COLUMN.to_string())];
        let mut column_types = vec![WILDCARD_TYPE.to_string()];
        let mut table_names = Vec::with_capacity(schema.tables.len());
        let mut primary_keys = Vec::new();

        for (table_idx, table) in schema.tables.iter().enumerate() {
            table_names.push(table.name.clone());
            for column in &table.columns {
                if column.is_primary_key() {
                    primary_keys.push(column_names.len());
                }
                column_names.push((table_idx as i64, column.name.clone()));
                column_types.push(column.data_type.clone());
            }
        }

        let mut metadata = TablesMetadata {
            db_id: db_id.to_string(),
            column_names_original: column_names.clone(),
            column_names,
            column_types,
            table_names_original: table_names.clone(),
            table_names,
            primary_keys,
            foreign_keys: Vec::new(),
        };

        for (table_idx, table) in schema.tables.iter().enumerate() {
            for fk in &table.foreign_keys {
                match metadata.resolve_foreign_key(schema, table_idx, fk) {
                    Some(edge) => metadata.foreign_keys.push(edge),
                    None => warn!(
                        "Dropping foreign key {}.{} -> {}.{}: column not found",
                        table.name,
                        fk.from_column,
                        fk.ref_table,
                        fk.to_column.as_deref().unwrap_or("<primary key>")
                    ),
                }
            }
        }

        info!(
            "Built tables metadata for {}: {} tables, {} columns, {} primary keys, {} foreign keys",
            metadata.db_id,
            metadata.table_names.len(),
            metadata.column_count(),
            metadata.primary_keys.len(),
            metadata.foreign_keys.len()
        );
        metadata
    }

    /// Number of real columns, the sentinel excluded.
    pub fn column_count(&self) -> usize {
        self.column_names.len().saturating_sub(1)
    }

    pub fn table_index(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.table_names.iter().position(|t| *t == name)
    }

    /// First column of `table_idx` named `name`, compared case-insensitively.
    pub fn column_index(&self, table_idx: usize, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.column_names
            .iter()
            .position(|(t, c)| *t == table_idx as i64 && c.to_lowercase() == name)
    }

    fn resolve_foreign_key(
        &self,
        schema: &SchemaInfo,
        table_idx: usize,
        fk: &ForeignKeyInfo,
    ) -> Option<[usize; 2]> {
        let parent_idx = self.table_index(&fk.ref_table)?;
        let child = self.column_index(table_idx, &fk.from_column)?;
        let parent = match &fk.to_column {
            Some(to_column) => self.column_index(parent_idx, to_column)?,
            // Implicit target: the parent key member at the same position
            None => {
                let parent_table = schema.tables.get(parent_idx)?;
                let position = parent_table
                    .columns
                    .iter()
                    .position(|c| c.primary_key as usize == fk.seq + 1)?;
                let offset: usize = schema.tables[..parent_idx]
                    .iter()
                    .map(|t| t.columns.len())
                    .sum();
                1 + offset + position
            }
        };
        Some([child, parent])
    }
}

pub fn write_tables_json(path: &Path, docs: &[TablesMetadata]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string(docs)?;
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn read_tables_json(path: &Path) -> Result<Vec<TablesMetadata>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let docs = serde_json::from_str(&content)
        .with_context(|| format!("parsing tables metadata {}", path.display()))?;
    Ok(docs)
}

pub fn find_db<'a>(docs: &'a [TablesMetadata], db_id: &str) -> Result<&'a TablesMetadata> {
    docs.iter()
        .find(|d| d.db_id == db_id)
        .ok_or_else(|| anyhow::anyhow!("database {} not found in tables metadata", db_id))
}
