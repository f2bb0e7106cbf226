use std::collections::BTreeMap;
use crate::models::TablesMetadata;

/// Lower-cased view of one database's tables and columns, as consumed by SQL parsers.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: BTreeMap<String, Vec<String>>,
    id_map: BTreeMap<String, String>,
}

impl Schema {
    pub fn from_metadata(metadata: &TablesMetadata) -> Self {
        let mut tables: BTreeMap<String, Vec<String>> = metadata
            .table_names_original
            .iter()
            .map(|t| (t.to_lowercase(), Vec::new()))
            .collect();

        for (table_idx, column) in &metadata.column_names_original {
            if *table_idx < 0 {
                continue;
            }
            if let Some(table) = metadata.table_names_original.get(*table_idx as usize) {
                tables
                    .entry(table.to_lowercase())
                    .or_default()
                    .push(column.to_lowercase());
            }
        }

        let mut id_map = BTreeMap::new();
        id_map.insert("*".to_string(), "__all__".to_string());
        for (table, columns) in &tables {
            for column in columns {
                let key = format!("{}.{}", table, column);
                id_map.insert(key.clone(), format!("__{}__", key));
            }
            id_map.insert(table.clone(), format!("__{}__", table));
        }

        Self { tables, id_map }
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(&table.to_lowercase())
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        let column = column.to_lowercase();
        self.columns(table)
            .map(|cols| cols.iter().any(|c| *c == column))
            .unwrap_or(false)
    }

    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables.get(&table.to_lowercase()).map(|c| c.as_slice())
    }

    /// Identifier of a table (`t`), a column (`t.c`) or the wildcard (`*`).
    pub fn id(&self, name: &str) -> Option<&str> {
        self.id_map.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|s| s.as_str())
    }
}
