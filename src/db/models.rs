use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    // 1-based position inside the primary key, 0 when not part of it
    pub primary_key: u32,
}

impl ColumnInfo {
    pub fn is_primary_key(&self) -> bool {
        self.primary_key > 0
    }
}

/// A foreign key as declared in the catalog of the owning table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    // 0-based position of this column inside a multi-column key
    pub seq: usize,
    pub ref_table: String,
    pub from_column: String,
    // None when the declaration targets the parent's implicit primary key
    pub to_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

/// Introspected schema of one database, tables in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub tables: Vec<TableInfo>,
}

impl SchemaInfo {
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}
