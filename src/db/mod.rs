mod models;
mod client;

pub use models::{ColumnInfo, ForeignKeyInfo, SchemaInfo, TableInfo};
pub use client::Database;
