use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use crate::db::{ColumnInfo, ForeignKeyInfo, SchemaInfo, TableInfo};

pub struct Database {
    conn: Connection,
}

// Quote an identifier for use inside a PRAGMA argument
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl Database {
    /// Builds a fresh SQLite file at `db_path` from a DDL/DML script.
    ///
    /// Any file already at `db_path` is removed before anything else. The
    /// script runs as one batch in autocommit mode; if it fails, the
    /// half-built file is removed as well so no stale database survives.
    pub fn materialize(script_path: &Path, db_path: &Path) -> Result<Self> {
        if db_path.exists() {
            debug!("Removing existing database {}", db_path.display());
            fs::remove_file(db_path)
                .with_context(|| format!("removing stale database {}", db_path.display()))?;
        }

        let script = fs::read_to_string(script_path)
            .with_context(|| format!("reading schema script {}", script_path.display()))?;
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("creating database {}", db_path.display()))?;

        if let Err(e) = conn.execute_batch(&script) {
            drop(conn);
            if let Err(rm) = fs::remove_file(db_path) {
                warn!("Could not remove partial database {}: {}", db_path.display(), rm);
            }
            return Err(e).with_context(|| {
                format!("executing schema script {}", script_path.display())
            });
        }

        info!(
            "Materialized {} from {}",
            db_path.display(),
            script_path.display()
        );
        Ok(Database { conn })
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            bail!("database {} does not exist", db_path.display());
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("opening database {}", db_path.display()))?;
        Ok(Database { conn })
    }

    /// Table names as stored in the catalog, engine-internal tables excluded.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tables)
    }

    pub fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let data_type: String = row.get(2)?;
                Ok(ColumnInfo {
                    name: name.to_lowercase(),
                    data_type,
                    primary_key: row.get::<_, i64>(5)? as u32,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("reading columns of table {}", table))?;
        Ok(columns)
    }

    pub fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyInfo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA foreign_key_list({})", quote_ident(table)))?;
        let fkeys = stmt
            .query_map([], |row| {
                Ok(ForeignKeyInfo {
                    seq: row.get::<_, i64>(1)? as usize,
                    ref_table: row.get(2)?,
                    from_column: row.get(3)?,
                    to_column: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("reading foreign keys of table {}", table))?;
        Ok(fkeys)
    }

    pub fn introspect(&self) -> Result<SchemaInfo> {
        let mut tables = Vec::new();
        // SQLite folds only ASCII case, so PRAGMAs get the catalog spelling
        for name in self.list_tables()? {
            let columns = self.table_columns(&name)?;
            let foreign_keys = self.foreign_keys(&name)?;
            debug!(
                "Table {}: {} columns, {} foreign keys",
                name,
                columns.len(),
                foreign_keys.len()
            );
            tables.push(TableInfo {
                name: name.to_lowercase(),
                columns,
                foreign_keys,
            });
        }

        let schema = SchemaInfo { tables };
        info!(
            "Introspected {} tables with {} columns",
            schema.tables.len(),
            schema.column_count()
        );
        Ok(schema)
    }
}
