use anyhow::{bail, Context, Result};
use sqlparser::ast::{ObjectName, Query, Visit, Visitor};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use serde_json::json;
use std::collections::BTreeSet;
use std::ops::ControlFlow;
use crate::enrich::SqlParser;
use crate::models::Schema;

/// Parses queries with `sqlparser` and emits the statement AST as JSON,
/// next to the schema identifiers of the tables it reads.
///
/// Every relation named by the query, apart from its own CTEs, must exist
/// in the schema.
#[derive(Debug, Default)]
pub struct AstSqlParser;

#[derive(Default)]
struct RelationCollector {
    relations: BTreeSet<String>,
    ctes: BTreeSet<String>,
}

impl Visitor for RelationCollector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.ctes.insert(cte.alias.name.value.to_lowercase());
            }
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<Self::Break> {
        if let Some(ident) = relation.0.last() {
            self.relations.insert(ident.value.to_lowercase());
        }
        ControlFlow::Continue(())
    }
}

impl SqlParser for AstSqlParser {
    fn parse(&self, schema: &Schema, sql: &str) -> Result<serde_json::Value> {
        let mut statements = Parser::parse_sql(&SQLiteDialect {}, sql)?;
        if statements.len() != 1 {
            bail!("expected exactly one statement, found {}", statements.len());
        }
        let statement = statements.remove(0);

        let mut collector = RelationCollector::default();
        let _ = statement.visit(&mut collector);

        let mut table_units = Vec::new();
        for relation in collector.relations.difference(&collector.ctes) {
            match schema.id(relation) {
                Some(id) if schema.has_table(relation) => table_units.push(id.to_string()),
                _ => bail!(
                    "unknown table {} (known: {})",
                    relation,
                    schema.table_names().collect::<Vec<_>>().join(", ")
                ),
            }
        }

        Ok(json!({
            "table_units": table_units,
            "ast": serde_json::to_value(&statement).context("serializing statement")?,
        }))
    }
}
