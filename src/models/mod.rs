mod example;
mod schema;
mod tables;

pub use example::{read_json_list, write_json_list, EnrichedExample, GroundTruthExample};
pub use schema::Schema;
pub use tables::{find_db, read_tables_json, write_tables_json, TablesMetadata};
