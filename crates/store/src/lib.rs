pub mod json;
pub mod neo4j;

pub use json::save_kg_to_json;
pub use neo4j::{GraphStats, GraphSummary, Neo4jStore};
