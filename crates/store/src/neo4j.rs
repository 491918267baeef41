use anyhow::{Context, Result};
use neo4rs::{Graph, Query};
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

use kg::{Entity, Triple};

/// Persists one run's knowledge graph into Neo4j as :Entity nodes and
/// :RELATION edges, keyed by canonical entity text.
pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    /// Initialize schema: create indexes
    pub async fn init_schema(&self) -> Result<()> {
        info!("creating Neo4j indexes");

        let query = Query::new(
            "CREATE INDEX entity_text_index IF NOT EXISTS FOR (e:Entity) ON (e.text)".to_string(),
        );
        self.graph.run(query).await
            .context("Failed to create index on Entity.text")?;

        Ok(())
    }

    /// Upsert an entity node (MERGE to avoid duplicates)
    pub async fn store_entity(&self, entity: &Entity) -> Result<()> {
        let query = Query::new(
            r#"
            MERGE (e:Entity {text: $text})
            SET e.category = $category,
                e.mention_count = $mention_count
            "#
            .to_string(),
        )
        .param("text", entity.text.clone())
        .param("category", entity.category.clone())
        .param("mention_count", entity.mentions.len() as i64);

        self.graph.run(query).await
            .context("Failed to store entity")?;

        Ok(())
    }

    /// Upsert one triple as a :RELATION edge between its entities.
    pub async fn store_triple(&self, triple: &Triple) -> Result<()> {
        let query = Query::new(
            r#"
            MATCH (head:Entity {text: $head_text})
            MATCH (tail:Entity {text: $tail_text})
            MERGE (head)-[r:RELATION {name: $relation}]->(tail)
            SET r.confidence = $confidence
            "#
            .to_string(),
        )
        .param("head_text", triple.head.text.clone())
        .param("tail_text", triple.tail.text.clone())
        .param("relation", triple.relation.clone())
        .param("confidence", triple.confidence as f64);

        self.graph.run(query).await
            .context("Failed to store triple")?;

        Ok(())
    }

    /// Persist a whole graph: entities first so every edge has both ends.
    pub async fn store_graph(&self, triples: &[Triple]) -> Result<GraphSummary> {
        let mut seen = HashSet::new();
        let mut entities_written = 0;

        for triple in triples {
            for entity in [&triple.head, &triple.tail] {
                if seen.insert(entity.id) {
                    self.store_entity(entity).await?;
                    entities_written += 1;
                }
            }
        }

        for triple in triples {
            self.store_triple(triple).await?;
        }

        info!(
            entities = entities_written,
            triples = triples.len(),
            "stored knowledge graph"
        );

        Ok(GraphSummary {
            entities_written,
            triples_written: triples.len(),
        })
    }

    /// Get graph statistics
    pub async fn stats(&self) -> Result<GraphStats> {
        let entity_query = Query::new("MATCH (e:Entity) RETURN count(e) as count".to_string());
        let mut result = self.graph.execute(entity_query).await?;
        let entity_count = if let Some(row) = result.next().await? {
            row.get::<i64>("count").unwrap_or(0) as usize
        } else {
            0
        };

        let relation_query =
            Query::new("MATCH ()-[r:RELATION]->() RETURN count(r) as count".to_string());
        let mut result = self.graph.execute(relation_query).await?;
        let relation_count = if let Some(row) = result.next().await? {
            row.get::<i64>("count").unwrap_or(0) as usize
        } else {
            0
        };

        Ok(GraphStats {
            entity_count,
            relation_count,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct GraphSummary {
    pub entities_written: usize,
    pub triples_written: usize,
}

#[derive(Debug, Serialize)]
pub struct GraphStats {
    pub entity_count: usize,
    pub relation_count: usize,
}
