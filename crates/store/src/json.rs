use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use kg::{Entity, Triple};

#[derive(Serialize)]
struct KgDocument<'a> {
    entities: Vec<&'a Entity>,
    triples: Vec<TripleRow<'a>>,
}

#[derive(Serialize)]
struct TripleRow<'a> {
    head: &'a str,
    relation: &'a str,
    tail: &'a str,
    confidence: f32,
}

/// Serialize a run's knowledge graph (unique entities plus triples) to a
/// pretty-printed JSON file.
pub async fn save_kg_to_json(triples: &[Triple], path: &Path) -> Result<()> {
    let mut seen = HashSet::new();
    let mut entities = Vec::new();

    for triple in triples {
        for entity in [&triple.head, &triple.tail] {
            if seen.insert(entity.id) {
                entities.push(entity);
            }
        }
    }

    let document = KgDocument {
        entities,
        triples: triples
            .iter()
            .map(|t| TripleRow {
                head: &t.head.text,
                relation: &t.relation,
                tail: &t.tail.text,
                confidence: t.confidence,
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&document)
        .context("Failed to serialize knowledge graph")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kg::Span;

    #[tokio::test]
    async fn test_save_deduplicates_entities() {
        let paris = Entity::new("Paris".into(), "LOCATION".into(), vec![Span::new(0, 5)]);
        let france = Entity::new("France".into(), "LOCATION".into(), vec![Span::new(24, 30)]);
        let seine = Entity::new("Seine".into(), "LOCATION".into(), vec![Span::new(40, 45)]);

        let triples = vec![
            Triple {
                head: paris.clone(),
                relation: "is the capital of".into(),
                tail: france.clone(),
                confidence: 0.9,
            },
            Triple {
                head: seine,
                relation: "flows through".into(),
                tail: paris,
                confidence: 0.8,
            },
        ];

        let dir = std::env::temp_dir().join("graphcheck-json-test");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("kg.json");

        save_kg_to_json(&triples, &path).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();

        // Paris appears in two triples but is stored once
        assert_eq!(value["entities"].as_array().unwrap().len(), 3);
        assert_eq!(value["triples"].as_array().unwrap().len(), 2);
        assert_eq!(value["triples"][0]["tail"], "France");
    }
}
