use std::collections::HashMap;
use tracing::debug;

use crate::backends::{CoreferenceResolver, EntityExtractor, Mention, RelationExtractor, TripleCandidate};
use crate::error::ExtractError;
use crate::schema::{Entity, Span, Triple};

/// Builds a deduplicated triple set from raw text.
///
/// Any backend failure fails the whole construction: consistency checking
/// downstream assumes a complete graph, so partial graphs are never returned.
pub struct GraphBuilder;

impl GraphBuilder {
    pub async fn construct(
        text: &str,
        extractor: &dyn EntityExtractor,
        resolver: &dyn CoreferenceResolver,
        relator: &dyn RelationExtractor,
    ) -> Result<Vec<Triple>, ExtractError> {
        let mentions = extractor.detect(text).await?;
        let clusters = resolver.resolve(text, &mentions).await?;
        let entities = assemble_entities(text, &mentions, &clusters)?;
        let candidates = relator.extract(text, &entities).await?;

        Ok(dedup_candidates(candidates))
    }
}

/// Group mentions into entities by cluster id, in first-seen order.
///
/// The canonical surface form and category come from the cluster's first
/// mention; mentions the resolver left out become singleton entities.
fn assemble_entities(
    text: &str,
    mentions: &[Mention],
    clusters: &HashMap<Span, u32>,
) -> Result<Vec<Entity>, ExtractError> {
    #[derive(PartialEq, Eq, Hash, Clone, Copy)]
    enum Key {
        Cluster(u32),
        Singleton(usize),
    }

    let mut order: Vec<Key> = Vec::new();
    let mut grouped: HashMap<Key, Vec<&Mention>> = HashMap::new();

    for (i, mention) in mentions.iter().enumerate() {
        let key = match clusters.get(&mention.span) {
            Some(&id) => Key::Cluster(id),
            None => Key::Singleton(i),
        };
        if !grouped.contains_key(&key) {
            order.push(key);
        }
        grouped.entry(key).or_default().push(mention);
    }

    let mut entities = Vec::with_capacity(order.len());
    for key in order {
        let group = &grouped[&key];
        let first = group[0];
        let surface = first.span.slice(text).ok_or_else(|| {
            ExtractError::Response(format!(
                "mention span {}..{} is outside the source text",
                first.span.start, first.span.end
            ))
        })?;

        let spans = group.iter().map(|m| m.span).collect();
        entities.push(Entity::new(
            surface.to_string(),
            first.category.clone(),
            spans,
        ));
    }

    Ok(entities)
}

/// Collapse candidates with identical (head, folded relation, tail) identity,
/// keeping first-seen order and the maximum confidence. Self-relations and
/// empty relations are dropped.
fn dedup_candidates(candidates: Vec<TripleCandidate>) -> Vec<Triple> {
    let mut triples: Vec<Triple> = Vec::new();
    let mut seen: HashMap<(String, String, String), usize> = HashMap::new();

    for candidate in candidates {
        if candidate.relation.trim().is_empty() {
            debug!("dropping candidate with empty relation");
            continue;
        }
        if candidate.head.id == candidate.tail.id || candidate.head.text == candidate.tail.text {
            debug!(entity = %candidate.head.text, "dropping self-relation");
            continue;
        }

        let triple = Triple {
            head: candidate.head,
            relation: candidate.relation,
            tail: candidate.tail,
            confidence: candidate.confidence.clamp(0.0, 1.0),
        };

        match seen.get(&triple.identity()) {
            Some(&idx) => {
                if triple.confidence > triples[idx].confidence {
                    triples[idx].confidence = triple.confidence;
                }
            }
            None => {
                seen.insert(triple.identity(), triples.len());
                triples.push(triple);
            }
        }
    }

    triples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Span;
    use async_trait::async_trait;

    fn entity(text: &str, mentions: Vec<Span>) -> Entity {
        Entity::new(text.to_string(), "UNKNOWN".to_string(), mentions)
    }

    fn candidate(head: &Entity, relation: &str, tail: &Entity, confidence: f32) -> TripleCandidate {
        TripleCandidate {
            head: head.clone(),
            relation: relation.to_string(),
            tail: tail.clone(),
            confidence,
        }
    }

    #[test]
    fn test_dedup_keeps_max_confidence_and_first_seen_order() {
        let a = entity("Paris", vec![Span::new(0, 5)]);
        let b = entity("France", vec![Span::new(10, 16)]);
        let c = entity("Seine", vec![Span::new(20, 25)]);

        let triples = dedup_candidates(vec![
            candidate(&a, "capital_of", &b, 0.6),
            candidate(&c, "flows through", &a, 0.9),
            candidate(&a, "Capital_Of", &b, 0.8),
        ]);

        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0].head.text, "Paris");
        assert_eq!(triples[0].relation, "capital_of");
        assert!((triples[0].confidence - 0.8).abs() < f32::EPSILON);
        assert_eq!(triples[1].head.text, "Seine");
    }

    #[test]
    fn test_self_relations_dropped() {
        let a = entity("Paris", vec![Span::new(0, 5)]);
        let triples = dedup_candidates(vec![candidate(&a, "is", &a, 1.0)]);
        assert!(triples.is_empty());
    }

    #[test]
    fn test_confidence_clamped() {
        let a = entity("Paris", vec![Span::new(0, 5)]);
        let b = entity("France", vec![Span::new(10, 16)]);
        let triples = dedup_candidates(vec![candidate(&a, "capital_of", &b, 3.0)]);
        assert!((triples[0].confidence - 1.0).abs() < f32::EPSILON);
    }

    struct FailingExtractor;

    #[async_trait]
    impl crate::backends::EntityExtractor for FailingExtractor {
        async fn detect(&self, _text: &str) -> Result<Vec<Mention>, ExtractError> {
            Err(ExtractError::Backend(anyhow::anyhow!("NER service down")))
        }
    }

    struct NoopResolver;

    #[async_trait]
    impl CoreferenceResolver for NoopResolver {
        async fn resolve(
            &self,
            _text: &str,
            _mentions: &[Mention],
        ) -> Result<HashMap<Span, u32>, ExtractError> {
            Ok(HashMap::new())
        }
    }

    struct NoopRelator;

    #[async_trait]
    impl RelationExtractor for NoopRelator {
        async fn extract(
            &self,
            _text: &str,
            _entities: &[Entity],
        ) -> Result<Vec<TripleCandidate>, ExtractError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_backend_failure_aborts_construction() {
        let result = GraphBuilder::construct(
            "Paris is the capital of France.",
            &FailingExtractor,
            &NoopResolver,
            &NoopRelator,
        )
        .await;

        assert!(matches!(result, Err(ExtractError::Backend(_))));
    }

    #[test]
    fn test_singleton_mentions_become_entities() {
        let text = "Paris and Lyon";
        let mentions = vec![
            Mention {
                span: Span::new(0, 5),
                category: "LOCATION".to_string(),
            },
            Mention {
                span: Span::new(10, 14),
                category: "LOCATION".to_string(),
            },
        ];

        let entities = assemble_entities(text, &mentions, &HashMap::new()).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].text, "Paris");
        assert_eq!(entities[1].text, "Lyon");
    }

    #[test]
    fn test_clustered_mentions_share_an_entity() {
        let text = "Paris is big. Paris is old.";
        let spans = [Span::new(0, 5), Span::new(14, 19)];
        let mentions: Vec<Mention> = spans
            .iter()
            .map(|&span| Mention {
                span,
                category: "LOCATION".to_string(),
            })
            .collect();

        let clusters: HashMap<Span, u32> = spans.iter().map(|&s| (s, 0)).collect();
        let entities = assemble_entities(text, &mentions, &clusters).unwrap();

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Paris");
        assert_eq!(entities[0].mentions, spans.to_vec());
    }

    #[test]
    fn test_out_of_bounds_mention_is_an_error() {
        let mentions = vec![Mention {
            span: Span::new(0, 50),
            category: "UNKNOWN".to_string(),
        }];
        let result = assemble_entities("short", &mentions, &HashMap::new());
        assert!(matches!(result, Err(ExtractError::Response(_))));
    }
}
