use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::backends::{
    CompletionClient, CoreferenceResolver, EntityExtractor, Mention, RelationExtractor,
    TripleCandidate,
};
use crate::error::ExtractError;
use crate::llm::complete_json_with_retry;
use crate::normalizer::EntityNormalizer;
use crate::prompt;
use crate::schema::{Entity, Span, fold_relation};

/// Proper-noun mention detection: maximal runs of capitalized words.
///
/// A deliberately small baseline backend; swap in an NER model client for
/// anything beyond demos and tests.
pub struct HeuristicEntityExtractor {
    pattern: Regex,
}

impl HeuristicEntityExtractor {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"[A-Z][A-Za-z0-9'-]*(?: [A-Z][A-Za-z0-9'-]*)*").unwrap(),
        }
    }
}

impl Default for HeuristicEntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityExtractor for HeuristicEntityExtractor {
    async fn detect(&self, text: &str) -> Result<Vec<Mention>, ExtractError> {
        let mentions = self
            .pattern
            .find_iter(text)
            .map(|m| Mention {
                span: Span::new(m.start(), m.end()),
                category: "UNKNOWN".to_string(),
            })
            .collect();

        Ok(mentions)
    }
}

/// Coreference by surface-form aliasing: mentions whose folded surfaces
/// alias to the same canonical key land in the same cluster.
pub struct AliasCorefResolver;

impl AliasCorefResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AliasCorefResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoreferenceResolver for AliasCorefResolver {
    async fn resolve(
        &self,
        text: &str,
        mentions: &[Mention],
    ) -> Result<HashMap<Span, u32>, ExtractError> {
        let mut normalizer = EntityNormalizer::new();
        let mut cluster_ids: HashMap<String, u32> = HashMap::new();
        let mut resolved = HashMap::new();

        for mention in mentions {
            let surface = mention.span.slice(text).ok_or_else(|| {
                ExtractError::Response(format!(
                    "mention span {}..{} is outside the source text",
                    mention.span.start, mention.span.end
                ))
            })?;

            let key = normalizer.normalize(surface);
            let next_id = cluster_ids.len() as u32;
            let id = *cluster_ids.entry(key).or_insert(next_id);
            resolved.insert(mention.span, id);
        }

        Ok(resolved)
    }
}

/// Relation extraction through a completion backend: the model gets the
/// resolved entity list and the text, and returns strict-JSON triples.
pub struct LlmRelationExtractor {
    client: Arc<dyn CompletionClient>,
    max_retries: usize,
}

#[derive(Deserialize)]
struct RelationResponse {
    #[serde(default)]
    triples: Vec<RawTriple>,
}

#[derive(Deserialize)]
struct RawTriple {
    head: String,
    relation: String,
    tail: String,
    #[serde(default = "default_confidence")]
    confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl LlmRelationExtractor {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            max_retries: 3,
        }
    }

    fn parse(
        &self,
        raw: &str,
        entities: &[Entity],
    ) -> Result<Vec<TripleCandidate>, ExtractError> {
        let response: RelationResponse = serde_json::from_str(raw)
            .map_err(|e| ExtractError::Response(format!("invalid relation JSON: {}", e)))?;

        // Entities addressable by folded canonical text
        let mut by_name: HashMap<String, &Entity> = HashMap::new();
        for entity in entities {
            by_name.entry(fold_relation(&entity.text)).or_insert(entity);
        }

        let mut candidates = Vec::new();
        for raw_triple in response.triples {
            let head = by_name.get(fold_relation(&raw_triple.head).as_str());
            let tail = by_name.get(fold_relation(&raw_triple.tail).as_str());

            match (head, tail) {
                (Some(&head), Some(&tail)) => candidates.push(TripleCandidate {
                    head: head.clone(),
                    relation: raw_triple.relation,
                    tail: tail.clone(),
                    confidence: raw_triple.confidence,
                }),
                _ => {
                    warn!(
                        head = %raw_triple.head,
                        tail = %raw_triple.tail,
                        "dropping triple referencing unknown entity"
                    );
                }
            }
        }

        Ok(candidates)
    }
}

#[async_trait]
impl RelationExtractor for LlmRelationExtractor {
    async fn extract(
        &self,
        text: &str,
        entities: &[Entity],
    ) -> Result<Vec<TripleCandidate>, ExtractError> {
        if entities.len() < 2 {
            return Ok(Vec::new());
        }

        let prompt = prompt::build_relation_prompt(text, entities);
        let raw = complete_json_with_retry(&*self.client, &prompt, self.max_retries).await?;

        self.parse(&raw, entities)
    }
}
