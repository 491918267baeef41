use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ExtractError;
use crate::schema::{Entity, Span};

/// A raw entity mention: where it sits in the text and what kind it looks like.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub span: Span,
    pub category: String,
}

/// A relation candidate as produced by a relation extraction backend,
/// before deduplication and self-relation filtering.
#[derive(Debug, Clone)]
pub struct TripleCandidate {
    pub head: Entity,
    pub relation: String,
    pub tail: Entity,
    pub confidence: f32,
}

/// Detects entity mentions (spans plus category) in raw text.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn detect(&self, text: &str) -> Result<Vec<Mention>, ExtractError>;
}

/// Groups mentions that refer to the same real-world entity.
///
/// Returns a mapping from mention span to cluster id. Mentions absent from
/// the map become their own singleton entity.
#[async_trait]
pub trait CoreferenceResolver: Send + Sync {
    async fn resolve(
        &self,
        text: &str,
        mentions: &[Mention],
    ) -> Result<HashMap<Span, u32>, ExtractError>;
}

/// Extracts relation candidates between already-resolved entities.
#[async_trait]
pub trait RelationExtractor: Send + Sync {
    async fn extract(
        &self,
        text: &str,
        entities: &[Entity],
    ) -> Result<Vec<TripleCandidate>, ExtractError>;
}

/// A text-completion backend (LLM). Used for relation extraction, NLI
/// judgments and triple correction; implementations must be safe to share
/// across concurrent pipeline runs.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}
