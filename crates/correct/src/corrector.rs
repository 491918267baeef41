use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use kg::{CompletionClient, Entity, Triple, fold_relation};
use nli::NliJudgment;

/// A flagged triple together with its judgment and, once correction has
/// run, either a replacement triple or the reason correction failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub triple: Triple,
    pub judgment: NliJudgment,
    pub corrected: Option<Triple>,
    pub error: Option<String>,
}

impl CorrectionRecord {
    pub fn flagged(triple: Triple, judgment: NliJudgment) -> Self {
        Self {
            triple,
            judgment,
            corrected: None,
            error: None,
        }
    }
}

/// Correction failures. Local to one record: the original span is left
/// unchanged in the output and the rest of the batch proceeds.
#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("correction backend failed: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("malformed corrected triple: {0}")]
    Response(String),
}

/// Asks a completion backend to propose a context-consistent replacement
/// for each flagged triple, one independent request per record.
pub struct Corrector {
    client: Arc<dyn CompletionClient>,
}

#[derive(Deserialize)]
struct RawCorrection {
    head: String,
    relation: String,
    tail: String,
}

impl Corrector {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Populate `corrected` on each record where the backend produced a
    /// valid triple; failures are recorded on the record, never raised.
    pub async fn correct(
        &self,
        mut records: Vec<CorrectionRecord>,
        context: &str,
    ) -> Vec<CorrectionRecord> {
        for record in &mut records {
            match self.correct_one(&record.triple, context).await {
                Ok(corrected) => {
                    info!(
                        original = %record.triple.verbalize(),
                        corrected = %corrected.verbalize(),
                        "corrected triple"
                    );
                    record.corrected = Some(corrected);
                }
                Err(e) => {
                    warn!(
                        original = %record.triple.verbalize(),
                        error = %e,
                        "correction failed, leaving original text unchanged"
                    );
                    record.error = Some(e.to_string());
                }
            }
        }

        records
    }

    async fn correct_one(
        &self,
        triple: &Triple,
        context: &str,
    ) -> Result<Triple, CorrectionError> {
        let prompt = build_correction_prompt(triple, context);
        let raw = self.client.complete(&prompt).await?;
        parse_corrected(&raw, triple)
    }
}

fn build_correction_prompt(triple: &Triple, context: &str) -> String {
    format!(
        r#"You are a fact-checking assistant. Given a context paragraph and a possibly incorrect fact expressed as a (head, relation, tail) triple, propose a corrected triple that is consistent with the context.

INSTRUCTIONS:
1. Change only the factual content that the context disagrees with
2. Keep the (head, relation, tail) shape; never merge or drop a component
3. Output ONLY a JSON object with keys: head, relation, tail

CONTEXT:
{}

ORIGINAL TRIPLE:
head: {}
relation: {}
tail: {}

ORIGINAL SENTENCE:
{}

JSON OUTPUT:"#,
        context,
        triple.head.text,
        triple.relation,
        triple.tail.text,
        triple.verbalize()
    )
}

/// Parse the backend response into a triple, enforcing the schema: all
/// three components present and non-empty, head distinct from tail.
/// Corrected entities carry the original categories but no mention spans;
/// replacement anchors at the original triple's mentions.
fn parse_corrected(raw: &str, original: &Triple) -> Result<Triple, CorrectionError> {
    let parsed: RawCorrection = serde_json::from_str(raw)
        .map_err(|e| CorrectionError::Response(format!("invalid correction JSON: {}", e)))?;

    let head_text = parsed.head.trim();
    let relation = parsed.relation.trim();
    let tail_text = parsed.tail.trim();

    if head_text.is_empty() || relation.is_empty() || tail_text.is_empty() {
        return Err(CorrectionError::Response(
            "corrected triple has an empty component".to_string(),
        ));
    }
    if fold_relation(head_text) == fold_relation(tail_text) {
        return Err(CorrectionError::Response(
            "corrected triple relates an entity to itself".to_string(),
        ));
    }

    Ok(Triple {
        head: Entity::new(
            head_text.to_string(),
            original.head.category.clone(),
            Vec::new(),
        ),
        relation: relation.to_string(),
        tail: Entity::new(
            tail_text.to_string(),
            original.tail.category.clone(),
            Vec::new(),
        ),
        confidence: original.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kg::Span;
    use nli::{NliLabel, NliScores};

    fn flagged(head: &str, relation: &str, tail: &str) -> CorrectionRecord {
        let triple = Triple {
            head: Entity::new(head.to_string(), "LOCATION".to_string(), vec![Span::new(0, 5)]),
            relation: relation.to_string(),
            tail: Entity::new(tail.to_string(), "LOCATION".to_string(), vec![Span::new(24, 31)]),
            confidence: 0.9,
        };
        let judgment = NliJudgment {
            label: NliLabel::Contradiction,
            scores: NliScores::one_hot(NliLabel::Contradiction),
        };
        CorrectionRecord::flagged(triple, judgment)
    }

    struct CannedLlm(String);

    #[async_trait]
    impl CompletionClient for CannedLlm {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_correction_populates_record() {
        let corrector = Corrector::new(Arc::new(CannedLlm(
            r#"{"head": "Paris", "relation": "is the capital of", "tail": "France"}"#.to_string(),
        )));

        let records = corrector
            .correct(vec![flagged("Paris", "is the capital of", "Germany")], "ctx")
            .await;

        let corrected = records[0].corrected.as_ref().unwrap();
        assert_eq!(corrected.tail.text, "France");
        assert_eq!(corrected.head.category, "LOCATION");
        assert!(records[0].error.is_none());
        // Confidence carries over from the original extraction
        assert!((corrected.confidence - 0.9).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_empty_component_rejected() {
        let corrector = Corrector::new(Arc::new(CannedLlm(
            r#"{"head": "Paris", "relation": "", "tail": "France"}"#.to_string(),
        )));

        let records = corrector
            .correct(vec![flagged("Paris", "is the capital of", "Germany")], "ctx")
            .await;

        assert!(records[0].corrected.is_none());
        assert!(records[0].error.as_ref().unwrap().contains("empty component"));
    }

    #[tokio::test]
    async fn test_unparseable_response_fails_that_record_only() {
        let corrector = Corrector::new(Arc::new(CannedLlm("sorry, no".to_string())));

        let records = corrector
            .correct(
                vec![
                    flagged("Paris", "is the capital of", "Germany"),
                    flagged("Berlin", "is the capital of", "France"),
                ],
                "ctx",
            )
            .await;

        assert_eq!(records.len(), 2);
        assert!(records[0].corrected.is_none());
        assert!(records[0].error.is_some());
        assert!(records[1].corrected.is_none());
        assert!(records[1].error.is_some());
    }

    #[test]
    fn test_missing_field_is_a_schema_violation() {
        let original = flagged("Paris", "is the capital of", "Germany").triple;
        let result = parse_corrected(r#"{"head": "Paris", "tail": "France"}"#, &original);
        assert!(matches!(result, Err(CorrectionError::Response(_))));
    }

    #[test]
    fn test_self_relation_rejected() {
        let original = flagged("Paris", "is the capital of", "Germany").triple;
        let result = parse_corrected(
            r#"{"head": "Paris", "relation": "is", "tail": "paris"}"#,
            &original,
        );
        assert!(matches!(result, Err(CorrectionError::Response(_))));
    }
}
