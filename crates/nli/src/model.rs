use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use kg::CompletionClient;

use crate::judgment::{NliJudgment, NliLabel, NliScores};

/// NLI backend failures. Local to a single triple: the detector records the
/// failure and moves on (fail-open), it never flags or aborts on one.
#[derive(Debug, Error)]
pub enum NliError {
    #[error("NLI backend failed: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("malformed NLI response: {0}")]
    Response(String),
}

/// Judges whether a hypothesis is entailed by, contradicts, or is neutral
/// to a premise.
#[async_trait]
pub trait NliModel: Send + Sync {
    async fn judge(&self, premise: &str, hypothesis: &str) -> Result<NliJudgment, NliError>;

    /// Batch judgment; element-for-element equivalent to repeated `judge`
    /// calls, with failures isolated per pair.
    async fn judge_batch(
        &self,
        pairs: &[(String, String)],
    ) -> Vec<Result<NliJudgment, NliError>> {
        let mut results = Vec::with_capacity(pairs.len());
        for (premise, hypothesis) in pairs {
            results.push(self.judge(premise, hypothesis).await);
        }
        results
    }
}

/// NLI through a completion backend: the model is prompted to return a
/// single JSON label, which becomes a one-hot score distribution.
pub struct LlmNliModel {
    client: Arc<dyn CompletionClient>,
}

#[derive(Deserialize)]
struct LabelResponse {
    label: String,
}

impl LlmNliModel {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    fn build_prompt(premise: &str, hypothesis: &str) -> String {
        format!(
            r#"You are a natural language inference classifier. Decide whether the hypothesis is ENTAILMENT, CONTRADICTION, or NEUTRAL with respect to the premise.

Respond ONLY with a JSON object of the form {{"label": "entailment" | "contradiction" | "neutral"}}.

Premise:
{}

Hypothesis:
{}

JSON OUTPUT:"#,
            premise, hypothesis
        )
    }

    fn parse(raw: &str) -> Result<NliJudgment, NliError> {
        let response: LabelResponse = serde_json::from_str(raw)
            .map_err(|e| NliError::Response(format!("invalid NLI JSON: {}", e)))?;

        let label = NliLabel::parse(&response.label)?;
        Ok(NliJudgment {
            label,
            scores: NliScores::one_hot(label),
        })
    }
}

#[async_trait]
impl NliModel for LlmNliModel {
    async fn judge(&self, premise: &str, hypothesis: &str) -> Result<NliJudgment, NliError> {
        let prompt = Self::build_prompt(premise, hypothesis);
        let raw = self.client.complete(&prompt).await?;
        Self::parse(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedLlm(String);

    #[async_trait]
    impl CompletionClient for CannedLlm {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_llm_nli_parses_label() {
        let model = LlmNliModel::new(Arc::new(CannedLlm(
            r#"{"label": "CONTRADICTION"}"#.to_string(),
        )));

        let judgment = model.judge("premise", "hypothesis").await.unwrap();
        assert_eq!(judgment.label, NliLabel::Contradiction);
        assert!((judgment.scores.contradiction - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_llm_nli_rejects_unknown_label() {
        let model = LlmNliModel::new(Arc::new(CannedLlm(
            r#"{"label": "possibly"}"#.to_string(),
        )));

        let result = model.judge("premise", "hypothesis").await;
        assert!(matches!(result, Err(NliError::Response(_))));
    }

    #[tokio::test]
    async fn test_default_batch_matches_single_calls() {
        let model = LlmNliModel::new(Arc::new(CannedLlm(
            r#"{"label": "neutral"}"#.to_string(),
        )));

        let pairs = vec![
            ("ctx".to_string(), "a.".to_string()),
            ("ctx".to_string(), "b.".to_string()),
        ];
        let batch = model.judge_batch(&pairs).await;
        assert_eq!(batch.len(), 2);
        for result in batch {
            assert_eq!(result.unwrap().label, NliLabel::Neutral);
        }
    }
}
