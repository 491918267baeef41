use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use kg::Triple;

use crate::judgment::{NliJudgment, NliLabel};
use crate::model::NliModel;

/// Outcome of judging one triple against the context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripleJudgment {
    pub triple: Triple,
    pub status: JudgmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JudgmentStatus {
    Judged {
        judgment: NliJudgment,
        hallucinated: bool,
    },
    /// The NLI backend failed for this triple. Fail-open: the triple is
    /// excluded from the hallucinated set rather than rewritten blind.
    Failed { error: String },
}

impl TripleJudgment {
    pub fn is_hallucinated(&self) -> bool {
        matches!(
            self.status,
            JudgmentStatus::Judged {
                hallucinated: true,
                ..
            }
        )
    }
}

/// Flags triples whose verbalization the context contradicts or fails to
/// support.
pub struct ConsistencyDetector {
    neutral_threshold: f32,
}

impl ConsistencyDetector {
    pub fn new(neutral_threshold: f32) -> Self {
        Self { neutral_threshold }
    }

    /// Judge every triple independently against the context.
    ///
    /// Output order mirrors the input triple order. A backend failure on one
    /// triple is recorded on that triple alone.
    pub async fn detect(
        &self,
        triples: &[Triple],
        context: &str,
        nli: &dyn NliModel,
    ) -> Vec<TripleJudgment> {
        let mut judgments = Vec::with_capacity(triples.len());

        for triple in triples {
            let hypothesis = triple.verbalize();
            let status = match nli.judge(context, &hypothesis).await {
                Ok(judgment) => {
                    let hallucinated = self.is_hallucinated(&judgment);
                    debug!(
                        hypothesis = %hypothesis,
                        label = %judgment.label,
                        hallucinated,
                        "judged triple"
                    );
                    JudgmentStatus::Judged {
                        judgment,
                        hallucinated,
                    }
                }
                Err(e) => {
                    warn!(hypothesis = %hypothesis, error = %e, "NLI judgment failed, skipping triple");
                    JudgmentStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };

            judgments.push(TripleJudgment {
                triple: triple.clone(),
                status,
            });
        }

        judgments
    }

    /// Decision policy: contradiction is always unsafe; neutral only counts
    /// once the model is confident enough that the fact is unsupported
    /// (inclusive threshold). Entailment is never flagged.
    fn is_hallucinated(&self, judgment: &NliJudgment) -> bool {
        match judgment.label {
            NliLabel::Contradiction => true,
            NliLabel::Neutral => judgment.scores.neutral >= self.neutral_threshold,
            NliLabel::Entailment => false,
        }
    }
}

impl Default for ConsistencyDetector {
    fn default() -> Self {
        Self::new(0.5)
    }
}
