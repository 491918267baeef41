use serde::{Deserialize, Serialize};

use correct::CorrectionRecord;
use kg::Triple;
use nli::TripleJudgment;

/// Everything one pipeline run produced. Immutable once returned; each run
/// builds its own result, so concurrent runs never share state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub original_output: String,
    pub context: String,
    /// The deduplicated knowledge graph, in extraction order.
    pub triples: Vec<Triple>,
    /// Per-triple judgment status, including fail-open NLI failures.
    pub judgments: Vec<TripleJudgment>,
    /// Records for the triples judged hallucinated, with correction outcome.
    pub hallucinated: Vec<CorrectionRecord>,
    pub corrected_output: String,
}

impl PipelineResult {
    /// The replacement triples that were successfully produced.
    pub fn corrected_triples(&self) -> Vec<&Triple> {
        self.hallucinated
            .iter()
            .filter_map(|r| r.corrected.as_ref())
            .collect()
    }

    pub fn hallucination_count(&self) -> usize {
        self.hallucinated.len()
    }
}
