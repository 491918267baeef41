pub mod result;

pub use result::PipelineResult;

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use correct::{CorrectionRecord, Corrector, replace};
use kg::{
    CompletionClient, CoreferenceResolver, EntityExtractor, ExtractError, GraphBuilder,
    RelationExtractor, Triple,
};
use nli::{ConsistencyDetector, JudgmentStatus, NliModel};

/// Pipeline-level knobs. Backend configuration (endpoints, credentials,
/// model names) belongs to whoever constructs the collaborators.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum neutral probability at which an unsupported triple is
    /// treated as hallucinated (inclusive).
    pub neutral_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            neutral_threshold: 0.5,
        }
    }
}

/// Only knowledge-graph construction aborts a run; judgment and correction
/// failures degrade per-triple and surface on the result instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("knowledge graph construction failed: {0}")]
    Extraction(#[from] ExtractError),
}

/// The full evaluation-and-repair sequence: construct a knowledge graph
/// from the LLM output, judge each triple against the context, correct the
/// flagged ones and splice the fixes back into the text.
pub struct Pipeline {
    extractor: Arc<dyn EntityExtractor>,
    resolver: Arc<dyn CoreferenceResolver>,
    relator: Arc<dyn RelationExtractor>,
    nli: Arc<dyn NliModel>,
    detector: ConsistencyDetector,
    corrector: Corrector,
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn EntityExtractor>,
        resolver: Arc<dyn CoreferenceResolver>,
        relator: Arc<dyn RelationExtractor>,
        nli: Arc<dyn NliModel>,
        llm: Arc<dyn CompletionClient>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extractor,
            resolver,
            relator,
            nli,
            detector: ConsistencyDetector::new(config.neutral_threshold),
            corrector: Corrector::new(llm),
        }
    }

    /// Construct the knowledge graph only, without judging it.
    pub async fn construct(&self, text: &str) -> Result<Vec<Triple>, ExtractError> {
        GraphBuilder::construct(text, &*self.extractor, &*self.resolver, &*self.relator).await
    }

    pub async fn run(&self, llm_output: &str, context: &str) -> Result<PipelineResult, PipelineError> {
        let triples = self.construct(llm_output).await?;
        info!(triples = triples.len(), "constructed knowledge graph");

        let judgments = self.detector.detect(&triples, context, &*self.nli).await;

        let flagged: Vec<CorrectionRecord> = judgments
            .iter()
            .filter_map(|j| match &j.status {
                JudgmentStatus::Judged {
                    judgment,
                    hallucinated: true,
                } => Some(CorrectionRecord::flagged(j.triple.clone(), judgment.clone())),
                _ => None,
            })
            .collect();

        let (hallucinated, corrected_output) = if flagged.is_empty() {
            (Vec::new(), llm_output.to_string())
        } else {
            info!(flagged = flagged.len(), "correcting hallucinated triples");
            let records = self.corrector.correct(flagged, context).await;
            let output = replace(llm_output, &records);
            (records, output)
        };

        Ok(PipelineResult {
            original_output: llm_output.to_string(),
            context: context.to_string(),
            triples,
            judgments,
            hallucinated,
            corrected_output,
        })
    }
}
