use serde::{Deserialize, Serialize};

use crate::model::NliError;

/// The three-way NLI outcome for a premise/hypothesis pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NliLabel {
    Entailment,
    Contradiction,
    Neutral,
}

impl NliLabel {
    /// Map a backend label string to the canonical label, case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, NliError> {
        match raw.trim().to_lowercase().as_str() {
            "entailment" => Ok(Self::Entailment),
            "contradiction" => Ok(Self::Contradiction),
            "neutral" => Ok(Self::Neutral),
            other => Err(NliError::Response(format!("unexpected NLI label: {}", other))),
        }
    }
}

impl std::fmt::Display for NliLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entailment => write!(f, "entailment"),
            Self::Contradiction => write!(f, "contradiction"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Per-label probabilities; the three values sum to ~1.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NliScores {
    pub entailment: f32,
    pub contradiction: f32,
    pub neutral: f32,
}

impl NliScores {
    /// All mass on one label; used by backends that only return a label.
    pub fn one_hot(label: NliLabel) -> Self {
        let mut scores = Self::default();
        match label {
            NliLabel::Entailment => scores.entailment = 1.0,
            NliLabel::Contradiction => scores.contradiction = 1.0,
            NliLabel::Neutral => scores.neutral = 1.0,
        }
        scores
    }

    pub fn sum(&self) -> f32 {
        self.entailment + self.contradiction + self.neutral
    }

    /// Highest-probability label; ties resolve in entailment,
    /// contradiction, neutral order.
    pub fn top_label(&self) -> NliLabel {
        let mut best = (NliLabel::Entailment, self.entailment);
        if self.contradiction > best.1 {
            best = (NliLabel::Contradiction, self.contradiction);
        }
        if self.neutral > best.1 {
            best = (NliLabel::Neutral, self.neutral);
        }
        best.0
    }
}

/// One NLI verdict: the winning label plus the full score distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NliJudgment {
    pub label: NliLabel,
    pub scores: NliScores,
}

impl NliJudgment {
    pub fn from_scores(scores: NliScores) -> Self {
        Self {
            label: scores.top_label(),
            scores,
        }
    }
}
