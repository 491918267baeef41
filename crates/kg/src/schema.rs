use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Half-open byte range into one source text (start < end, 0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Slice the source text this span points into.
    ///
    /// Returns None when the span is empty, out of bounds, or lands off a
    /// char boundary, so callers never panic on offsets from a misbehaving
    /// extraction backend.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.is_empty() || self.end > text.len() {
            return None;
        }
        text.get(self.start..self.end)
    }
}

/// An entity resolved from one or more mentions in the source text.
///
/// `text` is the canonical surface form; `mentions` holds every span that
/// coreference resolution assigned to this entity. The id is stable within
/// a single pipeline run only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub text: String,
    pub category: String,
    pub mentions: Vec<Span>,
}

impl Entity {
    pub fn new(text: String, category: String, mentions: Vec<Span>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            category,
            mentions,
        }
    }
}

/// A (head, relation, tail) fact with extraction confidence in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Triple {
    pub head: Entity,
    pub relation: String,
    pub tail: Entity,
    pub confidence: f32,
}

impl Triple {
    /// Deduplication identity: canonical surfaces plus the folded relation.
    pub fn identity(&self) -> (String, String, String) {
        (
            self.head.text.clone(),
            fold_relation(&self.relation),
            self.tail.text.clone(),
        )
    }

    /// Render the triple as a hypothesis sentence for NLI, relation verbatim.
    pub fn verbalize(&self) -> String {
        format!("{} {} {}.", self.head.text, self.relation, self.tail.text)
    }
}

/// Case- and whitespace-fold a relation string for identity comparison.
pub fn fold_relation(relation: &str) -> String {
    relation
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_relation() {
        assert_eq!(fold_relation("Capital_Of"), "capital_of");
        assert_eq!(fold_relation("  works   at "), "works at");
    }

    #[test]
    fn test_span_overlap() {
        assert!(Span::new(0, 5).overlaps(&Span::new(4, 8)));
        assert!(!Span::new(0, 5).overlaps(&Span::new(5, 8)));
    }

    #[test]
    fn test_span_slice_bounds() {
        let text = "Paris is nice";
        assert_eq!(Span::new(0, 5).slice(text), Some("Paris"));
        assert_eq!(Span::new(0, 100).slice(text), None);
        assert_eq!(Span::new(3, 3).slice(text), None);
    }

    #[test]
    fn test_verbalize() {
        let t = Triple {
            head: Entity::new("Paris".into(), "LOCATION".into(), vec![]),
            relation: "is the capital of".into(),
            tail: Entity::new("France".into(), "LOCATION".into(), vec![]),
            confidence: 1.0,
        };
        assert_eq!(t.verbalize(), "Paris is the capital of France.");
    }
}
