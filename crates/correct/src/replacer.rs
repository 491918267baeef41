use tracing::{debug, warn};

use kg::Entity;

use crate::corrector::CorrectionRecord;

/// One pending substitution: rewrite `span` of the source text with `text`.
#[derive(Debug, Clone)]
struct ReplaceOp {
    start: usize,
    end: usize,
    text: String,
    /// Confidence of the originating triple, used for conflict resolution.
    confidence: f32,
    /// Position of the originating record, used to break confidence ties.
    seq: usize,
}

/// Splice corrected facts back into the original text.
///
/// Only the mention spans of entity components that actually changed are
/// rewritten; everything else is copied byte-for-byte. A corrected relation
/// has no mention anchor in the source and is reported on the record only.
pub fn replace(original_output: &str, records: &[CorrectionRecord]) -> String {
    let ops = collect_ops(original_output, records);
    let ops = resolve_conflicts(ops);
    splice(original_output, ops)
}

fn collect_ops(text: &str, records: &[CorrectionRecord]) -> Vec<ReplaceOp> {
    let mut ops = Vec::new();

    for (seq, record) in records.iter().enumerate() {
        let Some(corrected) = &record.corrected else {
            continue;
        };

        component_ops(text, &record.triple.head, &corrected.head, record.triple.confidence, seq, &mut ops);
        component_ops(text, &record.triple.tail, &corrected.tail, record.triple.confidence, seq, &mut ops);
    }

    ops
}

/// Emit one op per mention of `original` when the corrected surface differs.
/// All mentions are rewritten: after coreference resolution they all refer
/// to the same, now-corrected entity.
fn component_ops(
    text: &str,
    original: &Entity,
    corrected: &Entity,
    confidence: f32,
    seq: usize,
    ops: &mut Vec<ReplaceOp>,
) {
    if original.text == corrected.text {
        return;
    }

    for span in &original.mentions {
        if span.slice(text).is_none() {
            warn!(
                start = span.start,
                end = span.end,
                "skipping mention span that does not address the source text"
            );
            continue;
        }
        ops.push(ReplaceOp {
            start: span.start,
            end: span.end,
            text: corrected.text.clone(),
            confidence,
            seq,
        });
    }
}

/// Sort ops by offset and drop overlaps deterministically: the op from the
/// higher-confidence triple wins, ties keep the first-seen record.
fn resolve_conflicts(mut ops: Vec<ReplaceOp>) -> Vec<ReplaceOp> {
    ops.sort_by(|a, b| a.start.cmp(&b.start).then(a.seq.cmp(&b.seq)));

    let mut kept: Vec<ReplaceOp> = Vec::new();
    for op in ops {
        match kept.last() {
            Some(prev) if op.start < prev.end => {
                if op.confidence > prev.confidence {
                    debug!(
                        start = op.start,
                        "overlapping spans, keeping higher-confidence correction"
                    );
                    kept.pop();
                    kept.push(op);
                }
                // equal or lower confidence: first-seen op stays
            }
            _ => kept.push(op),
        }
    }

    kept
}

/// Single left-to-right pass over the byte offsets. No re-scanning of
/// already-substituted text, so a replacement can never match inside
/// another replacement.
fn splice(text: &str, ops: Vec<ReplaceOp>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for op in ops {
        out.push_str(&text[cursor..op.start]);
        out.push_str(&op.text);
        cursor = op.end;
    }
    out.push_str(&text[cursor..]);

    out
}
