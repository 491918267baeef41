use dashmap::DashMap;
use pipeline::PipelineResult;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Caches finished pipeline results keyed by a hash of the exact
/// (output, context) pair, so repeated evaluations skip the model backends.
pub struct ResultCache {
    results: Arc<DashMap<String, PipelineResult>>,
    max_entries: usize,
}

impl ResultCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            results: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    pub fn get(&self, output: &str, context: &str) -> Option<PipelineResult> {
        let key = cache_key(output, context);
        self.results.get(&key).map(|r| r.value().clone())
    }

    pub fn set(&self, output: &str, context: &str, result: PipelineResult) {
        if self.results.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self.results
                .iter()
                .take(self.max_entries / 4)
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.results.remove(&key);
            }
        }
        let key = cache_key(output, context);
        self.results.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

fn cache_key(output: &str, context: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(output.as_bytes());
    hasher.update([0x1f]);
    hasher.update(context.as_bytes());
    hex::encode(hasher.finalize())
}
