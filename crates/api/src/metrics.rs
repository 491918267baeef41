use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,
    cache_hits: AtomicUsize,

    // Timing (in microseconds)
    total_run_time_us: AtomicU64,

    // Pipeline counts
    total_triples: AtomicUsize,
    total_hallucinations: AtomicUsize,
    total_corrections: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            total_run_time_us: AtomicU64::new(0),
            total_triples: AtomicUsize::new(0),
            total_hallucinations: AtomicUsize::new(0),
            total_corrections: AtomicUsize::new(0),
        })
    }

    pub fn record_cache_hit(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run(
        &self,
        duration: std::time::Duration,
        triples: usize,
        hallucinations: usize,
        corrections: usize,
    ) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
        self.total_run_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_triples.fetch_add(triples, Ordering::Relaxed);
        self.total_hallucinations
            .fetch_add(hallucinations, Ordering::Relaxed);
        self.total_corrections
            .fetch_add(corrections, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let successes = self.successful_requests.load(Ordering::Relaxed);
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let run_count = successes.saturating_sub(hits);
        let total_us = self.total_run_time_us.load(Ordering::Relaxed) as f64;

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: successes,
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            cache_hits: hits,
            avg_run_time_ms: if run_count > 0 {
                total_us / run_count as f64 / 1000.0
            } else {
                0.0
            },
            total_triples: self.total_triples.load(Ordering::Relaxed),
            total_hallucinations: self.total_hallucinations.load(Ordering::Relaxed),
            total_corrections: self.total_corrections.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub cache_hits: usize,
    pub avg_run_time_ms: f64,
    pub total_triples: usize,
    pub total_hallucinations: usize,
    pub total_corrections: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_snapshot_counts() {
        let metrics = Metrics::new();
        metrics.record_run(Duration::from_millis(10), 5, 2, 1);
        metrics.record_cache_hit();
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.successful_requests, 2);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.total_triples, 5);
        assert_eq!(snapshot.total_hallucinations, 2);
        assert_eq!(snapshot.total_corrections, 1);
        assert!(snapshot.avg_run_time_ms > 0.0);
    }
}
