//! Per-query pipeline metrics
//!
//! Tracks stage latencies, how many candidates survived filtering, and the
//! spread of setup scores in the final evidence set.

use std::time::{Duration, Instant};

use crate::pipeline::RetrievalCounts;

#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    /// Time spent classifying intent (milliseconds)
    pub intent_latency_ms: u64,

    /// Search plus ranking (milliseconds)
    pub retrieval_latency_ms: u64,

    /// Aggregation plus narrative generation, zero when skipped
    pub lessons_latency_ms: u64,

    /// Candidates returned by nearest-neighbour search
    pub candidates: usize,

    /// Candidates left after filters and the date window
    pub survivors: usize,

    pub evidence_count: usize,

    pub score_min: Option<f64>,
    pub score_max: Option<f64>,
    pub score_median: Option<f64>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_intent_latency(&mut self, duration: Duration) {
        self.intent_latency_ms = duration.as_millis() as u64;
    }

    pub fn set_retrieval_latency(&mut self, duration: Duration) {
        self.retrieval_latency_ms = duration.as_millis() as u64;
    }

    pub fn set_lessons_latency(&mut self, duration: Duration) {
        self.lessons_latency_ms = duration.as_millis() as u64;
    }

    pub fn set_counts(&mut self, counts: RetrievalCounts) {
        self.candidates = counts.candidates;
        self.survivors = counts.survivors;
    }

    /// Record the evidence scores and compute their spread
    pub fn set_scores(&mut self, scores: &[f64]) {
        self.evidence_count = scores.len();

        if scores.is_empty() {
            self.score_min = None;
            self.score_max = None;
            self.score_median = None;
            return;
        }

        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        self.score_min = sorted.first().copied();
        self.score_max = sorted.last().copied();
        self.score_median = Some(percentile(&sorted, 50.0));
    }

    pub fn total_latency_ms(&self) -> u64 {
        self.intent_latency_ms + self.retrieval_latency_ms + self.lessons_latency_ms
    }

    /// Report metrics to tracing logs
    pub fn report(&self) {
        tracing::info!(
            "Pipeline Metrics: intent={}ms, retrieval={}ms, lessons={}ms, total={}ms, candidates={}, survivors={}, evidence={}, score_range=[{:?},{:?}], median={:?}",
            self.intent_latency_ms,
            self.retrieval_latency_ms,
            self.lessons_latency_ms,
            self.total_latency_ms(),
            self.candidates,
            self.survivors,
            self.evidence_count,
            self.score_min,
            self.score_max,
            self.score_median,
        );
    }
}

/// Timer helper for measuring operation latency
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop the timer and return elapsed duration
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

/// Nearest-rank percentile of sorted data
fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let len = sorted_data.len();
    let idx = (p / 100.0 * (len - 1) as f64).round() as usize;
    sorted_data[idx.min(len - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_spread() {
        let mut metrics = PipelineMetrics::new();
        metrics.set_scores(&[3.7, 0.2, 1.4, 2.0, 0.9]);

        assert_eq!(metrics.evidence_count, 5);
        assert_eq!(metrics.score_min, Some(0.2));
        assert_eq!(metrics.score_max, Some(3.7));
        assert_eq!(metrics.score_median, Some(1.4));
    }

    #[test]
    fn test_empty_scores() {
        let mut metrics = PipelineMetrics::new();
        metrics.set_scores(&[]);

        assert_eq!(metrics.evidence_count, 0);
        assert_eq!(metrics.score_min, None);
        assert_eq!(metrics.score_median, None);
    }

    #[test]
    fn test_percentile() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&data, 50.0), 3.0);
        assert_eq!(percentile(&data, 100.0), 5.0);
    }

    #[test]
    fn test_latency_setters() {
        let mut metrics = PipelineMetrics::new();
        metrics.set_intent_latency(Duration::from_millis(40));
        metrics.set_retrieval_latency(Duration::from_millis(60));
        metrics.set_lessons_latency(Duration::from_millis(200));
        metrics.set_counts(RetrievalCounts {
            candidates: 12,
            survivors: 7,
        });

        assert_eq!(metrics.total_latency_ms(), 300);
        assert_eq!(metrics.survivors, 7);
    }

    #[test]
    fn test_timer() {
        let timer = MetricsTimer::start();
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.stop().as_millis() >= 10);
    }
}
