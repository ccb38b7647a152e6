//! Per-process runtime context.
//!
//! Holds the start time and processing counters that would otherwise be
//! process-wide mutable globals; owned by the engine and passed where needed.

use std::time::Instant;

use tracing::info;

/// How many processed cycles between metric log lines.
const METRICS_LOG_EVERY: u64 = 10;

#[derive(Debug)]
pub struct XappContext {
    start_time: Instant,
    processed_cycles: u64,
    latencies: Vec<f64>,
}

impl XappContext {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            processed_cycles: 0,
            latencies: Vec::new(),
        }
    }

    /// Record one fired processing cycle and its latency in seconds.
    pub fn record_cycle(&mut self, latency_secs: f64) {
        self.processed_cycles += 1;
        self.latencies.push(latency_secs);
    }

    pub fn processed_cycles(&self) -> u64 {
        self.processed_cycles
    }

    /// Processed cycles per second since startup.
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.processed_cycles as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Mean per-cycle latency in seconds, 0 before the first cycle.
    pub fn average_latency(&self) -> f64 {
        if self.latencies.is_empty() {
            return 0.0;
        }
        self.latencies.iter().sum::<f64>() / self.latencies.len() as f64
    }

    /// Whether this cycle is one of the periodic metric log points.
    pub fn should_log_metrics(&self) -> bool {
        self.processed_cycles > 0 && self.processed_cycles % METRICS_LOG_EVERY == 0
    }

    pub fn log_metrics(&self) {
        info!(
            processed_cycles = self.processed_cycles,
            throughput = format!("{:.2}", self.throughput()),
            average_latency_secs = format!("{:.4}", self.average_latency()),
            "xApp processing metrics"
        );
    }
}

impl Default for XappContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_latency_before_first_cycle() {
        let context = XappContext::new();
        assert_eq!(context.average_latency(), 0.0);
        assert_eq!(context.processed_cycles(), 0);
    }

    #[test]
    fn test_record_cycle_accumulates() {
        let mut context = XappContext::new();
        context.record_cycle(0.2);
        context.record_cycle(0.4);
        assert_eq!(context.processed_cycles(), 2);
        assert!((context.average_latency() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_logged_every_tenth_cycle() {
        let mut context = XappContext::new();
        for _ in 0..9 {
            context.record_cycle(0.1);
            assert!(!context.should_log_metrics());
        }
        context.record_cycle(0.1);
        assert!(context.should_log_metrics());
    }
}
