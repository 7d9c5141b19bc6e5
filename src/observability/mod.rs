//! Observability infrastructure for message construction and delivery.
//!
//! Provides counters and a timer that reports through `tracing`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Email metrics collector.
#[derive(Debug, Default)]
pub struct EmailMetrics {
    /// Messages built successfully.
    pub builds_succeeded: AtomicU64,
    /// Build attempts rejected.
    pub builds_failed: AtomicU64,
    /// Messages handed to the transport successfully.
    pub sends_succeeded: AtomicU64,
    /// Messages the transport failed to deliver.
    pub sends_failed: AtomicU64,
}

impl EmailMetrics {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a build.
    pub fn record_build(&self, success: bool) {
        if success {
            self.builds_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.builds_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records the outcome of a send.
    pub fn record_send(&self, success: bool) {
        if success {
            self.sends_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.sends_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Returns a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            builds_succeeded: self.builds_succeeded.load(Ordering::Relaxed),
            builds_failed: self.builds_failed.load(Ordering::Relaxed),
            sends_succeeded: self.sends_succeeded.load(Ordering::Relaxed),
            sends_failed: self.sends_failed.load(Ordering::Relaxed),
        }
    }

    /// Resets all metrics.
    pub fn reset(&self) {
        self.builds_succeeded.store(0, Ordering::Relaxed);
        self.builds_failed.store(0, Ordering::Relaxed);
        self.sends_succeeded.store(0, Ordering::Relaxed);
        self.sends_failed.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Messages built successfully.
    pub builds_succeeded: u64,
    /// Build attempts rejected.
    pub builds_failed: u64,
    /// Messages handed to the transport successfully.
    pub sends_succeeded: u64,
    /// Messages the transport failed to deliver.
    pub sends_failed: u64,
}

impl MetricsSnapshot {
    /// Returns the send success rate.
    pub fn send_success_rate(&self) -> f64 {
        let total = self.sends_succeeded + self.sends_failed;
        if total == 0 {
            1.0
        } else {
            self.sends_succeeded as f64 / total as f64
        }
    }
}

/// Timer for measuring operation duration.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    /// Creates and starts a new timer.
    pub fn start(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Returns the elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stops the timer and returns the duration.
    pub fn stop(self) -> Duration {
        let elapsed = self.start.elapsed();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            timer = self.name,
            duration_us = elapsed.as_micros() as u64,
            "Timer stopped"
        );

        elapsed
    }

    /// Returns the timer name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = EmailMetrics::new();

        metrics.record_build(true);
        metrics.record_build(false);
        metrics.record_send(true);
        metrics.record_send(true);
        metrics.record_send(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.builds_succeeded, 1);
        assert_eq!(snapshot.builds_failed, 1);
        assert!((snapshot.send_success_rate() - 0.666).abs() < 0.01);

        metrics.reset();
        assert_eq!(metrics.snapshot().sends_succeeded, 0);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start("build");
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(timer.name(), "build");
        let duration = timer.stop();
        assert!(duration >= Duration::from_millis(10));
    }
}
