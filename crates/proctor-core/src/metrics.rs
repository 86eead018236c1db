//! Process-wide atomic counters.
//!
//! Incremented silently at the call site; [`Metrics::flush`] logs current
//! values as one `tracing::info!` event (the controller flushes on `stop()`).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    ticks_sampled: AtomicU64,
    ticks_skipped: AtomicU64,
    detector_failures: AtomicU64,
    violations_emitted: AtomicU64,
    persist_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            ticks_sampled: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            detector_failures: AtomicU64::new(0),
            violations_emitted: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_ticks_sampled(&self) {
        self.ticks_sampled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_ticks_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "ticks_skipped", "counter incremented");
    }

    pub fn inc_detector_failures(&self) {
        self.detector_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "detector_failures", "counter incremented");
    }

    pub fn inc_violations(&self) {
        self.violations_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_persist_failures(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "persist_failures", "counter incremented");
    }

    /// Emit all current values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            ticks_sampled = self.ticks_sampled(),
            ticks_skipped = self.ticks_skipped(),
            detector_failures = self.detector_failures(),
            violations_emitted = self.violations_emitted(),
            persist_failures = self.persist_failures(),
        );
    }

    pub fn ticks_sampled(&self) -> u64 {
        self.ticks_sampled.load(Ordering::Relaxed)
    }

    pub fn ticks_skipped(&self) -> u64 {
        self.ticks_skipped.load(Ordering::Relaxed)
    }

    pub fn detector_failures(&self) -> u64 {
        self.detector_failures.load(Ordering::Relaxed)
    }

    pub fn violations_emitted(&self) -> u64 {
        self.violations_emitted.load(Ordering::Relaxed)
    }

    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.ticks_sampled.store(0, Ordering::Relaxed);
        self.ticks_skipped.store(0, Ordering::Relaxed);
        self.detector_failures.store(0, Ordering::Relaxed);
        self.violations_emitted.store(0, Ordering::Relaxed);
        self.persist_failures.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_independently() {
        let m = Metrics::new();
        m.inc_ticks_sampled();
        m.inc_ticks_sampled();
        m.inc_ticks_skipped();
        m.inc_violations();
        m.inc_violations();
        m.inc_violations();
        assert_eq!(m.ticks_sampled(), 2);
        assert_eq!(m.ticks_skipped(), 1);
        assert_eq!(m.violations_emitted(), 3);
        assert_eq!(m.detector_failures(), 0);
        assert_eq!(m.persist_failures(), 0);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_detector_failures();
        m.inc_persist_failures();
        m.reset();
        assert_eq!(m.detector_failures(), 0);
        assert_eq!(m.persist_failures(), 0);
    }
}
