//! Global atomic counters for benchsum observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a pass).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations and no locking.
pub struct Metrics {
    records_read: AtomicU64,
    cohorts_written: AtomicU64,
    cohorts_failed: AtomicU64,
    diagnostics_emitted: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            records_read: AtomicU64::new(0),
            cohorts_written: AtomicU64::new(0),
            cohorts_failed: AtomicU64::new(0),
            diagnostics_emitted: AtomicU64::new(0),
        }
    }

    /// Increment the records-read counter by one.
    pub fn inc_records_read(&self) {
        self.records_read.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "records_read", "counter incremented");
    }

    /// Increment the cohorts-written counter by one.
    pub fn inc_cohorts_written(&self) {
        self.cohorts_written.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cohorts_written", "counter incremented");
    }

    /// Increment the cohorts-failed counter by one.
    pub fn inc_cohorts_failed(&self) {
        self.cohorts_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cohorts_failed", "counter incremented");
    }

    /// Add `n` to the diagnostics-emitted counter.
    pub fn add_diagnostics(&self, n: u64) {
        self.diagnostics_emitted.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "diagnostics_emitted", by = n, "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a pass) rather than on every
    /// increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            records_read = self.records_read(),
            cohorts_written = self.cohorts_written(),
            cohorts_failed = self.cohorts_failed(),
            diagnostics_emitted = self.diagnostics_emitted(),
        );
    }

    pub fn records_read(&self) -> u64 {
        self.records_read.load(Ordering::Relaxed)
    }

    pub fn cohorts_written(&self) -> u64 {
        self.cohorts_written.load(Ordering::Relaxed)
    }

    pub fn cohorts_failed(&self) -> u64 {
        self.cohorts_failed.load(Ordering::Relaxed)
    }

    pub fn diagnostics_emitted(&self) -> u64 {
        self.diagnostics_emitted.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.records_read.store(0, Ordering::Relaxed);
        self.cohorts_written.store(0, Ordering::Relaxed);
        self.cohorts_failed.store(0, Ordering::Relaxed);
        self.diagnostics_emitted.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.records_read(), 0);
        m.inc_records_read();
        m.inc_records_read();
        assert_eq!(m.records_read(), 2);

        m.inc_cohorts_written();
        assert_eq!(m.cohorts_written(), 1);

        m.inc_cohorts_failed();
        assert_eq!(m.cohorts_failed(), 1);

        m.add_diagnostics(3);
        assert_eq!(m.diagnostics_emitted(), 3);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_records_read();
        m.inc_cohorts_written();
        m.inc_cohorts_failed();
        m.add_diagnostics(2);
        m.reset();
        assert_eq!(m.records_read(), 0);
        assert_eq!(m.cohorts_written(), 0);
        assert_eq!(m.cohorts_failed(), 0);
        assert_eq!(m.diagnostics_emitted(), 0);
    }
}
