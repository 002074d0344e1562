//! Structured observability hooks for aggregation passes.
//!
//! This module provides:
//! - Cohort-scoped tracing spans via the `CohortSpan` RAII guard
//! - Emission functions for pass and cohort lifecycle events
//!
//! Events are emitted at `info!` level (warnings at `warn!`). Filtering follows
//! `RUST_LOG`; JSON output is selected by the CLI `--json` flag.

use std::path::Path;

use tracing::{info, warn};

/// RAII guard that enters a cohort-scoped span while the cohort is processed.
///
/// # Example
///
/// ```ignore
/// let _span = CohortSpan::enter("model_gpt-4o_size1_merge1");
/// // every event below carries cohort = "model_gpt-4o_size1_merge1"
/// ```
pub struct CohortSpan {
    _span: tracing::span::EnteredSpan,
}

impl CohortSpan {
    /// Create and enter a span tagged with the cohort key.
    pub fn enter(cohort_key: &str) -> Self {
        let span = tracing::info_span!("benchsum.cohort", cohort = %cohort_key);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: aggregation pass started.
pub fn emit_pass_started(data_dir: &Path, summary_dir: &Path, cohorts: usize) {
    info!(
        event = "pass.started",
        data_dir = %data_dir.display(),
        summary_dir = %summary_dir.display(),
        cohorts = cohorts,
    );
}

/// Emit event: aggregation pass finished.
pub fn emit_pass_finished(written: usize, skipped: usize, failed: usize) {
    info!(
        event = "pass.finished",
        written = written,
        skipped = skipped,
        failed = failed,
    );
}

/// Emit event: a cohort summary was written.
pub fn emit_cohort_written(cohort_key: &str, output: &Path, runs: usize, diagnostics: usize) {
    info!(
        event = "cohort.written",
        cohort = %cohort_key,
        output = %output.display(),
        runs = runs,
        diagnostics = diagnostics,
    );
}

/// Emit event: a cohort produced nothing to write.
pub fn emit_cohort_skipped(cohort_key: &str) {
    info!(event = "cohort.skipped", cohort = %cohort_key);
}

/// Emit event: a reconciliation diagnostic (warning level).
pub fn emit_cohort_diagnostic(cohort_key: &str, field: &str, message: &dyn std::fmt::Display) {
    warn!(event = "cohort.diagnostic", cohort = %cohort_key, field = %field, message = %message);
}

/// Emit event: a cohort failed to aggregate (warning level).
pub fn emit_cohort_failed(cohort_key: &str, error: &dyn std::fmt::Display) {
    warn!(event = "cohort.failed", cohort = %cohort_key, error = %error);
}
