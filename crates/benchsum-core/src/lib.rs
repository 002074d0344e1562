//! benchsum core library
//!
//! Groups per-run benchmark summaries into experiment cohorts, reconciles
//! each cohort into one averaged summary, and prepares plot-ready series
//! with a derived token cost.

pub mod cohort;
pub mod cost;
pub mod domain;
pub mod emit;
pub mod metrics;
pub mod obs;
pub mod pass;
pub mod pricing;
pub mod reconcile;
pub mod reporting;
pub mod series;
pub mod telemetry;

pub use cohort::{cohort_key, group_by_cohort, summary_file_name, Cohort, SUMMARY_SUFFIX};
pub use cost::{compute_cost_usd, estimate_cost, CostEstimate};
pub use domain::{BenchsumError, FieldValue, Result, ResultRecord};
pub use emit::{emit_summary, EmitOutcome};
pub use pass::{
    aggregate_directory, list_json_files, validate_data_dir, CohortOutcome, PassOutcome,
    SourceFile,
};
pub use pricing::{PriceEntry, PriceTable};
pub use reconcile::{
    reconcile, AggregateRecord, AggregateValue, Diagnostic, ReconcileContext, Reconciliation,
    RUN_COUNT_FIELD,
};
pub use reporting::{
    write_pass_report_json, CohortReportArtifact, PassReportArtifact, PassSummaryArtifact,
};
pub use series::{
    extract_metrics, load_summaries, merge1_charts, merge_compare_charts, MetricChart, MetricSet,
    Point, Series, SizeComparison, SummaryKey, SummaryPoint,
};

pub use metrics::METRICS;
pub use obs::{
    emit_cohort_diagnostic, emit_cohort_failed, emit_cohort_skipped, emit_cohort_written,
    emit_pass_finished, emit_pass_started, CohortSpan,
};
pub use telemetry::init_tracing;

/// benchsum version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
