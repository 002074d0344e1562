//! Aggregate emitter: persist a cohort summary and report it on the console.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::cohort::summary_file_name;
use crate::domain::Result;
use crate::metrics::METRICS;
use crate::obs;
use crate::reconcile::Reconciliation;

/// What the emitter did with a cohort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitOutcome {
    Written { path: PathBuf, runs: usize },
    /// The aggregate record was empty; nothing was written.
    Skipped,
}

/// Write `<cohort-key>_summary.json` into `summary_dir` and report it to `sink`.
///
/// The directory is created when missing. The file is written to a temporary
/// sibling and renamed into place. Report lines are
/// `Wrote <file> (<n> files averaged)` followed by one indented warning line
/// per diagnostic.
pub fn emit_summary<W: Write>(
    summary_dir: &Path,
    cohort_key: &str,
    reconciliation: &Reconciliation,
    sink: &mut W,
) -> Result<EmitOutcome> {
    let record = &reconciliation.record;
    if record.is_empty() {
        writeln!(sink, "Skipping {cohort_key}: no data to write.")?;
        obs::emit_cohort_skipped(cohort_key);
        return Ok(EmitOutcome::Skipped);
    }

    fs::create_dir_all(summary_dir)?;
    let file_name = summary_file_name(cohort_key);
    let path = summary_dir.join(&file_name);

    let mut content = serde_json::to_string_pretty(record)?;
    content.push('\n');

    let mut tmp = NamedTempFile::new_in(summary_dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(&path).map_err(|e| e.error)?;

    let runs = record.run_count().unwrap_or_default();
    writeln!(sink, "Wrote {file_name} ({runs} files averaged)")?;
    for diagnostic in &reconciliation.diagnostics {
        writeln!(sink, "  warning: {diagnostic}")?;
        obs::emit_cohort_diagnostic(cohort_key, diagnostic.field(), diagnostic);
    }

    METRICS.inc_cohorts_written();
    METRICS.add_diagnostics(reconciliation.diagnostics.len() as u64);
    obs::emit_cohort_written(cohort_key, &path, runs, reconciliation.diagnostics.len());

    Ok(EmitOutcome::Written { path, runs })
}
