//! Directory-level aggregation pass.
//!
//! Validates the input location, groups the per-run files into cohorts and
//! runs reconcile + emit for each cohort in key order. A cohort with an
//! unreadable or malformed member fails on its own; the others still run.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cohort::{group_by_cohort, Cohort};
use crate::domain::{BenchsumError, ResultRecord, Result};
use crate::emit::{emit_summary, EmitOutcome};
use crate::metrics::METRICS;
use crate::obs::{self, CohortSpan};
use crate::reconcile::{reconcile, Diagnostic};

/// A candidate input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub path: PathBuf,
}

/// What happened to one cohort during a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CohortOutcome {
    Written {
        cohort_key: String,
        output: PathBuf,
        runs: usize,
        diagnostics: Vec<Diagnostic>,
    },
    Skipped {
        cohort_key: String,
        runs: usize,
    },
    Failed {
        cohort_key: String,
        runs: usize,
        error: String,
    },
}

impl CohortOutcome {
    pub fn cohort_key(&self) -> &str {
        match self {
            Self::Written { cohort_key, .. }
            | Self::Skipped { cohort_key, .. }
            | Self::Failed { cohort_key, .. } => cohort_key,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Result of a full aggregation pass, in cohort-key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassOutcome {
    pub cohorts: Vec<CohortOutcome>,
}

impl PassOutcome {
    pub fn written(&self) -> usize {
        self.count(|c| matches!(c, CohortOutcome::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|c| matches!(c, CohortOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(CohortOutcome::is_failed)
    }

    fn count(&self, pred: impl Fn(&CohortOutcome) -> bool) -> usize {
        self.cohorts.iter().filter(|c| pred(c)).count()
    }
}

/// Check that `data_dir` exists and is a directory.
pub fn validate_data_dir(data_dir: &Path) -> Result<()> {
    if !data_dir.exists() {
        return Err(BenchsumError::MissingDataDir(data_dir.to_path_buf()));
    }
    if !data_dir.is_dir() {
        return Err(BenchsumError::NotADirectory(data_dir.to_path_buf()));
    }
    Ok(())
}

/// List the `*.json` files directly under `dir`.
pub fn list_json_files(dir: &Path) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            tracing::debug!(path = %path.display(), "skipping non UTF-8 file name");
            continue;
        };
        files.push(SourceFile { name, path });
    }
    Ok(files)
}

/// Load every member of a cohort; the first failure fails the cohort.
fn load_cohort(cohort: &Cohort<SourceFile>) -> Result<Vec<ResultRecord>> {
    cohort
        .members
        .iter()
        .map(|file| {
            let record = ResultRecord::read(&file.path)?;
            METRICS.inc_records_read();
            Ok(record)
        })
        .collect()
}

/// Aggregate every cohort found in `data_dir` into `summary_dir`.
///
/// Console report lines go to `sink`. Configuration errors are returned
/// before anything is written; per-cohort failures are reported and
/// recorded in the returned [`PassOutcome`]. Counters are flushed on every
/// exit, including errors.
pub fn aggregate_directory<W: Write>(
    data_dir: &Path,
    summary_dir: &Path,
    sink: &mut W,
) -> Result<PassOutcome> {
    let result = run_pass(data_dir, summary_dir, sink);
    METRICS.flush();
    result
}

fn run_pass<W: Write>(data_dir: &Path, summary_dir: &Path, sink: &mut W) -> Result<PassOutcome> {
    validate_data_dir(data_dir)?;

    let cohorts = group_by_cohort(list_json_files(data_dir)?, |f| f.name.as_str());
    obs::emit_pass_started(data_dir, summary_dir, cohorts.len());

    if cohorts.is_empty() {
        writeln!(
            sink,
            "No matching summary files found in {}",
            data_dir.display()
        )?;
        obs::emit_pass_finished(0, 0, 0);
        return Ok(PassOutcome::default());
    }

    let mut outcome = PassOutcome::default();
    for cohort in &cohorts {
        let _span = CohortSpan::enter(&cohort.key);
        let runs = cohort.len();

        let records = match load_cohort(cohort) {
            Ok(records) => records,
            Err(err) => {
                writeln!(sink, "Skipping {}: {err}", cohort.key)?;
                obs::emit_cohort_failed(&cohort.key, &err);
                METRICS.inc_cohorts_failed();
                outcome.cohorts.push(CohortOutcome::Failed {
                    cohort_key: cohort.key.clone(),
                    runs,
                    error: err.to_string(),
                });
                continue;
            }
        };

        let reconciliation = reconcile(&records);
        let entry = match emit_summary(summary_dir, &cohort.key, &reconciliation, sink)? {
            EmitOutcome::Written { path, runs } => CohortOutcome::Written {
                cohort_key: cohort.key.clone(),
                output: path,
                runs,
                diagnostics: reconciliation.diagnostics,
            },
            EmitOutcome::Skipped => CohortOutcome::Skipped {
                cohort_key: cohort.key.clone(),
                runs,
            },
        };
        outcome.cohorts.push(entry);
    }

    obs::emit_pass_finished(outcome.written(), outcome.skipped(), outcome.failed());
    Ok(outcome)
}
