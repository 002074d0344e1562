use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::Result;
use crate::pass::{CohortOutcome, PassOutcome};

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// One cohort's line in the pass report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CohortReportArtifact {
    pub cohort_key: String,
    pub status: String,
    pub runs: usize,
    pub output: Option<String>,
    pub diagnostics: Vec<String>,
    pub error: Option<String>,
}

/// Totals section of the pass report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassSummaryArtifact {
    pub cohorts: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Machine-readable record of one aggregation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub data_dir: String,
    pub summary_dir: String,
    pub summary: PassSummaryArtifact,
    pub cohorts: Vec<CohortReportArtifact>,
}

impl From<&CohortOutcome> for CohortReportArtifact {
    fn from(outcome: &CohortOutcome) -> Self {
        match outcome {
            CohortOutcome::Written {
                cohort_key,
                output,
                runs,
                diagnostics,
            } => Self {
                cohort_key: cohort_key.clone(),
                status: "written".to_string(),
                runs: *runs,
                output: output
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned()),
                diagnostics: diagnostics.iter().map(ToString::to_string).collect(),
                error: None,
            },
            CohortOutcome::Skipped { cohort_key, runs } => Self {
                cohort_key: cohort_key.clone(),
                status: "skipped".to_string(),
                runs: *runs,
                output: None,
                diagnostics: Vec::new(),
                error: None,
            },
            CohortOutcome::Failed {
                cohort_key,
                runs,
                error,
            } => Self {
                cohort_key: cohort_key.clone(),
                status: "failed".to_string(),
                runs: *runs,
                output: None,
                diagnostics: Vec::new(),
                error: Some(error.clone()),
            },
        }
    }
}

impl PassReportArtifact {
    /// Build a report stamped with the current time.
    pub fn generate(data_dir: &Path, summary_dir: &Path, outcome: &PassOutcome) -> Self {
        Self::from_outcome(data_dir, summary_dir, outcome, Utc::now())
    }

    pub fn from_outcome(
        data_dir: &Path,
        summary_dir: &Path,
        outcome: &PassOutcome,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at,
            data_dir: data_dir.display().to_string(),
            summary_dir: summary_dir.display().to_string(),
            summary: PassSummaryArtifact {
                cohorts: outcome.cohorts.len(),
                written: outcome.written(),
                skipped: outcome.skipped(),
                failed: outcome.failed(),
            },
            cohorts: outcome.cohorts.iter().map(Into::into).collect(),
        }
    }
}

/// Write the pass report as pretty JSON, creating the parent directory.
pub fn write_pass_report_json(path: &Path, artifact: &PassReportArtifact) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut content = serde_json::to_string_pretty(artifact)?;
    content.push('\n');
    std::fs::write(path, content)?;
    Ok(())
}
