//! Field reconciliation: merge the records of one cohort into a single
//! [`AggregateRecord`].
//!
//! Numeric occurrences are averaged over the records that carry them.
//! Non-numeric occurrences keep the first value seen and report later
//! mismatches as [`Diagnostic`]s. Classification is per occurrence, so a
//! field that is a number in one run and a string in another is both
//! averaged and consistency-checked; the average is what gets emitted.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::{FieldValue, ResultRecord};

/// Synthetic field carrying the cohort size.
pub const RUN_COUNT_FIELD: &str = "number of runs";

/// Value of one field in an aggregated summary.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateValue {
    /// Average over the finite numeric occurrences.
    Mean(f64),
    /// First non-numeric value seen in cohort order.
    Representative(FieldValue),
    /// Number of runs in the cohort.
    RunCount(usize),
}

impl Serialize for AggregateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Mean(v) => serializer.serialize_f64(*v),
            Self::Representative(v) => v.serialize(serializer),
            Self::RunCount(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

/// The merged summary of a cohort. Serializes as a flat JSON object in
/// first-seen field order with the run count last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateRecord {
    fields: Vec<(String, AggregateValue)>,
}

impl AggregateRecord {
    pub fn get(&self, name: &str) -> Option<&AggregateValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &AggregateValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn run_count(&self) -> Option<usize> {
        match self.get(RUN_COUNT_FIELD) {
            Some(AggregateValue::RunCount(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for AggregateRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A non-fatal data-quality finding from reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A non-numeric value differs from the first one seen.
    InconsistentValue { field: String, source_id: String },
    /// A numeric field is missing from some runs.
    PartialCoverage {
        field: String,
        present: usize,
        total: usize,
    },
    /// A numeric field ended with no finite values and was dropped.
    NoFiniteValues { field: String },
}

impl Diagnostic {
    pub fn field(&self) -> &str {
        match self {
            Self::InconsistentValue { field, .. }
            | Self::PartialCoverage { field, .. }
            | Self::NoFiniteValues { field } => field,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InconsistentValue { field, source_id } => write!(
                f,
                "Inconsistent non-numeric value for '{field}' in {source_id}; using first encountered."
            ),
            Self::PartialCoverage {
                field,
                present,
                total,
            } => write!(
                f,
                "Key '{field}' appears in {present}/{total} files; averaged over available values."
            ),
            Self::NoFiniteValues { field } => write!(
                f,
                "Numeric key '{field}' has no finite values; dropped from summary."
            ),
        }
    }
}

/// Output of reconciling one cohort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub record: AggregateRecord,
    pub diagnostics: Vec<Diagnostic>,
}

/// Sum and running mean of the finite occurrences of one field.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    mean: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        // Scaled before subtracting so it stays finite where `sum` overflows.
        let n = self.count as f64;
        self.mean += value / n - self.mean / n;
    }

    /// `sum / count`, or the running mean once the sum has overflowed.
    fn average(&self) -> f64 {
        let exact = self.sum / self.count as f64;
        if exact.is_finite() {
            exact
        } else {
            self.mean
        }
    }
}

/// Running state for one cohort. Build one per cohort, feed it every record
/// in cohort order, then [`finish`](Self::finish) it.
#[derive(Debug, Default)]
pub struct ReconcileContext {
    field_order: Vec<String>,
    seen: HashSet<String>,
    numeric: HashMap<String, Accumulator>,
    first_values: HashMap<String, FieldValue>,
    diagnostics: Vec<Diagnostic>,
    records: usize,
}

impl ReconcileContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the running state.
    pub fn observe(&mut self, record: &ResultRecord) {
        self.records += 1;

        for (name, value) in record.fields() {
            // The run count is synthesized; a user field of that name is ignored.
            if name == RUN_COUNT_FIELD {
                continue;
            }
            if self.seen.insert(name.to_string()) {
                self.field_order.push(name.to_string());
            }

            if let Some(n) = value.as_finite_number() {
                self.numeric.entry(name.to_string()).or_default().push(n);
                continue;
            }

            match self.first_values.get(name) {
                Some(first) if !first.same_value(value) => {
                    self.diagnostics.push(Diagnostic::InconsistentValue {
                        field: name.to_string(),
                        source_id: record.source_id().to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    self.first_values.insert(name.to_string(), value.clone());
                }
            }
        }
    }

    /// Produce the aggregate record and the collected diagnostics.
    ///
    /// A context that observed no records yields an empty record.
    pub fn finish(mut self) -> Reconciliation {
        if self.records == 0 {
            return Reconciliation::default();
        }

        let total = self.records;
        let mut fields = Vec::with_capacity(self.field_order.len() + 1);

        for name in std::mem::take(&mut self.field_order) {
            if let Some(acc) = self.numeric.get(&name) {
                if acc.count == 0 {
                    self.diagnostics
                        .push(Diagnostic::NoFiniteValues { field: name.clone() });
                    continue;
                }
                if acc.count != total {
                    self.diagnostics.push(Diagnostic::PartialCoverage {
                        field: name.clone(),
                        present: acc.count,
                        total,
                    });
                }
                fields.push((name, AggregateValue::Mean(acc.average())));
            } else if let Some(first) = self.first_values.remove(&name) {
                fields.push((name, AggregateValue::Representative(first)));
            }
        }

        fields.push((RUN_COUNT_FIELD.to_string(), AggregateValue::RunCount(total)));

        tracing::debug!(
            records = total,
            fields = fields.len(),
            diagnostics = self.diagnostics.len(),
            "cohort reconciled"
        );

        Reconciliation {
            record: AggregateRecord { fields },
            diagnostics: self.diagnostics,
        }
    }
}

/// Reconcile a cohort's records, given in cohort order.
pub fn reconcile<'a, I>(records: I) -> Reconciliation
where
    I: IntoIterator<Item = &'a ResultRecord>,
{
    let mut ctx = ReconcileContext::new();
    for record in records {
        ctx.observe(record);
    }
    ctx.finish()
}
