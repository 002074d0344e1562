//! Cohort grouping by source identifier.
//!
//! Per-run files are named `<cohort-key>_id<run-token>_summary.json`. All
//! runs sharing a cohort key belong to the same experiment configuration.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Suffix of per-run and aggregated summary files.
pub const SUMMARY_SUFFIX: &str = "_summary.json";

fn run_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<prefix>.+)_id[^_]+_summary\.json$").expect("run file pattern is valid")
    })
}

/// Extract the cohort key from a per-run source identifier.
///
/// Returns `None` when the identifier does not have the per-run shape; such
/// sources belong to no cohort.
pub fn cohort_key(source_id: &str) -> Option<&str> {
    run_file_pattern()
        .captures(source_id)
        .and_then(|caps| caps.name("prefix"))
        .map(|m| m.as_str())
}

/// File name of the aggregated summary for a cohort.
pub fn summary_file_name(cohort_key: &str) -> String {
    format!("{cohort_key}{SUMMARY_SUFFIX}")
}

/// Members of one experiment configuration, ordered by source identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Cohort<T> {
    pub key: String,
    pub members: Vec<T>,
}

impl<T> Cohort<T> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Partition items into cohorts.
///
/// `source_of` yields each item's source identifier. Items whose identifier
/// has no cohort key are dropped. Cohorts come back sorted by key; members
/// are sorted lexicographically by source identifier so first-seen values
/// are reproducible.
pub fn group_by_cohort<T, I, F>(items: I, source_of: F) -> Vec<Cohort<T>>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> &str,
{
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        let Some(key) = cohort_key(source_of(&item)).map(str::to_string) else {
            tracing::trace!(source = %source_of(&item), "not a per-run summary; ignored");
            continue;
        };
        groups.entry(key).or_default().push(item);
    }

    groups
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by(|a, b| source_of(a).cmp(source_of(b)));
            Cohort { key, members }
        })
        .collect()
}
