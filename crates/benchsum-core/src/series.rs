//! Plot-ready series built from aggregated summaries.
//!
//! Summary files are named `model_<model>_size<entries>_merge<merge>_summary.json`.
//! Two views are produced for the chart renderer:
//!
//! - **merge-1**: one chart per metric over summaries with `merge == 1`;
//!   x is the size, one line per model.
//! - **merge-compare**: per size, one chart per metric; x is the merge
//!   size, one line per model that has at least two merge variants.
//!
//! Rendering itself is not done here.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::cost::compute_cost_usd;
use crate::domain::{FieldValue, ResultRecord, Result};
use crate::pass::{list_json_files, validate_data_dir};
use crate::pricing::PriceTable;
use crate::reconcile::RUN_COUNT_FIELD;

pub const INPUT_TOKENS_FIELD: &str = "avg_input_tokens";
pub const OUTPUT_TOKENS_FIELD: &str = "avg_output_tokens";
pub const MODEL_NAME_FIELD: &str = "model name";
pub const COST_FIELD: &str = "avg_cost_usd";

/// Metric name to value, sorted by name.
pub type MetricSet = BTreeMap<String, f64>;

fn summary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^model_(?P<model>.+)_size(?P<size>\d+)_merge(?P<merge>\d+)_summary\.json$")
            .expect("summary pattern is valid")
    })
}

/// Experiment configuration decoded from a summary file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SummaryKey {
    pub model: String,
    pub size: u64,
    pub merge: u64,
}

impl SummaryKey {
    /// Decode `model_<model>_size<n>_merge<m>_summary.json`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = summary_pattern().captures(file_name)?;
        Some(Self {
            model: caps["model"].to_string(),
            size: caps["size"].parse().ok()?,
            merge: caps["merge"].parse().ok()?,
        })
    }
}

/// One summary's metrics, keyed by its configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPoint {
    pub key: SummaryKey,
    pub metrics: MetricSet,
}

/// Numeric fields of a summary, minus the run count, plus the derived cost.
///
/// The cost is added when either token field is present and the summary
/// does not already carry one. It is priced by the `model name` field when
/// that is a non-empty string, otherwise by `fallback_model`.
pub fn extract_metrics(record: &ResultRecord, fallback_model: &str, prices: &PriceTable) -> MetricSet {
    let mut metrics: MetricSet = record
        .fields()
        .filter(|(name, _)| *name != RUN_COUNT_FIELD)
        .filter_map(|(name, value)| value.as_finite_number().map(|v| (name.to_string(), v)))
        .collect();

    let input = metrics.get(INPUT_TOKENS_FIELD).copied();
    let output = metrics.get(OUTPUT_TOKENS_FIELD).copied();
    if (input.is_some() || output.is_some()) && !metrics.contains_key(COST_FIELD) {
        let model = record
            .get(MODEL_NAME_FIELD)
            .and_then(FieldValue::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(fallback_model);
        let cost = compute_cost_usd(prices, model, input, output);
        metrics.insert(COST_FIELD.to_string(), cost);
    }

    metrics
}

/// Load every parseable summary in `dir`.
///
/// Unreadable or malformed summaries are reported to `sink` and skipped.
/// Summaries without any metric are dropped. Results are sorted by key.
pub fn load_summaries<W: Write>(
    dir: &Path,
    prices: &PriceTable,
    sink: &mut W,
) -> Result<Vec<SummaryPoint>> {
    validate_data_dir(dir)?;

    let mut points = Vec::new();
    for file in list_json_files(dir)? {
        let Some(key) = SummaryKey::parse(&file.name) else {
            if summary_pattern().is_match(&file.name) {
                writeln!(sink, "Skipping {}: size or merge out of range", file.name)?;
                tracing::warn!(
                    event = "summary.skipped",
                    file = %file.name,
                    "size or merge out of range"
                );
            }
            continue;
        };
        let record = match ResultRecord::read(&file.path) {
            Ok(record) => record,
            Err(err) => {
                writeln!(sink, "Skipping {}: {err}", file.name)?;
                tracing::warn!(event = "summary.skipped", file = %file.name, error = %err);
                continue;
            }
        };
        let metrics = extract_metrics(&record, &key.model, prices);
        if metrics.is_empty() {
            continue;
        }
        points.push(SummaryPoint { key, metrics });
    }

    points.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(points)
}

/// A single (x, y) sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: u64,
    pub y: f64,
}

/// One line of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<Point>,
}

/// All lines for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricChart {
    pub metric: String,
    pub series: Vec<Series>,
}

/// Merge-compare charts for one entry count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeComparison {
    pub size: u64,
    pub charts: Vec<MetricChart>,
}

fn metric_names<'a>(sets: impl Iterator<Item = &'a MetricSet>) -> BTreeSet<&'a str> {
    sets.flat_map(|m| m.keys().map(String::as_str)).collect()
}

fn points_for(metric: &str, by_x: &BTreeMap<u64, &MetricSet>) -> Vec<Point> {
    by_x.iter()
        .filter_map(|(x, metrics)| metrics.get(metric).map(|y| Point { x: *x, y: *y }))
        .collect()
}

/// Line label for a model token: path separators become `_` and any run
/// suffix is cut off.
fn merge1_label(model: &str) -> String {
    let label = model.replace('/', "_");
    match label.find("_id") {
        Some(idx) => label[..idx].to_string(),
        None => label,
    }
}

/// Charts over summaries with merge size 1: x = size, one line per model.
pub fn merge1_charts(summaries: &[SummaryPoint]) -> Vec<MetricChart> {
    let mut by_model: BTreeMap<&str, BTreeMap<u64, &MetricSet>> = BTreeMap::new();
    for point in summaries.iter().filter(|p| p.key.merge == 1) {
        by_model
            .entry(point.key.model.as_str())
            .or_default()
            .insert(point.key.size, &point.metrics);
    }

    let names = metric_names(by_model.values().flat_map(|sizes| sizes.values().copied()));
    names
        .into_iter()
        .map(|metric| MetricChart {
            metric: metric.to_string(),
            series: by_model
                .iter()
                .filter_map(|(model, sizes)| {
                    let points = points_for(metric, sizes);
                    (!points.is_empty()).then(|| Series {
                        label: merge1_label(model),
                        points,
                    })
                })
                .collect(),
        })
        .collect()
}

/// Charts comparing merge sizes at a fixed entry count.
///
/// A size is included only when some model has two or more merge variants.
/// A line needs at least two points; charts without lines are left out.
pub fn merge_compare_charts(summaries: &[SummaryPoint]) -> Vec<SizeComparison> {
    let mut by_size: BTreeMap<u64, BTreeMap<&str, BTreeMap<u64, &MetricSet>>> = BTreeMap::new();
    for point in summaries {
        by_size
            .entry(point.key.size)
            .or_default()
            .entry(point.key.model.as_str())
            .or_default()
            .insert(point.key.merge, &point.metrics);
    }

    let names = metric_names(summaries.iter().map(|p| &p.metrics));

    by_size
        .iter()
        .filter(|(_, models)| models.values().any(|merges| merges.len() >= 2))
        .map(|(size, models)| SizeComparison {
            size: *size,
            charts: names
                .iter()
                .filter_map(|metric| {
                    let series: Vec<Series> = models
                        .iter()
                        .filter_map(|(model, merges)| {
                            let points = points_for(metric, merges);
                            (points.len() >= 2).then(|| Series {
                                label: model.replace('/', "_"),
                                points,
                            })
                        })
                        .collect();
                    (!series.is_empty()).then(|| MetricChart {
                        metric: metric.to_string(),
                        series,
                    })
                })
                .collect(),
        })
        .collect()
}
