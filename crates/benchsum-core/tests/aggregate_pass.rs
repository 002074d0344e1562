//! End-to-end aggregation passes over a temporary data directory.

use std::fs;
use std::path::Path;

use benchsum_core::{aggregate_directory, BenchsumError, CohortOutcome, Diagnostic};
use serde_json::{json, Value};

fn write_json(dir: &Path, name: &str, value: Value) {
    fs::write(dir.join(name), value.to_string()).expect("write input");
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read output")).expect("parse output")
}

fn run(data_dir: &Path, summary_dir: &Path) -> (benchsum_core::PassOutcome, String) {
    let mut sink = Vec::new();
    let outcome = aggregate_directory(data_dir, summary_dir, &mut sink).expect("pass");
    (outcome, String::from_utf8(sink).expect("utf8"))
}

#[test]
fn three_runs_average_into_one_summary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("data");
    let summary = dir.path().join("summary");
    fs::create_dir(&data).expect("mkdir");

    for (id, tokens) in [("1", 100), ("2", 200), ("3", 150)] {
        write_json(
            &data,
            &format!("model_nano_size10_merge1_id{id}_summary.json"),
            json!({"avg_input_tokens": tokens, "model name": "openai.gpt-4.1-nano"}),
        );
    }

    let (outcome, report) = run(&data, &summary);

    assert_eq!(outcome.written(), 1);
    let out = summary.join("model_nano_size10_merge1_summary.json");
    let raw = fs::read_to_string(&out).expect("read output");
    assert!(raw.contains("\n  \"avg_input_tokens\": 150.0,"));

    let value = read_json(&out);
    assert_eq!(value["avg_input_tokens"], json!(150.0));
    assert_eq!(value["model name"], json!("openai.gpt-4.1-nano"));
    assert_eq!(value["number of runs"], json!(3));
    assert!(raw.ends_with("  \"number of runs\": 3\n}\n"));

    assert_eq!(
        report,
        "Wrote model_nano_size10_merge1_summary.json (3 files averaged)\n"
    );
}

#[test]
fn mismatched_status_keeps_first_and_warns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = dir.path().join("summary");
    write_json(dir.path(), "exp_id1_summary.json", json!({"status": "ok"}));
    write_json(dir.path(), "exp_id2_summary.json", json!({"status": "retry"}));

    let (outcome, report) = run(dir.path(), &summary);

    let value = read_json(&summary.join("exp_summary.json"));
    assert_eq!(value["status"], json!("ok"));
    assert_eq!(value["number of runs"], json!(2));

    match &outcome.cohorts[0] {
        CohortOutcome::Written { diagnostics, .. } => {
            assert_eq!(
                diagnostics,
                &vec![Diagnostic::InconsistentValue {
                    field: "status".to_string(),
                    source_id: "exp_id2_summary.json".to_string(),
                }]
            );
        }
        other => panic!("expected written cohort, got {other:?}"),
    }
    assert!(report.contains(
        "  warning: Inconsistent non-numeric value for 'status' in exp_id2_summary.json"
    ));
}

#[test]
fn partial_coverage_averages_available_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = dir.path().join("summary");
    write_json(dir.path(), "lat_id1_summary.json", json!({"latency_ms": 10, "n": 1}));
    write_json(dir.path(), "lat_id2_summary.json", json!({"latency_ms": 20, "n": 1}));
    write_json(dir.path(), "lat_id3_summary.json", json!({"n": 1}));

    let (_, report) = run(dir.path(), &summary);

    let value = read_json(&summary.join("lat_summary.json"));
    assert_eq!(value["latency_ms"], json!(15.0));
    assert_eq!(value["n"], json!(1.0));
    assert!(report.contains("'latency_ms' appears in 2/3 files"));
}

#[test]
fn empty_directory_reports_and_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = dir.path().join("summary");
    fs::write(dir.path().join("notes.json"), "{}").expect("write");

    let (outcome, report) = run(dir.path(), &summary);

    assert!(outcome.cohorts.is_empty());
    assert!(report.starts_with("No matching summary files found in"));
    assert!(!summary.exists());
}

#[test]
fn missing_data_dir_is_a_configuration_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = dir.path().join("summary");
    let mut sink = Vec::new();

    let err = aggregate_directory(&dir.path().join("absent"), &summary, &mut sink).unwrap_err();

    assert!(matches!(err, BenchsumError::MissingDataDir(_)));
    assert!(err.is_configuration());
    assert!(sink.is_empty());
    assert!(!summary.exists());
}

#[test]
fn malformed_member_fails_only_its_cohort() {
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = dir.path().join("summary");
    write_json(dir.path(), "bad_id1_summary.json", json!({"v": 1}));
    fs::write(dir.path().join("bad_id2_summary.json"), "{not json").expect("write");
    write_json(dir.path(), "good_id1_summary.json", json!({"v": 2}));

    let (outcome, report) = run(dir.path(), &summary);

    assert_eq!(outcome.failed(), 1);
    assert_eq!(outcome.written(), 1);
    assert_eq!(outcome.cohorts[0].cohort_key(), "bad");
    assert!(outcome.cohorts[0].is_failed());
    assert!(report.starts_with("Skipping bad: "));
    assert!(!summary.join("bad_summary.json").exists());
    assert_eq!(read_json(&summary.join("good_summary.json"))["v"], json!(2.0));
}

#[test]
fn non_matching_names_are_not_grouped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = dir.path().join("summary");
    write_json(dir.path(), "run_id7_summary.json", json!({"v": 1}));
    write_json(dir.path(), "run_summary.json", json!({"v": 100}));
    write_json(dir.path(), "run_id8_results.json", json!({"v": 100}));

    let (outcome, _) = run(dir.path(), &summary);

    assert_eq!(outcome.cohorts.len(), 1);
    let value = read_json(&summary.join("run_summary.json"));
    assert_eq!(value["v"], json!(1.0));
    assert_eq!(value["number of runs"], json!(1));
}

#[test]
fn user_run_count_field_is_replaced() {
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = dir.path().join("summary");
    write_json(
        dir.path(),
        "c_id1_summary.json",
        json!({"number of runs": 99, "score": 0.5}),
    );
    write_json(
        dir.path(),
        "c_id2_summary.json",
        json!({"number of runs": 99, "score": 1.5}),
    );

    run(dir.path(), &summary);

    let raw = fs::read_to_string(summary.join("c_summary.json")).expect("read output");
    assert_eq!(raw, "{\n  \"score\": 1.0,\n  \"number of runs\": 2\n}\n");
}

#[test]
fn cohorts_are_processed_in_key_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = dir.path().join("summary");
    for key in ["zeta", "alpha", "mid"] {
        write_json(dir.path(), &format!("{key}_id1_summary.json"), json!({"v": 1}));
    }

    let (outcome, report) = run(dir.path(), &summary);

    let keys: Vec<&str> = outcome.cohorts.iter().map(|c| c.cohort_key()).collect();
    assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
    let first_line = report.lines().next().expect("line");
    assert_eq!(first_line, "Wrote alpha_summary.json (1 files averaged)");
}

#[test]
fn bare_nan_member_is_not_malformed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = dir.path().join("summary");
    fs::write(dir.path().join("k_id1_summary.json"), r#"{"ratio": NaN, "v": 1}"#)
        .expect("write");
    fs::write(dir.path().join("k_id2_summary.json"), r#"{"ratio": 0.5, "v": 3}"#)
        .expect("write");

    let (outcome, report) = run(dir.path(), &summary);

    assert_eq!(outcome.written(), 1);
    assert_eq!(outcome.failed(), 0);
    let value = read_json(&summary.join("k_summary.json"));
    assert_eq!(value["ratio"], json!(0.5));
    assert_eq!(value["v"], json!(2.0));
    assert_eq!(value["number of runs"], json!(2));
    assert!(report.contains("'ratio' appears in 1/2 files"));
}

#[test]
fn all_infinite_field_is_kept_as_representative() {
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = dir.path().join("summary");
    fs::write(dir.path().join("k_id1_summary.json"), r#"{"peak": Infinity}"#).expect("write");
    fs::write(dir.path().join("k_id2_summary.json"), r#"{"peak": -Infinity}"#).expect("write");

    let (outcome, report) = run(dir.path(), &summary);

    assert_eq!(outcome.written(), 1);
    assert!(report.contains("Inconsistent non-numeric value for 'peak' in k_id2_summary.json"));
    let raw = fs::read_to_string(summary.join("k_summary.json")).expect("read output");
    assert_eq!(raw, "{\n  \"peak\": null,\n  \"number of runs\": 2\n}\n");
}
