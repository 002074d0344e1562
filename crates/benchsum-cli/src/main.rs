//! benchsum - experiment summary aggregation CLI
//!
//! ## Commands
//!
//! - `aggregate`: average `*_id<run>_summary.json` files into one summary per cohort
//! - `cost`: resolve a model name against the price table and price token counts
//! - `series`: print plot-ready series built from aggregated summaries

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use benchsum_core::{
    aggregate_directory, estimate_cost, load_summaries, merge1_charts, merge_compare_charts,
    write_pass_report_json, PassReportArtifact, PriceTable,
};

#[derive(Parser)]
#[command(name = "benchsum")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Aggregate per-run benchmark summaries into experiment cohorts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Average numeric fields across *_id*_summary.json files, one output per cohort
    Aggregate {
        /// Directory containing the per-run summary JSON files
        #[arg(long, env = "BENCHSUM_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Directory the aggregated summary JSON files are written to
        #[arg(long, env = "BENCHSUM_SUMMARY_DIR", default_value = "summary")]
        summary_dir: PathBuf,

        /// Optional path for a JSON report of the pass
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Estimate the USD cost of a token count for a model
    Cost {
        /// Model name (free-form, e.g. openai.gpt-4.1-nano)
        #[arg(short, long)]
        model: String,

        /// Input token count
        #[arg(long)]
        input_tokens: Option<f64>,

        /// Output token count
        #[arg(long)]
        output_tokens: Option<f64>,
    },

    /// Print plot-ready series built from aggregated summaries
    Series {
        /// Directory containing model_<model>_size<n>_merge<m>_summary.json files
        #[arg(long, env = "BENCHSUM_SUMMARY_DIR", default_value = "summary")]
        summary_dir: PathBuf,

        /// Which chart set to build
        #[arg(long, value_enum, default_value_t = SeriesView::Merge1)]
        view: SeriesView,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SeriesView {
    /// Metric vs size for merge size 1, one line per model
    Merge1,
    /// Metric vs merge size for each entry count, one line per model
    MergeCompare,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    benchsum_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Aggregate {
            data_dir,
            summary_dir,
            report,
        } => cmd_aggregate(&data_dir, &summary_dir, report.as_deref()),
        Commands::Cost {
            model,
            input_tokens,
            output_tokens,
        } => cmd_cost(&model, input_tokens, output_tokens),
        Commands::Series { summary_dir, view } => cmd_series(&summary_dir, view),
    }
}

/// Aggregate every cohort found in the data directory
fn cmd_aggregate(data_dir: &Path, summary_dir: &Path, report: Option<&Path>) -> Result<()> {
    let data_dir = std::path::absolute(data_dir)
        .with_context(|| format!("Failed to resolve data directory {:?}", data_dir))?;
    let summary_dir = std::path::absolute(summary_dir)
        .with_context(|| format!("Failed to resolve summary directory {:?}", summary_dir))?;

    let stdout = std::io::stdout();
    let mut sink = stdout.lock();
    let outcome = aggregate_directory(&data_dir, &summary_dir, &mut sink)
        .context("Aggregation failed")?;
    sink.flush()?;

    if let Some(path) = report {
        let artifact = PassReportArtifact::generate(&data_dir, &summary_dir, &outcome);
        write_pass_report_json(path, &artifact)
            .with_context(|| format!("Failed to write pass report {:?}", path))?;
        info!("Pass report written to {:?}", path);
    }

    Ok(())
}

/// Price a token count against the built-in price table
fn cmd_cost(model: &str, input_tokens: Option<f64>, output_tokens: Option<f64>) -> Result<()> {
    let table = PriceTable::default();
    let estimate = estimate_cost(&table, model, input_tokens, output_tokens);

    println!("Model:     {}", model);
    match &estimate.price_key {
        Some(key) => println!("Price key: {}", key),
        None => println!("Price key: (unresolved, cost defaults to 0)"),
    }
    println!("Cost USD:  {:.6}", estimate.cost_usd);
    Ok(())
}

/// Print chart series as pretty JSON on stdout
fn cmd_series(summary_dir: &Path, view: SeriesView) -> Result<()> {
    let table = PriceTable::default();
    let mut notices = std::io::stderr();
    let summaries = load_summaries(summary_dir, &table, &mut notices)
        .with_context(|| format!("Failed to load summaries from {:?}", summary_dir))?;

    if summaries.is_empty() {
        eprintln!("No summary files found in {}", summary_dir.display());
        return Ok(());
    }

    let json = match view {
        SeriesView::Merge1 => serde_json::to_string_pretty(&merge1_charts(&summaries))?,
        SeriesView::MergeCompare => {
            serde_json::to_string_pretty(&merge_compare_charts(&summaries))?
        }
    };
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn aggregate_defaults() {
        let cli = Cli::try_parse_from(["benchsum", "aggregate"]).expect("parse");
        match cli.command {
            Commands::Aggregate {
                data_dir,
                summary_dir,
                report,
            } => {
                // Env overrides would change these; the test environment leaves them unset.
                if std::env::var_os("BENCHSUM_DATA_DIR").is_none() {
                    assert_eq!(data_dir, PathBuf::from("data"));
                }
                if std::env::var_os("BENCHSUM_SUMMARY_DIR").is_none() {
                    assert_eq!(summary_dir, PathBuf::from("summary"));
                }
                assert!(report.is_none());
            }
            _ => panic!("expected aggregate command"),
        }
    }

    #[test]
    fn aggregate_missing_data_dir_fails_before_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary_dir = dir.path().join("summary");
        let err = cmd_aggregate(&dir.path().join("missing"), &summary_dir, None).unwrap_err();
        assert!(format!("{:#}", err).contains("does not exist"));
        assert!(!summary_dir.exists());
    }

    #[test]
    fn series_view_parses() {
        let cli = Cli::try_parse_from(["benchsum", "series", "--view", "merge-compare"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Commands::Series {
                view: SeriesView::MergeCompare,
                ..
            }
        ));
    }
}
