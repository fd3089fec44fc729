//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.
//!
//! A run whose cases fail still exits with success: the verdicts are the report. Only a program
//! that cannot be launched (or a suite that cannot start at all) is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::HarnessConfig;
use crate::harness::bench::{BENCH_QUERIES, BenchmarkDriver, DEFAULT_SIZES, GridSize, JsonChartSink, run_benchmark};
use crate::harness::suites::bitmap::run_bitmap_suite;
use crate::harness::suites::records::records_suite;
use crate::harness::{Aggregator, ConsoleReporter, ProcessInvoker, Runner, TestReporter, run_suite};

use super::{CliResult, ExitCode};

// ============================================================================
// Shared setup
// ============================================================================

/// Resolve the program argument the way a shell user expects.
///
/// A bare name (no path separator) refers to a program in the current directory.
pub fn resolve_program(program: &str) -> PathBuf {
    let path = Path::new(program);
    if path.components().count() > 1 || path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new(".").join(program)
    }
}

/// Configuration from the environment with the flags common to every command applied.
pub fn base_config(timeout_ms: Option<u64>, no_color: bool) -> HarnessConfig {
    let mut config = HarnessConfig::from_env();
    if let Some(ms) = timeout_ms.filter(|ms| *ms > 0) {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    if no_color {
        config = config.with_color(false);
    }
    config
}

// ============================================================================
// Commands
// ============================================================================

/// Run the records catalog up to `bonus` extension tiers.
pub fn run_records(program: &str, bonus: u8, save_logs: bool, config: &HarnessConfig) -> CliResult<ExitCode> {
    let runner = Runner::new(ProcessInvoker::new(config.timeout), resolve_program(program));
    let cases = records_suite(bonus, config.blank_lines);
    tracing::debug!(program = %runner.program().display(), cases = cases.len(), "running records suite");

    let mut aggregator = Aggregator::new();
    let mut reporter = ConsoleReporter::new(config.color);
    reporter.on_run_start("records", cases.len());
    run_suite(&runner, cases, &mut aggregator, &mut reporter)?;

    let log_path = save_logs.then_some(config.log_path.as_path());
    complete_run(&aggregator, &mut reporter, log_path);
    Ok(ExitCode::SUCCESS)
}

/// Print the final report, then persist the test log if requested.
///
/// A log that cannot be written is reported on stderr but does not fail the run: the verdicts are
/// already on screen. Returns whether a log was written.
pub fn complete_run(aggregator: &Aggregator, reporter: &mut dyn TestReporter, log_path: Option<&Path>) -> bool {
    reporter.on_run_complete(&aggregator.summary());
    let Some(path) = log_path else {
        return false;
    };
    match aggregator.save_log(path) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(path = %path.display(), "test log not saved: {err}");
            eprintln!("Error: {err}");
            false
        }
    }
}

/// Run every bitmap fixture found in `dir`.
pub fn run_bitmap(program: &str, dir: &Path, config: &HarnessConfig) -> CliResult<ExitCode> {
    let runner = Runner::new(ProcessInvoker::new(config.timeout), resolve_program(program));
    let mut aggregator = Aggregator::new();
    let mut reporter = ConsoleReporter::new(config.color);
    run_bitmap_suite(&runner, dir, config.display, &mut aggregator, &mut reporter)?;
    reporter.on_run_complete(&aggregator.summary());
    Ok(ExitCode::SUCCESS)
}

/// Benchmark the bitmap program and write the chart.
pub fn run_bench(program: &str, sizes: &[GridSize], config: &HarnessConfig) -> CliResult<ExitCode> {
    let sizes = if sizes.is_empty() { &DEFAULT_SIZES[..] } else { sizes };
    let driver = BenchmarkDriver::new(
        ProcessInvoker::new(config.timeout),
        resolve_program(program),
        &config.scratch_dir,
    )
    .with_repeat(config.repeat);
    let mut sink = JsonChartSink::new(&config.chart_path);
    let mut rng = rand::thread_rng();

    let report = run_benchmark(&driver, sizes, &mut rng, &mut sink)?;

    println!("{:<12} {:<8} {:>6} {:>14} {:>14}", "size", "query", "runs", "median [s]", "variance");
    for &size in &report.sizes {
        for query in BENCH_QUERIES {
            if let Some(stats) = report.stats(size, query) {
                println!(
                    "{:<12} {:<8} {:>6} {:>14.6} {:>14.3e}",
                    size.to_string(),
                    query.keyword(),
                    stats.runs,
                    stats.median_secs,
                    stats.variance_secs
                );
            }
        }
    }
    println!("Chart written to {}", sink.path().display());
    Ok(ExitCode::SUCCESS)
}
