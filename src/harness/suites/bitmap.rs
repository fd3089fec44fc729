//! Bitmap protocol catalog.
//!
//! Every `*.txt` file in the fixture directory is a grid whose filename encodes the expected answers
//! (see [`probe_core::bitmap`]). Each valid file becomes three cases, `PROGRAM <query> <file>`, one per
//! shape query. A file passes when all three of its queries pass.

use std::fs;
use std::path::{Path, PathBuf};

use probe_core::compare::combined_trimmed;
use probe_core::{BitmapExpectation, BitmapQuery, Comparison, ExpectedOutcome, InvalidFixtureFile, decode_filename};

use crate::harness::HarnessError;
use crate::harness::case::TestCase;
use crate::harness::invoker::Invoker;
use crate::harness::reporter::{Aggregator, GroupCheck, GroupVerdict, TestReporter};
use crate::harness::runner::{Runner, execute};

const FIXTURE_EXTENSION: &str = "txt";
/// Flag asking the program to print the grid with the found shape marked.
pub const DISPLAY_FLAG: &str = "--display";

/// A fixture file with its decoded answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapFile {
    pub path: PathBuf,
    pub expectation: BitmapExpectation,
}

/// Result of scanning a fixture directory.
#[derive(Debug, Default)]
pub struct FixtureScan {
    pub files: Vec<BitmapFile>,
    pub invalid: Vec<InvalidFixtureFile>,
}

/// List `*.txt` fixtures in `dir` sorted by name, splitting them into decodable and invalid ones.
///
/// ## Errors
/// - [`HarnessError::FixtureDir`] when the directory cannot be read.
pub fn scan_fixture_dir(dir: &Path) -> Result<FixtureScan, HarnessError> {
    let dir_err = |source: std::io::Error| HarnessError::FixtureDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_err)? {
        let path = entry.map_err(dir_err)?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(FIXTURE_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();

    let mut scan = FixtureScan::default();
    for name in names {
        match decode_filename(&name) {
            Ok(expectation) => scan.files.push(BitmapFile {
                path: dir.join(&name),
                expectation,
            }),
            Err(invalid) => {
                tracing::warn!(file = %name, "skipping invalid fixture file: {invalid}");
                scan.invalid.push(invalid);
            }
        }
    }
    Ok(scan)
}

/// The three query cases of one fixture file.
pub fn file_cases(file: &BitmapFile) -> Vec<TestCase> {
    let path = file.path.to_string_lossy().into_owned();
    BitmapQuery::ALL
        .iter()
        .map(|&query| {
            let expected = ExpectedOutcome::Text(file.expectation.for_query(query).to_string());
            TestCase::expect_output(
                format!("{} {}", file.expectation.case, query.keyword()),
                &[query.keyword(), path.as_str()],
                None,
                expected,
            )
            .with_comparison(Comparison::CombinedTrimmed)
        })
        .collect()
}

/// The grid part of a `--display` run: stdout without its final answer line.
pub fn display_rendering(stdout: &str) -> String {
    let lines: Vec<&str> = stdout.split('\n').collect();
    lines[..lines.len().saturating_sub(2)].join("\n")
}

/// Re-run each query of `file` with [`DISPLAY_FLAG`] and hand the renderings to the reporter.
fn display_file<I: Invoker>(
    runner: &Runner<I>,
    file: &BitmapFile,
    reporter: &mut dyn TestReporter,
) -> Result<(), HarnessError> {
    let path = file.path.to_string_lossy().into_owned();
    for query in BitmapQuery::ALL {
        let args = [DISPLAY_FLAG.to_string(), query.keyword().to_string(), path.clone()];
        let result = runner.invoke(&args, "")?;
        let label = format!("{} {}", file.expectation.case, query.keyword());
        reporter.on_display(&label, &display_rendering(&result.stdout));
    }
    Ok(())
}

/// Run every fixture in `dir`, reporting per case and per file.
///
/// Invalid fixture names are reported as skipped and never counted as failures. With `display`, each
/// file is followed by the program's own rendering of every query.
pub fn run_bitmap_suite<I: Invoker>(
    runner: &Runner<I>,
    dir: &Path,
    display: bool,
    aggregator: &mut Aggregator,
    reporter: &mut dyn TestReporter,
) -> Result<(), HarnessError> {
    let scan = scan_fixture_dir(dir)?;
    reporter.on_run_start("bitmap", scan.files.len() * BitmapQuery::ALL.len());

    for invalid in &scan.invalid {
        aggregator.record_skip();
        reporter.on_skip(&invalid.name, "invalid fixture file");
    }

    for file in &scan.files {
        let mut checks = Vec::with_capacity(BitmapQuery::ALL.len());
        for (case, query) in file_cases(file).into_iter().zip(BitmapQuery::ALL) {
            let case = execute(runner, case, aggregator, reporter)?;
            if let Some(outcome) = case.outcome() {
                checks.push(GroupCheck {
                    label: query.keyword().to_string(),
                    passed: outcome.verdict.is_pass(),
                    exit_code: outcome.invocation.exit_code(),
                    expected: file.expectation.for_query(query).to_string(),
                    actual: combined_trimmed(&outcome.invocation.stdout, &outcome.invocation.stderr),
                });
            }
        }
        let group = GroupVerdict {
            label: file.expectation.case.clone(),
            checks,
        };
        reporter.on_group_complete(&group);
        aggregator.record_group(group);
        if display {
            display_file(runner, file, reporter)?;
        }
    }
    Ok(())
}
