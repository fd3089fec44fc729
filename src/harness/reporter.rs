//! Result aggregation and reporting.
//!
//! ## TestReporter Trait
//!
//! Reporting is separated from execution through the `TestReporter` trait. The runner calls it after
//! every case; [`ConsoleReporter`] renders the colored human-readable report.
//!
//! ## Aggregator
//!
//! [`Aggregator`] owns the running totals and the append-only [`LogRecord`] list that can be persisted
//! as JSON for offline diffing between runs.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::HarnessError;
use super::case::{CaseOutcome, TestCase};

// ============================================================================
// Test log
// ============================================================================

/// One executed case, as persisted in the test log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub test_name: String,
    /// `"ok"` or `"failed"`.
    pub status: String,
    pub error_message: String,
    /// Arguments joined with single spaces.
    pub args: String,
    pub expected_output: String,
    pub stdout: String,
    pub stderr: String,
}

impl LogRecord {
    pub fn from_case(case: &TestCase, outcome: &CaseOutcome) -> Self {
        Self {
            test_name: case.name.clone(),
            status: (if outcome.verdict.is_pass() { "ok" } else { "failed" }).to_string(),
            error_message: outcome.verdict.message(),
            args: case.args.join(" "),
            expected_output: case.expected_text(),
            stdout: outcome.invocation.stdout.clone(),
            stderr: outcome.invocation.stderr.clone(),
        }
    }
}

/// One check inside a group (for example one query against one bitmap file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCheck {
    pub label: String,
    pub passed: bool,
    pub exit_code: Option<i32>,
    pub expected: String,
    pub actual: String,
}

/// File-level verdict of a group of cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupVerdict {
    pub label: String,
    pub checks: Vec<GroupCheck>,
}

impl GroupVerdict {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

/// Summary of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    /// Inputs skipped before becoming cases (invalid fixture files, disabled cases).
    pub skipped: usize,
    pub groups: Vec<GroupVerdict>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    /// Percentage of passed cases; `0.0` for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 / self.total as f64 * 100.0
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Owns the counters and the test log of one run.
#[derive(Debug, Default)]
pub struct Aggregator {
    total: usize,
    passed: usize,
    skipped: usize,
    log: Vec<LogRecord>,
    groups: Vec<GroupVerdict>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an executed case.
    pub fn record(&mut self, case: &TestCase, outcome: &CaseOutcome) {
        self.total += 1;
        if outcome.verdict.is_pass() {
            self.passed += 1;
        }
        self.log.push(LogRecord::from_case(case, outcome));
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn record_group(&mut self, group: GroupVerdict) {
        self.groups.push(group);
    }

    pub fn log(&self) -> &[LogRecord] {
        &self.log
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.total,
            passed: self.passed,
            skipped: self.skipped,
            groups: self.groups.clone(),
        }
    }

    /// Serialize the test log as a pretty-printed JSON array.
    pub fn log_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.log)
    }

    /// Write the test log to `path`, replacing any previous file.
    pub fn save_log(&self, path: &Path) -> Result<(), HarnessError> {
        let json = self.log_json()?;
        fs::write(path, json).map_err(|source| HarnessError::LogWrite {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), records = self.log.len(), "test log saved");
        Ok(())
    }
}

// ============================================================================
// Reporter trait
// ============================================================================

/// Receives run events. Implement this to customize the report format.
pub trait TestReporter {
    /// Called once before the first case.
    fn on_run_start(&mut self, _suite: &str, _planned: usize) {}

    /// Called for inputs that are skipped instead of run.
    fn on_skip(&mut self, _name: &str, _reason: &str) {}

    /// Called after every executed case.
    fn on_case_complete(&mut self, case: &TestCase, outcome: &CaseOutcome);

    /// Called after a group of related cases (one bitmap file) completes.
    fn on_group_complete(&mut self, _group: &GroupVerdict) {}

    /// Called with the program's own rendering of a fixture, when display mode is on.
    fn on_display(&mut self, _label: &str, _rendering: &str) {}

    /// Called once after the last case.
    fn on_run_complete(&mut self, summary: &RunSummary);
}

const OK_STYLE: &str = "38;5;154";
const FAIL_STYLE: &str = "38;5;196";
const DEBUG_STYLE: &str = "38;5;12";
const BOLD: &str = "1";
const GREEN_BOLD: &str = "1;32";
const RED_BOLD: &str = "1;31";
const CYAN_BOLD: &str = "1;36";
const YELLOW: &str = "33";
const GREEN: &str = "32";
const RED: &str = "31";

const RULE_WIDTH: usize = 37;

/// Colored console reporter.
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
    color: bool,
    group_count: usize,
}

impl ConsoleReporter {
    pub fn new(color: bool) -> Self {
        Self::with_writer(io::stdout(), color)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            group_count: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{style}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn line(&mut self, text: &str) {
        // A closed stdout must not abort the run; the log file still gets written.
        let _ = writeln!(self.out, "{text}");
    }

    fn rule(&mut self) {
        let rule = self.paint(CYAN_BOLD, &"─".repeat(RULE_WIDTH));
        self.line(&rule);
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_run_start(&mut self, suite: &str, planned: usize) {
        let header = self.paint(BOLD, &format!("Running {planned} {suite} tests"));
        self.line(&header);
    }

    fn on_skip(&mut self, name: &str, reason: &str) {
        let text = self.paint(YELLOW, &format!("Skipping {name}: {reason}"));
        self.line(&text);
    }

    fn on_case_complete(&mut self, case: &TestCase, outcome: &CaseOutcome) {
        if outcome.verdict.is_pass() {
            let marker = self.paint(OK_STYLE, "[OK]");
            self.line(&format!("{marker} {}", case.name));
            return;
        }

        let marker = self.paint(FAIL_STYLE, "[FAIL]");
        self.line(&format!("{marker} {}", case.name));
        self.line(&outcome.verdict.message());

        let sections = [
            ("Arguments", None),
            ("Expected output", Some(case.expected_text())),
            ("STDOUT", Some(outcome.invocation.stdout.clone())),
            ("STDERR", Some(outcome.invocation.stderr.clone())),
        ];
        for (title, body) in sections {
            let title = self.paint(BOLD, title);
            match body {
                None => self.line(&format!("{title}: {}", case.args.join(" "))),
                Some(body) => {
                    self.line(&format!("{title}:"));
                    let body = self.paint(DEBUG_STYLE, &body);
                    self.line(&body);
                }
            }
        }
    }

    fn on_group_complete(&mut self, group: &GroupVerdict) {
        self.group_count += 1;
        let passed = group.passed();
        let (style, status) = if passed { (GREEN_BOLD, "PASSED ✔") } else { (RED_BOLD, "FAILED ✘") };

        let statuses: Vec<String> = group
            .checks
            .iter()
            .map(|check| match (check.passed, check.exit_code) {
                (true, _) => self.paint(GREEN, "✔"),
                (false, Some(code)) if code != 0 => self.paint(RED, &format!("✘ (Return {code})")),
                (false, _) => self.paint(RED, "✘"),
            })
            .collect();
        let expected: Vec<&str> = group.checks.iter().map(|c| c.expected.as_str()).collect();
        let actual: Vec<&str> = group
            .checks
            .iter()
            .map(|c| if c.actual.is_empty() { "(No output)" } else { c.actual.as_str() })
            .collect();

        self.rule();
        let header = self.paint(style, &format!("◇ > TEST [{}] === {status}", self.group_count));
        self.line(&header);
        self.line(&format!("│   {}.txt   ({})", group.label, statuses.join(" ")));
        self.line(&format!("├   {}", expected.join(" || ")));
        self.line(&format!("└   {}\n", actual.join(" || ")));
    }

    fn on_display(&mut self, _label: &str, rendering: &str) {
        self.line(&format!("{rendering}\n"));
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        if !summary.groups.is_empty() {
            let passed_groups = summary.groups.iter().filter(|g| g.passed()).count();
            let style = if passed_groups == summary.groups.len() { GREEN_BOLD } else { RED_BOLD };
            self.rule();
            let header = self.paint(style, &format!("◇ > PASSED [{passed_groups}/{}]", summary.groups.len()));
            self.line(&header);
            let failed = summary.groups.iter().filter(|g| !g.passed());
            let passed = summary.groups.iter().filter(|g| g.passed());
            for group in failed {
                let text = self.paint(RED, &format!("{}.txt ✘", group.label));
                self.line(&format!("├   {text}"));
            }
            for group in passed {
                let text = self.paint(GREEN, &format!("{}.txt ✔", group.label));
                self.line(&format!("├   {text}"));
            }
        }

        let stats = format!(
            "Success rate: {:.2} % [{} / {}]",
            summary.success_rate(),
            summary.passed,
            summary.total
        );
        let stats = self.paint(BOLD, &stats);
        self.line(&stats);
        if summary.skipped > 0 {
            let skipped = self.paint(YELLOW, &format!("Skipped: {}", summary.skipped));
            self.line(&skipped);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use probe_core::Fixture;

    use super::*;
    use crate::harness::case::{FailureReason, Verdict};
    use crate::harness::invoker::{InvocationResult, Termination};

    fn outcome(verdict: Verdict, stdout: &str, stderr: &str) -> CaseOutcome {
        CaseOutcome {
            verdict,
            invocation: InvocationResult {
                termination: Termination::Exited(0),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                encoding_violation: false,
                elapsed: Duration::ZERO,
            },
        }
    }

    fn case() -> TestCase {
        TestCase::expect_records("Assignment #2", &["12"], Fixture::records([("Petr Dvorak", "603123456")]), &[1])
    }

    fn render(f: impl FnOnce(&mut ConsoleReporter<Vec<u8>>)) -> String {
        let mut reporter = ConsoleReporter::with_writer(Vec::new(), false);
        f(&mut reporter);
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_pass_is_single_line() {
        let out = render(|r| r.on_case_complete(&case(), &outcome(Verdict::Pass, "", "")));
        assert_eq!(out, "[OK] Assignment #2\n");
    }

    #[test]
    fn test_failure_prints_debug_sections() {
        let verdict = Verdict::Fail(vec![FailureReason::WrongOutput]);
        let out = render(|r| r.on_case_complete(&case(), &outcome(verdict, "jana\n", "warn")));
        assert!(out.starts_with("[FAIL] Assignment #2\n"));
        assert!(out.contains("Arguments: 12\n"));
        assert!(out.contains("Expected output:\npetr dvorak, 603123456\n"));
        assert!(out.contains("STDOUT:\njana\n"));
        assert!(out.contains("STDERR:\nwarn\n"));
    }

    #[test]
    fn test_colored_markers() {
        let mut reporter = ConsoleReporter::with_writer(Vec::new(), true);
        reporter.on_case_complete(&case(), &outcome(Verdict::Pass, "", ""));
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out, "\x1b[38;5;154m[OK]\x1b[0m Assignment #2\n");
    }

    #[test]
    fn test_summary_two_decimal_rate() {
        let summary = RunSummary {
            total: 3,
            passed: 2,
            skipped: 0,
            groups: Vec::new(),
        };
        let out = render(|r| r.on_run_complete(&summary));
        assert_eq!(out, "Success rate: 66.67 % [2 / 3]\n");
    }

    #[test]
    fn test_summary_reports_skipped_inputs() {
        let mut aggregator = Aggregator::new();
        aggregator.record_skip();
        aggregator.record_skip();
        let out = render(|r| r.on_run_complete(&aggregator.summary()));
        assert_eq!(out, "Success rate: 0.00 % [0 / 0]\nSkipped: 2\n");
    }

    #[test]
    fn test_run_start_announces_plan() {
        let out = render(|r| r.on_run_start("records", 16));
        assert_eq!(out, "Running 16 records tests\n");
    }

    #[test]
    fn test_display_rendering_followed_by_blank_line() {
        let out = render(|r| r.on_display("case hline", "1 0\n0 1"));
        assert_eq!(out, "1 0\n0 1\n\n");
    }

    #[test]
    fn test_empty_run_rate_is_zero() {
        let summary = Aggregator::new().summary();
        assert_eq!(summary.success_rate(), 0.0);
        assert_eq!(summary.failed(), 0);
    }

    #[test]
    fn test_group_rendering() {
        let group = GroupVerdict {
            label: "case".to_string(),
            checks: vec![
                GroupCheck {
                    label: "hline".into(),
                    passed: true,
                    exit_code: Some(0),
                    expected: "2 2".into(),
                    actual: "2 2".into(),
                },
                GroupCheck {
                    label: "vline".into(),
                    passed: false,
                    exit_code: Some(1),
                    expected: "0 0".into(),
                    actual: String::new(),
                },
            ],
        };
        let out = render(|r| r.on_group_complete(&group));
        assert!(out.contains("◇ > TEST [1] === FAILED ✘\n"));
        assert!(out.contains("│   case.txt   (✔ ✘ (Return 1))\n"));
        assert!(out.contains("├   2 2 || 0 0\n"));
        assert!(out.contains("└   2 2 || (No output)\n"));
    }

    #[test]
    fn test_log_records_in_order() {
        let mut aggregator = Aggregator::new();
        let first = case();
        aggregator.record(&first, &outcome(Verdict::Pass, "petr dvorak, 603123456\n", ""));
        let mut second = case();
        second.name = "Assignment #3".into();
        aggregator.record(&second, &outcome(Verdict::Fail(vec![FailureReason::WrongOutput]), "", ""));

        let names: Vec<&str> = aggregator.log().iter().map(|r| r.test_name.as_str()).collect();
        assert_eq!(names, ["Assignment #2", "Assignment #3"]);
        assert_eq!(aggregator.log()[1].status, "failed");
        assert_eq!(aggregator.log()[1].error_message, FailureReason::WrongOutput.message());
    }

    #[test]
    fn test_log_json_format() {
        let mut aggregator = Aggregator::new();
        aggregator.record(&case(), &outcome(Verdict::Pass, "petr dvorak, 603123456\n", ""));
        insta::assert_snapshot!(aggregator.log_json().unwrap(), @r#"
        [
          {
            "test_name": "Assignment #2",
            "status": "ok",
            "error_message": "",
            "args": "12",
            "expected_output": "petr dvorak, 603123456\n",
            "stdout": "petr dvorak, 603123456\n",
            "stderr": ""
          }
        ]
        "#);
    }

    #[test]
    fn test_save_log_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let mut aggregator = Aggregator::new();
        aggregator.record(&case(), &outcome(Verdict::Pass, "x\n", ""));
        aggregator.save_log(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let parsed: Vec<LogRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, aggregator.log());
    }
}
