//! Test case model: what to run, what is expected, and how it ended.

use std::time::Duration;

use probe_core::{Comparison, ExpectedOutcome, Fixture};

use super::invoker::{InvocationResult, SIGSEGV};

/// What a case asserts about the program. Exactly one mode per case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Exit code 0 and output matching the expectation.
    Normal(ExpectedOutcome),
    /// Non-zero exit code and a diagnostic on stderr; stdout is not asserted.
    ExpectFailure,
    /// A fault signal is an accepted outcome; output and exit code are not asserted.
    CrashTolerant,
}

/// Why a case failed. A case may collect several reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    WrongOutput,
    WrongExitCode(i32),
    UnexpectedSuccess,
    MissingErrorText,
    Crash(i32),
    TimedOut(Duration),
    EncodingViolation,
}

impl FailureReason {
    /// Human-readable diagnostic line.
    pub fn message(&self) -> String {
        match self {
            FailureReason::WrongOutput => "Program output does not match the expected output".to_string(),
            FailureReason::WrongExitCode(code) => {
                format!("Program returned error exit code {code} although it should not have")
            }
            FailureReason::UnexpectedSuccess => {
                "Program exited successfully although it should have failed".to_string()
            }
            FailureReason::MissingErrorText => "Program did not print an error message to STDERR".to_string(),
            FailureReason::Crash(signal) if *signal == SIGSEGV => format!(
                "Program crashed unexpectedly with exit code -{signal}. It is probably touching memory it does not own"
            ),
            FailureReason::Crash(signal) => format!("Program crashed unexpectedly with signal {signal}"),
            FailureReason::TimedOut(after) => {
                format!("Program did not finish within {} ms and was killed", after.as_millis())
            }
            FailureReason::EncodingViolation => {
                "Program output contains characters outside ASCII (e.g. diacritics)".to_string()
            }
        }
    }
}

/// Terminal classification of a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(Vec<FailureReason>),
}

impl Verdict {
    pub fn from_reasons(reasons: Vec<FailureReason>) -> Self {
        if reasons.is_empty() { Verdict::Pass } else { Verdict::Fail(reasons) }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn reasons(&self) -> &[FailureReason] {
        match self {
            Verdict::Pass => &[],
            Verdict::Fail(reasons) => reasons,
        }
    }

    /// All failure reasons, one per line.
    pub fn message(&self) -> String {
        self.reasons().iter().map(FailureReason::message).collect::<Vec<_>>().join("\n")
    }
}

/// Outcome recorded by the runner after executing a case.
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub verdict: Verdict,
    pub invocation: InvocationResult,
}

/// One test: program arguments, input, expectation and (after running) its outcome.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub args: Vec<String>,
    /// Fed on stdin; `None` means empty input.
    pub input: Option<Fixture>,
    pub mode: ExecutionMode,
    pub comparison: Comparison,
    pub(crate) outcome: Option<CaseOutcome>,
}

impl TestCase {
    fn new(name: impl Into<String>, args: &[&str], input: Option<Fixture>, mode: ExecutionMode) -> Self {
        Self {
            name: name.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            input,
            mode,
            comparison: Comparison::default(),
            outcome: None,
        }
    }

    /// A case whose records output must list the 1-based `matching` records.
    pub fn expect_records(name: impl Into<String>, args: &[&str], input: Fixture, matching: &[usize]) -> Self {
        let expected = probe_core::expected_for_records(input.as_records(), matching);
        Self::new(name, args, Some(input), ExecutionMode::Normal(expected))
    }

    pub fn expect_output(name: impl Into<String>, args: &[&str], input: Option<Fixture>, expected: ExpectedOutcome) -> Self {
        Self::new(name, args, input, ExecutionMode::Normal(expected))
    }

    pub fn expect_failure(name: impl Into<String>, args: &[&str], input: Fixture) -> Self {
        Self::new(name, args, Some(input), ExecutionMode::ExpectFailure)
    }

    pub fn crash_tolerant(name: impl Into<String>, args: &[&str], input: Fixture) -> Self {
        Self::new(name, args, Some(input), ExecutionMode::CrashTolerant)
    }

    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Text written to the program's stdin.
    pub fn input_text(&self) -> String {
        self.input.as_ref().map(Fixture::serialize).unwrap_or_default()
    }

    /// Expected output as logged; empty for modes that do not assert output.
    pub fn expected_text(&self) -> String {
        match &self.mode {
            ExecutionMode::Normal(expected) => expected.render(),
            ExecutionMode::ExpectFailure | ExecutionMode::CrashTolerant => String::new(),
        }
    }

    /// `None` until the runner has executed the case.
    pub fn outcome(&self) -> Option<&CaseOutcome> {
        self.outcome.as_ref()
    }
}
