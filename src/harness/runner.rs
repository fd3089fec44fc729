//! Test case runner: invoke, classify, record.
//!
//! Classification precedence:
//! 1. launch failure aborts the run (returned as an error, never a verdict),
//! 2. timeout fails the case,
//! 3. a fault signal passes a crash-tolerant case and fails every other one,
//! 4. expected-failure cases need a non-zero exit code and stderr text,
//! 5. normal cases need exit code 0 and matching output.
//!
//! Reasons from 4 and 5 accumulate instead of stopping at the first one.

use std::path::{Path, PathBuf};

use super::HarnessError;
use super::case::{CaseOutcome, ExecutionMode, FailureReason, TestCase, Verdict};
use super::invoker::{InvocationResult, InvokeError, Invoker, Termination};
use super::reporter::{Aggregator, TestReporter};

/// Classify a finished invocation against the case's execution mode.
pub fn classify(case: &TestCase, result: &InvocationResult) -> Verdict {
    if result.termination == Termination::TimedOut {
        return Verdict::Fail(vec![FailureReason::TimedOut(result.elapsed)]);
    }

    if let Some(signal) = result.fault_signal() {
        return match case.mode {
            ExecutionMode::CrashTolerant => Verdict::Pass,
            ExecutionMode::Normal(_) | ExecutionMode::ExpectFailure => {
                Verdict::Fail(vec![FailureReason::Crash(signal)])
            }
        };
    }

    let mut reasons = Vec::new();
    if result.encoding_violation {
        reasons.push(FailureReason::EncodingViolation);
    }

    let exit_code = result.exit_code().unwrap_or(-1);
    match &case.mode {
        ExecutionMode::CrashTolerant => {}
        ExecutionMode::ExpectFailure => {
            if exit_code == 0 {
                reasons.push(FailureReason::UnexpectedSuccess);
            }
            if result.stderr.is_empty() {
                reasons.push(FailureReason::MissingErrorText);
            }
        }
        ExecutionMode::Normal(expected) => {
            if exit_code != 0 && case.comparison.asserts_exit_code() {
                reasons.push(FailureReason::WrongExitCode(exit_code));
            }
            if !case.comparison.matches(&expected.render(), &result.stdout, &result.stderr) {
                reasons.push(FailureReason::WrongOutput);
            }
        }
    }

    Verdict::from_reasons(reasons)
}

/// Runs cases against one program through an [`Invoker`].
pub struct Runner<I: Invoker> {
    invoker: I,
    program: PathBuf,
}

impl<I: Invoker> Runner<I> {
    pub fn new(invoker: I, program: impl Into<PathBuf>) -> Self {
        Self {
            invoker,
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Invoke the program outside of any case, without classification.
    pub fn invoke(&self, args: &[String], input: &str) -> Result<InvocationResult, InvokeError> {
        self.invoker.invoke(&self.program, args, input)
    }

    /// Invoke the program for `case` and store the classified outcome on it.
    ///
    /// ## Errors
    /// - [`InvokeError`] when the program could not be run; the case is left without an outcome.
    #[tracing::instrument(skip_all, fields(case = %case.name))]
    pub fn run_case(&self, case: &mut TestCase) -> Result<(), InvokeError> {
        let invocation = self.invoker.invoke(&self.program, &case.args, &case.input_text())?;
        let verdict = classify(case, &invocation);
        tracing::debug!(pass = verdict.is_pass(), "case classified");
        case.outcome = Some(CaseOutcome { verdict, invocation });
        Ok(())
    }
}

/// Run one case, append it to the aggregator and report it.
///
/// ## Errors
/// - [`HarnessError::Invoke`] when the program could not be run. This is fatal for the whole run.
pub fn execute<I: Invoker>(
    runner: &Runner<I>,
    mut case: TestCase,
    aggregator: &mut Aggregator,
    reporter: &mut dyn TestReporter,
) -> Result<TestCase, HarnessError> {
    runner.run_case(&mut case)?;
    if let Some(outcome) = case.outcome() {
        aggregator.record(&case, outcome);
        reporter.on_case_complete(&case, outcome);
    }
    Ok(case)
}

/// Run every case in order, stopping only on a harness-fatal error.
pub fn run_suite<I: Invoker>(
    runner: &Runner<I>,
    cases: Vec<TestCase>,
    aggregator: &mut Aggregator,
    reporter: &mut dyn TestReporter,
) -> Result<(), HarnessError> {
    for case in cases {
        execute(runner, case, aggregator, reporter)?;
    }
    Ok(())
}
