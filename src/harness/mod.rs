//! Harness layer: everything that touches processes and files.
//!
//! ## Modules
//!
//! - `invoker` - subprocess execution with captured I/O and a bounded wait
//! - `case` - test case model, execution modes and verdicts
//! - `runner` - classification and suite execution
//! - `reporter` - aggregation, console report, persisted test log
//! - `bench` - benchmark driver and chart sinks
//! - `suites` - the records and bitmap case catalogs

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod bench;
pub mod case;
pub mod invoker;
pub mod reporter;
pub mod runner;
pub mod suites;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use case::{CaseOutcome, ExecutionMode, FailureReason, TestCase, Verdict};
pub use invoker::{InvocationResult, InvokeError, Invoker, ProcessInvoker, Termination};
pub use reporter::{Aggregator, ConsoleReporter, LogRecord, RunSummary, TestReporter};
pub use runner::{Runner, classify, run_suite};

/// Errors that stop a harness run or one of its outputs.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error("failed to encode test log: {0}")]
    LogEncode(#[from] serde_json::Error),

    #[error("failed to write test log '{}': {source}", path.display())]
    LogWrite { path: PathBuf, source: io::Error },

    #[error("cannot read fixture directory '{}': {source}", path.display())]
    FixtureDir { path: PathBuf, source: io::Error },

    #[error("scratch file '{}' failed: {source}", path.display())]
    Scratch { path: PathBuf, source: io::Error },

    #[error("failed to write chart '{}': {source}", path.display())]
    Chart { path: PathBuf, source: io::Error },
}

impl HarnessError {
    /// Whether the error means the program under test cannot be run at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarnessError::Invoke(InvokeError::Launch { .. }))
    }
}
