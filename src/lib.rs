#![forbid(unsafe_code)]
//! Probe: black-box conformance and performance harness
//!
//! Probe runs externally built command-line programs as opaque executables and checks them against
//! two protocols: a records search program (name/number pairs on stdin) and a bitmap shape search
//! program (grid files with filename-encoded answers). It also times the bitmap program over
//! generated grids of increasing size.
//!
//! ## Layout
//!
//! - `probe_core` (workspace crate) - fixtures, output comparator, expectation codec; no IO
//! - [`harness`] - process invocation, runner, reporting, benchmark driver, suite catalogs
//! - [`config`] - shared harness settings
//! - [`cli`] - command-line front end
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `harness` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod harness;
pub mod version;

pub use config::{BlankLinePolicy, HarnessConfig};
