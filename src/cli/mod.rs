//! CLI module for the probe harness
//!
//! ## Commands
//!
//! - `records <PROGRAM>` - Run the records protocol catalog
//! - `bitmap <PROGRAM>` - Run every bitmap fixture in a directory (`--display` shows renderings)
//! - `bench <PROGRAM>` - Time the bitmap program over generated grids
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::config::BlankLinePolicy;
use crate::harness::HarnessError;
use crate::harness::bench::GridSize;
use crate::version::PROBE_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        if err.is_fatal() {
            CliError::failure(format!("Error invoking the program: {err}"))
        } else {
            CliError::failure(format!("Error: {err}"))
        }
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Black-box conformance and performance harness for command-line programs
#[derive(Parser, Debug)]
#[command(name = "probe")]
#[command(version = PROBE_VERSION)]
#[command(about = "Black-box conformance and performance harness", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the records (name/number search) catalog
    Records {
        /// Program under test (for example: t9search)
        #[arg(value_name = "PROGRAM")]
        program: String,
        /// Also run extension tiers (1 or 2)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
        bonus: Option<u8>,
        /// Persist the structured test log
        #[arg(long = "save-logs")]
        save_logs: bool,
        /// Test log path used with --save-logs
        #[arg(long = "log-file", value_name = "PATH")]
        log_file: Option<PathBuf>,
        /// Per-case timeout in milliseconds
        #[arg(long = "timeout-ms", value_name = "MS")]
        timeout_ms: Option<u64>,
        /// Treatment of blank-line fixtures
        #[arg(long = "blank-lines", value_enum)]
        blank_lines: Option<BlankLinePolicy>,
        /// Disable colored output
        #[arg(long = "no-color")]
        no_color: bool,
    },

    /// Run every bitmap fixture file in a directory
    Bitmap {
        /// Program under test (for example: figsearch)
        #[arg(value_name = "PROGRAM")]
        program: String,
        /// Directory with `*.txt` fixtures
        #[arg(long, value_name = "DIR", default_value = "tests")]
        dir: PathBuf,
        /// Also print the program's own rendering of every query (passes `--display` to it)
        #[arg(long)]
        display: bool,
        /// Per-case timeout in milliseconds
        #[arg(long = "timeout-ms", value_name = "MS")]
        timeout_ms: Option<u64>,
        /// Disable colored output
        #[arg(long = "no-color")]
        no_color: bool,
    },

    /// Time the bitmap program over random grids of increasing size
    Bench {
        /// Program under test (for example: figsearch)
        #[arg(value_name = "PROGRAM")]
        program: String,
        /// Comma-separated grid sizes, e.g. 100x100,200x200
        #[arg(long, value_name = "SIZES", value_delimiter = ',')]
        sizes: Vec<GridSize>,
        /// Invocations per size and query
        #[arg(long, value_name = "N")]
        repeat: Option<usize>,
        /// Directory for generated grid files
        #[arg(long = "scratch-dir", value_name = "DIR")]
        scratch_dir: Option<PathBuf>,
        /// Chart output path
        #[arg(long, value_name = "PATH")]
        chart: Option<PathBuf>,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Records {
            program,
            bonus,
            save_logs,
            log_file,
            timeout_ms,
            blank_lines,
            no_color,
        } => {
            let mut config = commands::base_config(timeout_ms, no_color);
            if let Some(path) = log_file {
                config = config.with_log_path(path);
            }
            if let Some(policy) = blank_lines {
                config = config.with_blank_lines(policy);
            }
            commands::run_records(&program, bonus.unwrap_or(0), save_logs, &config)
        }
        Command::Bitmap {
            program,
            dir,
            display,
            timeout_ms,
            no_color,
        } => {
            let config = commands::base_config(timeout_ms, no_color).with_display(display);
            commands::run_bitmap(&program, &dir, &config)
        }
        Command::Bench {
            program,
            sizes,
            repeat,
            scratch_dir,
            chart,
        } => {
            let mut config = commands::base_config(None, false);
            if let Some(repeat) = repeat {
                config = config.with_repeat(repeat);
            }
            if let Some(dir) = scratch_dir {
                config = config.with_scratch_dir(dir);
            }
            if let Some(path) = chart {
                config = config.with_chart_path(path);
            }
            commands::run_bench(&program, &sizes, &config)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_records() {
        let cli = Cli::try_parse_from(["probe", "records", "t9search", "--bonus", "2", "--save-logs"]).unwrap();
        if let Command::Records {
            program,
            bonus,
            save_logs,
            ..
        } = cli.command
        {
            assert_eq!(program, "t9search");
            assert_eq!(bonus, Some(2));
            assert!(save_logs);
        } else {
            panic!("Expected Records command");
        }
    }

    #[test]
    fn test_cli_rejects_unknown_bonus() {
        assert!(Cli::try_parse_from(["probe", "records", "t9search", "-b", "3"]).is_err());
    }

    #[test]
    fn test_cli_parse_blank_lines() {
        let cli = Cli::try_parse_from(["probe", "records", "t9search", "--blank-lines", "reject"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Records {
                blank_lines: Some(BlankLinePolicy::Reject),
                ..
            }
        ));
    }

    #[test]
    fn test_cli_parse_bitmap_default_dir() {
        let cli = Cli::try_parse_from(["probe", "bitmap", "figsearch"]).unwrap();
        if let Command::Bitmap { dir, display, .. } = cli.command {
            assert_eq!(dir, PathBuf::from("tests"));
            assert!(!display);
        } else {
            panic!("Expected Bitmap command");
        }
    }

    #[test]
    fn test_cli_parse_bitmap_display() {
        let cli = Cli::try_parse_from(["probe", "bitmap", "figsearch", "--display", "--dir", "images"]).unwrap();
        assert!(matches!(cli.command, Command::Bitmap { display: true, .. }));
    }

    #[test]
    fn test_cli_parse_bench_sizes() {
        let cli = Cli::try_parse_from(["probe", "bench", "figsearch", "--sizes", "10x10,20x30", "--repeat", "3"]).unwrap();
        if let Command::Bench { sizes, repeat, .. } = cli.command {
            assert_eq!(sizes, vec![GridSize::new(10, 10), GridSize::new(20, 30)]);
            assert_eq!(repeat, Some(3));
        } else {
            panic!("Expected Bench command");
        }
    }

    #[test]
    fn test_cli_requires_program() {
        assert!(Cli::try_parse_from(["probe", "records"]).is_err());
    }
}
