//! Harness version information.
//!
//! The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time so the CLI and the
//! persisted reports agree on the same value.

/// The probe harness version string (for example, `0.1.0`).
pub const PROBE_VERSION: &str = env!("CARGO_PKG_VERSION");
