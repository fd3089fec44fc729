//! Provide the pure building blocks of the probe harness: fixtures, output comparison and expectations.
//!
//! This crate is intentionally small and dependency-light. It holds the deterministic pieces that both the
//! test case runner and the benchmark driver rely on:
//! - the fixture model and its textual wire format,
//! - the order- and case-insensitive output comparator,
//! - the expectation codec (records protocol + bitmap filename decoding).
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no process spawning**, no filesystem access, no global state.
//! - Everything here works on strings and plain data so it can be property-tested in isolation.

pub mod bitmap;
pub mod compare;
pub mod expect;
pub mod fixture;

pub use bitmap::{BitmapExpectation, BitmapQuery, InvalidFixtureFile, decode_filename};
pub use compare::{Comparison, output_matches};
pub use expect::{ExpectedOutcome, FIELD_LIMIT, NOT_FOUND_LINE, expected_for_records};
pub use fixture::{Fixture, Grid, Record};
