//! Case catalogs for the two supported protocols.
//!
//! - `records` - name/number search program fed on stdin
//! - `bitmap` - shape search program over grid files with filename-encoded answers

pub mod bitmap;
pub mod records;
