//! Filename-encoded expectations for the bitmap protocol.
//!
//! A fixture file such as `case-2_2_2_5-0_0_3_0-1_1_2_2.txt` carries its own answers:
//!
//! | segment | meaning |
//! |---------|---------|
//! | 1 | case label |
//! | 2 | expected `hline` answer |
//! | 3 | expected `vline` answer |
//! | 4 | expected `square` answer (`.txt` stripped) |
//!
//! Underscores decode to spaces. Segments past the fourth are ignored.

use thiserror::Error;

/// Minimum number of hyphen-delimited segments in a valid fixture filename.
pub const MIN_SEGMENTS: usize = 4;

const FIXTURE_SUFFIX: &str = ".txt";

/// A fixture filename that does not carry the expected answers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid fixture file '{name}': expected at least {MIN_SEGMENTS} '-'-delimited segments, found {segments}")]
pub struct InvalidFixtureFile {
    pub name: String,
    pub segments: usize,
}

/// Shape query understood by the bitmap program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitmapQuery {
    HLine,
    VLine,
    Square,
}

impl BitmapQuery {
    pub const ALL: [BitmapQuery; 3] = [BitmapQuery::HLine, BitmapQuery::VLine, BitmapQuery::Square];

    /// Command-line keyword for the query.
    pub fn keyword(self) -> &'static str {
        match self {
            BitmapQuery::HLine => "hline",
            BitmapQuery::VLine => "vline",
            BitmapQuery::Square => "square",
        }
    }
}

/// Expected answers decoded from a fixture filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapExpectation {
    pub case: String,
    pub hline: String,
    pub vline: String,
    pub square: String,
}

impl BitmapExpectation {
    pub fn for_query(&self, query: BitmapQuery) -> &str {
        match query {
            BitmapQuery::HLine => &self.hline,
            BitmapQuery::VLine => &self.vline,
            BitmapQuery::Square => &self.square,
        }
    }
}

/// Decode one filename segment (`_` → space).
pub fn decode_segment(segment: &str) -> String {
    segment.replace('_', " ")
}

/// Encode an answer back into a filename segment (space → `_`).
pub fn encode_segment(answer: &str) -> String {
    answer.replace(' ', "_")
}

/// Decode the expected answers from a fixture filename (no directory part).
///
/// ## Errors
/// - [`InvalidFixtureFile`] when the name has fewer than [`MIN_SEGMENTS`] segments.
pub fn decode_filename(name: &str) -> Result<BitmapExpectation, InvalidFixtureFile> {
    let parts: Vec<&str> = name.split('-').collect();
    let [case, hline, vline, square, ..] = parts.as_slice() else {
        return Err(InvalidFixtureFile {
            name: name.to_string(),
            segments: parts.len(),
        });
    };
    let square = square.strip_suffix(FIXTURE_SUFFIX).unwrap_or(*square);

    Ok(BitmapExpectation {
        case: (*case).to_string(),
        hline: decode_segment(hline),
        vline: decode_segment(vline),
        square: decode_segment(square),
    })
}
