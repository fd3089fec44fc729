//! Expectation codec for the records protocol.
//!
//! Computes the text a conforming program must print for a fixture and a set of 1-based
//! matching record indices.
//!
//! ## Notes
//! - Each matching record renders as `name, number` in fixture order.
//! - Fields are cut to [`FIELD_LIMIT`] characters, then lowercased.
//! - An empty matching set renders as the [`NOT_FOUND_LINE`] sentinel, never as empty text.

use crate::fixture::Record;

/// Protocol limit for a single `name` or `number` field, in characters.
pub const FIELD_LIMIT: usize = 100;

/// Literal line a program prints when no record matches.
pub const NOT_FOUND_LINE: &str = "Not found";

/// Normalized expected output of a test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedOutcome {
    Text(String),
    NotFound,
}

impl ExpectedOutcome {
    /// Render the expectation as the text it is compared and logged as.
    pub fn render(&self) -> String {
        match self {
            ExpectedOutcome::Text(text) => text.clone(),
            ExpectedOutcome::NotFound => format!("{NOT_FOUND_LINE}\n"),
        }
    }
}

/// Cut a field to at most [`FIELD_LIMIT`] characters.
///
/// ## Notes
/// - Counts Unicode scalars, so multi-byte input is never split mid-character.
/// - A no-op for fields at or under the limit.
pub fn truncate_field(field: &str) -> &str {
    match field.char_indices().nth(FIELD_LIMIT) {
        Some((byte_idx, _)) => &field[..byte_idx],
        None => field,
    }
}

/// Render one matching record as an expected output line (without newline).
pub fn expected_line(record: &Record) -> String {
    format!(
        "{}, {}",
        truncate_field(record.name()).to_lowercase(),
        truncate_field(record.number()).to_lowercase()
    )
}

/// Compute the expected output for `records` given the 1-based `matching` indices.
///
/// ## Parameters
/// - `records`: The fixture records, in the order they are fed to the program.
/// - `matching`: 1-based indices of records that must be listed. Order and duplicates do not matter.
///
/// ## Returns
/// - [`ExpectedOutcome::NotFound`] when `matching` is empty, otherwise the rendered lines.
pub fn expected_for_records(records: &[Record], matching: &[usize]) -> ExpectedOutcome {
    if matching.is_empty() {
        return ExpectedOutcome::NotFound;
    }
    let mut out = String::new();
    for (idx, record) in records.iter().enumerate() {
        if matching.contains(&(idx + 1)) {
            out.push_str(&expected_line(record));
            out.push('\n');
        }
    }
    ExpectedOutcome::Text(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Vec<Record> {
        vec![
            Record::new("Petr Dvorak", "603123456"),
            Record::new("Jana Novotna", "777987654"),
            Record::new("Bedrich Smetana ml.", "541141120"),
        ]
    }

    #[test]
    fn test_empty_matching_is_not_found() {
        assert_eq!(expected_for_records(&base(), &[]), ExpectedOutcome::NotFound);
        assert_eq!(ExpectedOutcome::NotFound.render(), "Not found\n");
    }

    #[test]
    fn test_matching_lines_in_fixture_order() {
        let expected = expected_for_records(&base(), &[3, 1]);
        assert_eq!(
            expected,
            ExpectedOutcome::Text("petr dvorak, 603123456\nbedrich smetana ml., 541141120\n".to_string())
        );
    }

    #[test]
    fn test_out_of_range_indices_are_ignored() {
        let expected = expected_for_records(&base(), &[2, 9]);
        assert_eq!(expected.render(), "jana novotna, 777987654\n");
    }

    #[test]
    fn test_long_fields_truncated_before_lowering() {
        let records = vec![Record::new("X".repeat(101), "1".repeat(150))];
        let line = expected_for_records(&records, &[1]).render();
        let (name, number) = line.trim_end().split_once(", ").unwrap();
        assert_eq!(name, "x".repeat(100));
        assert_eq!(number, "1".repeat(100));
    }

    #[test]
    fn test_truncate_is_noop_on_short_fields() {
        assert_eq!(truncate_field(""), "");
        assert_eq!(truncate_field("abc"), "abc");
        let exact = "y".repeat(FIELD_LIMIT);
        assert_eq!(truncate_field(&exact), exact);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let wide = "é".repeat(120);
        assert_eq!(truncate_field(&wide).chars().count(), FIELD_LIMIT);
    }
}
