//! Output comparison between expected and actual program output.
//!
//! ## Notes
//! - **Line-set mode**: both texts are right-trimmed, split on `\n` and lowercased. The comparison
//!   passes when every expected line occurs somewhere in the actual output. Order, duplicates and
//!   line counts are ignored.
//! - **Combined-trimmed mode**: `trim(stdout) + trim(stderr)` must equal the expected text exactly.
//!   Used by the bitmap protocol, whose "not found" answer is written to stderr.

use std::collections::HashSet;

/// How actual output is matched against the expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparison {
    #[default]
    LineSet,
    CombinedTrimmed,
}

impl Comparison {
    /// Whether a non-zero exit code fails the case on its own.
    ///
    /// ## Notes
    /// - Combined-trimmed answers may legitimately arrive on stderr with a failing exit code, so only
    ///   the text decides.
    pub fn asserts_exit_code(self) -> bool {
        matches!(self, Comparison::LineSet)
    }

    /// Decide whether the captured streams satisfy `expected`.
    pub fn matches(self, expected: &str, stdout: &str, stderr: &str) -> bool {
        match self {
            Comparison::LineSet => output_matches(expected, stdout),
            Comparison::CombinedTrimmed => combined_trimmed(stdout, stderr) == expected,
        }
    }
}

/// Split text into normalized lines: trailing whitespace removed from the whole text, then lowercased.
pub fn normalized_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.trim_end().split('\n').map(str::to_lowercase)
}

/// Line-set comparison of `expected` against `actual`.
///
/// ## Returns
/// - `bool`: `true` when every normalized expected line is present in the normalized actual lines.
pub fn output_matches(expected: &str, actual: &str) -> bool {
    let actual_lines: HashSet<String> = normalized_lines(actual).collect();
    normalized_lines(expected).all(|line| actual_lines.contains(&line))
}

/// Join the trimmed stdout and stderr the way the bitmap protocol reports answers.
pub fn combined_trimmed(stdout: &str, stderr: &str) -> String {
    format!("{}{}", stdout.trim(), stderr.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_matches() {
        assert!(output_matches("petr dvorak, 603123456\n", "petr dvorak, 603123456\n"));
    }

    #[test]
    fn test_order_is_ignored() {
        let expected = "a, 1\nb, 2\n";
        let actual = "b, 2\na, 1\n";
        assert!(output_matches(expected, actual));
    }

    #[test]
    fn test_case_is_ignored() {
        assert!(output_matches("Petr Dvorak, 603123456", "PETR DVORAK, 603123456\n"));
    }

    #[test]
    fn test_missing_expected_line_fails() {
        assert!(!output_matches("a, 1\nb, 2\n", "a, 1\n"));
    }

    #[test]
    fn test_extra_actual_lines_and_duplicates_are_tolerated() {
        assert!(output_matches("a, 1\n", "a, 1\na, 1\nc, 3\n"));
    }

    #[test]
    fn test_trailing_whitespace_is_trimmed() {
        assert!(output_matches("Not found\n\n  ", "not found"));
    }

    #[test]
    fn test_empty_expected_requires_empty_line() {
        // An empty expectation normalizes to a single empty line.
        assert!(output_matches("", ""));
        assert!(output_matches("", "   \n"));
        assert!(!output_matches("", "a, 1\n"));
    }

    #[test]
    fn test_only_line_set_asserts_exit_code() {
        assert!(Comparison::LineSet.asserts_exit_code());
        assert!(!Comparison::CombinedTrimmed.asserts_exit_code());
    }

    #[test]
    fn test_combined_trimmed_mode() {
        assert!(Comparison::CombinedTrimmed.matches("2 2 2 5", "2 2 2 5\n", ""));
        assert!(Comparison::CombinedTrimmed.matches("Not found", "", "Not found\n"));
        assert!(!Comparison::CombinedTrimmed.matches("2 2 2 5", "2 2 2 6\n", ""));
        assert!(!Comparison::CombinedTrimmed.matches("not found", "", "Not found\n"));
    }
}
