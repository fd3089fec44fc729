//! Records protocol catalog.
//!
//! The program reads alternating name/number lines from stdin, takes an optional digit query, and
//! prints every matching record as `name, number` or `Not found`. Extension tiers add `-s`
//! (subsequence search) and `-l L` (allowed interruptions).

use probe_core::{Fixture, Record};

use crate::config::BlankLinePolicy;
use crate::harness::case::TestCase;

/// Highest extension tier understood by [`records_suite`].
pub const MAX_BONUS: u8 = 2;

pub fn base_input() -> Fixture {
    Fixture::records([
        ("Petr Dvorak", "603123456"),
        ("Jana Novotna", "777987654"),
        ("Bedrich Smetana ml.", "541141120"),
        ("xxx+a+xxxxx", "213344"),
        ("Karel Spacek", "+420213333333"),
        ("aekaeeabbaeaebaeab", "892"),
    ])
}

fn too_long_name() -> Fixture {
    Fixture::records([("X".repeat(101), "1".to_string())])
}

fn too_long_number() -> Fixture {
    Fixture::records([("X".to_string(), "1".repeat(101))])
}

fn max_contacts(count: usize) -> Fixture {
    Fixture::Records((0..count).map(|i| Record::new(format!("aa{i}aa"), "25235453")).collect())
}

fn first_bonus_input() -> Fixture {
    Fixture::records([
        ("xAxxxxBC", "123044312"),
        ("xxxABDxx", "3023296827"),
        ("xxOxxKxxOKxxxxZ", "00114322"),
        ("xmxvxxkxmxjxmxxxvxxtxxxm", "90010008"),
    ])
}

fn second_bonus_input() -> Fixture {
    Fixture::records([("Roman Orsag", "432923843")])
}

/// Build the ordered case list for the requested extension tier.
///
/// ## Parameters
/// - `bonus`: `0` for the base catalog, `1` adds `-s` cases, `2` adds `-l` cases as well.
/// - `blank_lines`: whether and how the blank-line cases run.
pub fn records_suite(bonus: u8, blank_lines: BlankLinePolicy) -> Vec<TestCase> {
    let base = base_input();
    let mut cases = vec![
        TestCase::expect_records("Assignment example #1", &[], base.clone(), &[1, 2, 3, 4, 5, 6]),
        TestCase::expect_records("Assignment example #2", &["12"], base.clone(), &[1, 3]),
        TestCase::expect_records("Assignment example #3", &["686"], base.clone(), &[2]),
        TestCase::expect_records("Assignment example #4", &["38"], base.clone(), &[1, 3]),
        TestCase::expect_records("Assignment example #5", &["111"], base.clone(), &[]),
        TestCase::expect_records("Standard solution #1", &["020"], base.clone(), &[4]),
        TestCase::expect_records("Standard solution #2", &["0420"], base.clone(), &[5]),
        TestCase::expect_records("Standard solution #3", &["232"], base.clone(), &[6]),
        TestCase::expect_records("Standard solution #4", &["779"], base.clone(), &[2]),
        TestCase::expect_records(
            "Maximum contact count #1",
            &[],
            max_contacts(42),
            &(1..=42).collect::<Vec<_>>(),
        ),
        TestCase::crash_tolerant("Maximum contact count #2", &[], max_contacts(50)),
        TestCase::crash_tolerant("Line length #1", &[], too_long_name()),
        TestCase::crash_tolerant("Line length #2", &[], too_long_number()),
    ];

    cases.extend(blank_line_cases(blank_lines));

    cases.extend([
        TestCase::expect_failure("Arguments #1", &["tf"], base.clone()),
        TestCase::expect_failure("Arguments #2", &["t00f"], base.clone()),
        TestCase::expect_failure("Arguments #3", &["1231", "ff", "pp"], base),
    ]);

    if bonus >= 1 {
        let input = first_bonus_input();
        cases.extend([
            TestCase::expect_records("First extension #1", &["-s", "222"], input.clone(), &[1, 2]),
            TestCase::expect_records("First extension #2", &["-s", "226"], input.clone(), &[2]),
            TestCase::expect_records("First extension #3", &["-s", "223"], input.clone(), &[2]),
            TestCase::expect_records("First extension #4", &["-s", "892"], input.clone(), &[]),
            TestCase::expect_records("First extension #5", &["-s", "659"], input.clone(), &[3, 4]),
            TestCase::expect_records("First extension #6", &["-s", "688"], input.clone(), &[4]),
            TestCase::expect_records("First extension #7", &["-s", "981"], input.clone(), &[]),
            TestCase::expect_failure("Option -s #1", &["892", "-s"], input),
        ]);
    }

    if bonus >= 2 {
        let input = second_bonus_input();
        cases.extend([
            TestCase::expect_records("Second extension #1", &["62", "-l", "1"], input.clone(), &[1]),
            TestCase::expect_records("Second extension #2", &["602", "-l", "1"], input.clone(), &[1]),
            TestCase::expect_records("Second extension #3", &["6620", "-l", "1"], input.clone(), &[1]),
            TestCase::expect_records("Second extension #4", &["6020", "-l", "1"], input.clone(), &[]),
            TestCase::expect_records("Second extension #5", &["6020", "-l", "2"], input.clone(), &[1]),
            TestCase::expect_records("Second extension #6", &["626", "-l", "1"], input.clone(), &[1]),
            TestCase::expect_records("Second extension #7", &["626", "-l", "1"], input.clone(), &[1]),
            TestCase::expect_records("Second extension #8", &["662", "-l", "0"], input.clone(), &[1]),
            TestCase::expect_records("Second extension #9", &["660", "-l", "0"], input.clone(), &[]),
            TestCase::expect_failure("Option -l #1", &["-l", "tf"], input.clone()),
            TestCase::expect_failure("Option -l #2", &["-l", "t00f"], input.clone()),
            TestCase::expect_failure("Option -l #3", &["-l"], input.clone()),
            TestCase::expect_records("Option -l #4", &["-l", "0", "662"], input, &[1]),
        ]);
    }

    cases
}

fn blank_line_cases(policy: BlankLinePolicy) -> Vec<TestCase> {
    let blank_name = Fixture::records([("", "1")]);
    let blank_number = Fixture::records([("X", "")]);
    match policy {
        BlankLinePolicy::Ignore => Vec::new(),
        BlankLinePolicy::Record => vec![
            TestCase::expect_records("Blank line #1", &[], blank_name, &[1]),
            TestCase::expect_records("Blank line #2", &[], blank_number, &[1]),
        ],
        BlankLinePolicy::Reject => vec![
            TestCase::expect_failure("Blank line #1", &[], blank_name),
            TestCase::expect_failure("Blank line #2", &[], blank_number),
        ],
    }
}
