//! Harness configuration.
//!
//! Defaults come from [`HarnessConfig::default`], may be overridden from the environment with
//! [`HarnessConfig::from_env`], and finally by command-line flags through the `with_*` setters.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the per-case timeout, in milliseconds.
pub const TIMEOUT_ENV: &str = "PROBE_TIMEOUT_MS";
/// Conventional variable disabling colored output when set to a non-empty value.
pub const NO_COLOR_ENV: &str = "NO_COLOR";

/// How fixtures containing blank name or number lines are treated.
///
/// Whether a blank line is a valid zero-length field or a protocol violation is not settled by the
/// records protocol, so the choice is left to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BlankLinePolicy {
    /// Do not run the blank-line cases.
    #[default]
    Ignore,
    /// Blank fields are valid zero-length records.
    Record,
    /// The program must reject blank fields with a diagnostic.
    Reject,
}

/// Settings shared by every harness command.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Upper bound on a single invocation before it is killed
    pub timeout: Duration,
    /// Treatment of blank-line fixtures in the records suite
    pub blank_lines: BlankLinePolicy,
    /// Where `--save-logs` writes the test log
    pub log_path: PathBuf,
    /// Emit ANSI colors in the console report
    pub color: bool,
    /// Re-run bitmap queries with `--display` and print the program's rendering
    pub display: bool,
    /// Benchmark invocations per (size, query)
    pub repeat: usize,
    /// Directory for generated benchmark grids
    pub scratch_dir: PathBuf,
    /// Where the benchmark chart is written
    pub chart_path: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            blank_lines: BlankLinePolicy::Ignore,
            log_path: PathBuf::from("log.json"),
            color: true,
            display: false,
            repeat: 1,
            scratch_dir: PathBuf::from("target"),
            chart_path: PathBuf::from("benchmark_plot.json"),
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_lookup(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.timeout = Duration::from_millis(ms),
                _ => tracing::warn!("ignoring invalid {TIMEOUT_ENV}={raw:?}"),
            }
        }
        if lookup(NO_COLOR_ENV).is_some_and(|v| !v.is_empty()) {
            self.color = false;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_blank_lines(mut self, policy: BlankLinePolicy) -> Self {
        self.blank_lines = policy;
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    /// Set benchmark repetitions (at least one).
    pub fn with_repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat.max(1);
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_chart_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chart_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.blank_lines, BlankLinePolicy::Ignore);
        assert_eq!(config.log_path, PathBuf::from("log.json"));
        assert!(config.color);
        assert_eq!(config.repeat, 1);
        assert!(!config.display);
    }

    #[test]
    fn test_env_overrides() {
        let config = HarnessConfig::new().with_env_lookup(|key| match key {
            TIMEOUT_ENV => Some("250".to_string()),
            NO_COLOR_ENV => Some("1".to_string()),
            _ => None,
        });
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert!(!config.color);
    }

    #[test]
    fn test_invalid_env_timeout_is_ignored() {
        let config = HarnessConfig::new().with_env_lookup(|key| (key == TIMEOUT_ENV).then(|| "soon".to_string()));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_empty_no_color_keeps_color() {
        let config = HarnessConfig::new().with_env_lookup(|key| (key == NO_COLOR_ENV).then(String::new));
        assert!(config.color);
    }

    #[test]
    fn test_repeat_is_at_least_one() {
        assert_eq!(HarnessConfig::new().with_repeat(0).repeat, 1);
        assert_eq!(HarnessConfig::new().with_repeat(5).repeat, 5);
    }
}
