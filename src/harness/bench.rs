//! Benchmark driver for the bitmap program.
//!
//! For each grid size: generate a random grid, write it to a scratch file, time one invocation per
//! query (repeated `repeat` times), delete the scratch file. Afterwards the per-query medians are
//! handed to a [`ChartSink`] as one series per query.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use probe_core::{BitmapQuery, Fixture, Grid};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::HarnessError;
use super::invoker::Invoker;

/// Query order within one size.
pub const BENCH_QUERIES: [BitmapQuery; 3] = [BitmapQuery::Square, BitmapQuery::HLine, BitmapQuery::VLine];

/// Grid dimensions, written `ROWSxCOLS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

impl GridSize {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }
}

/// Default ascending sizes.
pub const DEFAULT_SIZES: [GridSize; 5] = [
    GridSize::new(100, 100),
    GridSize::new(200, 200),
    GridSize::new(300, 300),
    GridSize::new(400, 400),
    GridSize::new(500, 500),
];

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

impl FromStr for GridSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rows, cols) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("invalid grid size '{s}', expected ROWSxCOLS"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|e| format!("invalid grid size '{s}': {e}"))
        };
        Ok(GridSize::new(parse(rows)?, parse(cols)?))
    }
}

/// One timed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSample {
    pub size: GridSize,
    pub query: BitmapQuery,
    pub elapsed: Duration,
}

/// Median and population variance of the samples of one (size, query) pair, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub runs: usize,
    pub median_secs: f64,
    pub variance_secs: f64,
}

impl SampleStats {
    pub fn from_secs(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        let median_secs = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
        let variance_secs = sorted.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / sorted.len() as f64;
        Some(Self {
            runs: sorted.len(),
            median_secs,
            variance_secs,
        })
    }
}

/// All samples of a benchmark run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkReport {
    pub sizes: Vec<GridSize>,
    pub samples: Vec<BenchmarkSample>,
}

impl BenchmarkReport {
    pub fn stats(&self, size: GridSize, query: BitmapQuery) -> Option<SampleStats> {
        let secs: Vec<f64> = self
            .samples
            .iter()
            .filter(|s| s.size == size && s.query == query)
            .map(|s| s.elapsed.as_secs_f64())
            .collect();
        SampleStats::from_secs(&secs)
    }

    /// One series per query: x = size label, y = median seconds.
    pub fn chart(&self, program: &str) -> Chart {
        let series = BENCH_QUERIES
            .iter()
            .map(|&query| Series {
                label: query.keyword().to_string(),
                points: self
                    .sizes
                    .iter()
                    .filter_map(|&size| {
                        self.stats(size, query).map(|stats| Point {
                            x: size.to_string(),
                            y: stats.median_secs,
                        })
                    })
                    .collect(),
            })
            .collect();
        Chart {
            title: format!("Performance of {program} for different queries"),
            x_label: "Grid size (N x M)".to_string(),
            y_label: "Execution time (seconds)".to_string(),
            series,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<Point>,
}

/// Size-vs-time data handed to a plotting collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

/// Receives the finished chart.
pub trait ChartSink {
    fn emit(&mut self, chart: &Chart) -> Result<(), HarnessError>;
}

/// Persists the chart as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonChartSink {
    path: PathBuf,
}

impl JsonChartSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChartSink for JsonChartSink {
    fn emit(&mut self, chart: &Chart) -> Result<(), HarnessError> {
        let json = serde_json::to_string_pretty(chart)?;
        fs::write(&self.path, json).map_err(|source| HarnessError::Chart {
            path: self.path.clone(),
            source,
        })
    }
}

/// Scratch grid file, removed on drop.
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn create(path: PathBuf, contents: &str) -> Result<Self, HarnessError> {
        match fs::write(&path, contents) {
            Ok(()) => Ok(Self { path }),
            Err(source) => Err(HarnessError::Scratch { path, source }),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "scratch file deleted"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), "failed to delete scratch file: {e}"),
        }
    }
}

/// Times a bitmap program over generated grids.
pub struct BenchmarkDriver<I: Invoker> {
    invoker: I,
    program: PathBuf,
    scratch_dir: PathBuf,
    repeat: usize,
}

impl<I: Invoker> BenchmarkDriver<I> {
    pub fn new(invoker: I, program: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            invoker,
            program: program.into(),
            scratch_dir: scratch_dir.into(),
            repeat: 1,
        }
    }

    pub fn with_repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat.max(1);
        self
    }

    pub fn scratch_path(&self, size: GridSize) -> PathBuf {
        self.scratch_dir.join(format!("generated_{}_{}.txt", size.rows, size.cols))
    }

    /// Run every size in order and collect the samples.
    ///
    /// ## Errors
    /// - [`HarnessError::Scratch`] when the scratch file cannot be written.
    /// - [`HarnessError::Invoke`] when the program cannot be run; the scratch file is still removed.
    #[tracing::instrument(skip_all, fields(program = %self.program.display(), sizes = sizes.len(), repeat = self.repeat))]
    pub fn run<R: Rng + ?Sized>(&self, sizes: &[GridSize], rng: &mut R) -> Result<BenchmarkReport, HarnessError> {
        fs::create_dir_all(&self.scratch_dir).map_err(|source| HarnessError::Scratch {
            path: self.scratch_dir.clone(),
            source,
        })?;

        let mut report = BenchmarkReport {
            sizes: sizes.to_vec(),
            samples: Vec::with_capacity(sizes.len() * BENCH_QUERIES.len() * self.repeat),
        };

        for &size in sizes {
            let grid = Fixture::Grid(Grid::random(size.rows, size.cols, rng));
            let scratch = ScratchFile::create(self.scratch_path(size), &grid.serialize())?;
            tracing::info!(file = %scratch.path.display(), "benchmarking");
            let args_path = scratch.path.to_string_lossy().into_owned();

            for query in BENCH_QUERIES {
                let args = [query.keyword().to_string(), args_path.clone()];
                for _ in 0..self.repeat {
                    let start = Instant::now();
                    let result = self.invoker.invoke(&self.program, &args, "")?;
                    let elapsed = start.elapsed();
                    tracing::info!(
                        query = query.keyword(),
                        secs = elapsed.as_secs_f64(),
                        termination = ?result.termination,
                        "sample"
                    );
                    report.samples.push(BenchmarkSample { size, query, elapsed });
                }
            }
        }
        Ok(report)
    }
}

/// Run the driver and hand the chart to `sink`.
pub fn run_benchmark<I: Invoker, R: Rng + ?Sized>(
    driver: &BenchmarkDriver<I>,
    sizes: &[GridSize],
    rng: &mut R,
    sink: &mut dyn ChartSink,
) -> Result<BenchmarkReport, HarnessError> {
    let report = driver.run(sizes, rng)?;
    let chart = report.chart(&driver.program.display().to_string());
    sink.emit(&chart)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::harness::invoker::{InvocationResult, InvokeError, Termination};

    /// Records the arguments and whether the scratch file existed at call time.
    #[derive(Default)]
    struct RecordingInvoker {
        calls: RefCell<Vec<(Vec<String>, bool)>>,
        fail: bool,
    }

    impl Invoker for RecordingInvoker {
        fn invoke(&self, program: &Path, args: &[String], _input: &str) -> Result<InvocationResult, InvokeError> {
            let exists = Path::new(&args[1]).exists();
            self.calls.borrow_mut().push((args.to_vec(), exists));
            if self.fail {
                return Err(InvokeError::Launch {
                    program: program.display().to_string(),
                    source: io::Error::from(io::ErrorKind::PermissionDenied),
                });
            }
            Ok(InvocationResult {
                termination: Termination::Exited(0),
                stdout: "1 1 1 1\n".to_string(),
                stderr: String::new(),
                encoding_violation: false,
                elapsed: Duration::from_millis(1),
            })
        }
    }

    #[derive(Default)]
    struct MemorySink {
        charts: Vec<Chart>,
    }

    impl ChartSink for MemorySink {
        fn emit(&mut self, chart: &Chart) -> Result<(), HarnessError> {
            self.charts.push(chart.clone());
            Ok(())
        }
    }

    #[test]
    fn test_grid_size_parse_and_display() {
        assert_eq!("100x200".parse::<GridSize>().unwrap(), GridSize::new(100, 200));
        assert_eq!("3X4".parse::<GridSize>().unwrap().to_string(), "3x4");
        assert!("100".parse::<GridSize>().is_err());
        assert!("ax1".parse::<GridSize>().is_err());
    }

    #[test]
    fn test_stats_median_and_variance() {
        let stats = SampleStats::from_secs(&[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(stats.runs, 3);
        assert!((stats.median_secs - 2.0).abs() < 1e-12);
        assert!((stats.variance_secs - 2.0 / 3.0).abs() < 1e-12);

        let even = SampleStats::from_secs(&[1.0, 4.0]).unwrap();
        assert!((even.median_secs - 2.5).abs() < 1e-12);
        assert!(SampleStats::from_secs(&[]).is_none());
    }

    #[test]
    fn test_single_size_one_sample_per_query_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let driver = BenchmarkDriver::new(RecordingInvoker::default(), "./figsearch", dir.path());
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = MemorySink::default();

        let size = GridSize::new(100, 100);
        let report = run_benchmark(&driver, &[size], &mut rng, &mut sink).unwrap();

        assert_eq!(report.samples.len(), 3);
        let queries: Vec<BitmapQuery> = report.samples.iter().map(|s| s.query).collect();
        assert_eq!(queries, BENCH_QUERIES);
        assert!(!driver.scratch_path(size).exists());

        let calls = driver.invoker.calls.borrow();
        assert!(calls.iter().all(|(_, existed)| *existed));
        assert_eq!(calls[0].0[0], "square");

        assert_eq!(sink.charts.len(), 1);
        let chart = &sink.charts[0];
        assert_eq!(chart.series.len(), 3);
        assert!(chart.series.iter().all(|s| s.points.len() == 1 && s.points[0].x == "100x100"));
    }

    #[test]
    fn test_scratch_file_removed_when_invocation_fails() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = RecordingInvoker {
            fail: true,
            ..Default::default()
        };
        let driver = BenchmarkDriver::new(invoker, "./figsearch", dir.path());
        let mut rng = StdRng::seed_from_u64(2);

        let err = driver.run(&[GridSize::new(10, 10)], &mut rng).unwrap_err();
        assert!(err.is_fatal());
        assert!(!driver.scratch_path(GridSize::new(10, 10)).exists());
    }

    #[test]
    fn test_repeat_multiplies_samples() {
        let dir = tempfile::tempdir().unwrap();
        let driver = BenchmarkDriver::new(RecordingInvoker::default(), "./figsearch", dir.path()).with_repeat(3);
        let mut rng = StdRng::seed_from_u64(3);
        let sizes = [GridSize::new(5, 5), GridSize::new(6, 6)];
        let report = driver.run(&sizes, &mut rng).unwrap();
        assert_eq!(report.samples.len(), 2 * 3 * 3);
        assert_eq!(report.stats(sizes[1], BitmapQuery::VLine).unwrap().runs, 3);
    }

    #[test]
    fn test_json_sink_writes_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.json");
        let chart = BenchmarkReport::default().chart("./figsearch");
        JsonChartSink::new(&path).emit(&chart).unwrap();
        let parsed: Chart = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, chart);
    }
}
