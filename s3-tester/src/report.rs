//! Benchmark results and their textual rendering.

use std::fmt;
use std::time::Duration;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, Table};

use crate::controller::{RunConfig, RunOutcome};
use crate::session::Operation;
use crate::size::HumanSize;
use crate::state::RunSamples;
use crate::stats::Summary;

/// Percentiles reported for latencies; higher is worse.
pub const LATENCY_PERCENTILES: [f64; 3] = [50.0, 90.0, 99.0];

/// Percentiles reported for throughput; lower is worse.
pub const THROUGHPUT_PERCENTILES: [f64; 3] = [50.0, 10.0, 1.0];

const BYTES_PER_MEGABYTE: f64 = 1_000_000.0;

/// The frozen outcome of a benchmark run.
#[derive(Clone, Debug)]
pub struct BenchmarkReport {
    /// Parameters of the run.
    pub config: RunConfig,
    /// All samples recorded by the workers.
    pub samples: RunSamples,
    /// Iterations that completed upload, download and delete.
    pub completed_iterations: u64,
    /// Iterations aborted by a failed operation.
    pub error_count: u64,
    /// Whether the run lasted its full duration.
    pub outcome: RunOutcome,
    /// Wall-clock time from spawning the first worker until the last one was joined.
    pub elapsed: Duration,
}

/// Statistics of one operation, in display units.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationStats {
    /// The measured operation.
    pub operation: Operation,
    /// Statistics over all successful executions of the operation.
    pub summary: Summary,
}

impl BenchmarkReport {
    /// Latency statistics in milliseconds for upload, download and delete.
    pub fn latency_stats(&self) -> Vec<OperationStats> {
        let samples = &self.samples;
        [
            (Operation::Upload, &samples.upload_latency),
            (Operation::Download, &samples.download_latency),
            (Operation::Delete, &samples.delete_latency),
        ]
        .into_iter()
        .map(|(operation, set)| OperationStats {
            operation,
            summary: set.summarize(&LATENCY_PERCENTILES),
        })
        .collect()
    }

    /// Throughput statistics in megabytes per second for upload and download.
    pub fn throughput_stats(&self) -> Vec<OperationStats> {
        let samples = &self.samples;
        [
            (Operation::Upload, &samples.upload_throughput),
            (Operation::Download, &samples.download_throughput),
        ]
        .into_iter()
        .map(|(operation, set)| OperationStats {
            operation,
            summary: set
                .summarize(&THROUGHPUT_PERCENTILES)
                .map(|bytes| bytes / BYTES_PER_MEGABYTE),
        })
        .collect()
    }

    fn title(&self, kind: &str) -> String {
        format!(
            "S3 Performance {kind} | {} VUs | {} seconds | {} file size",
            self.config.concurrency(),
            self.config.duration_secs(),
            HumanSize(self.config.payload_size()),
        )
    }

    /// Table of upload, download and delete latencies.
    pub fn latency_table(&self) -> Table {
        let rows = self
            .latency_stats()
            .into_iter()
            .map(|stats| {
                let label = match stats.operation {
                    Operation::Upload => "Upload Time",
                    Operation::Download => "Download",
                    Operation::Delete => "Delete",
                };
                row(label, &stats.summary, &LATENCY_PERCENTILES, 1)
            });

        table(
            [
                "Operation",
                "T min [ms]",
                "T max [ms]",
                "P50 [ms]",
                "P90 [ms]",
                "P99 [ms]",
                "Mean [ms]",
                "Std Dev [ms]",
            ],
            rows,
        )
    }

    /// Table of upload and download throughput.
    pub fn throughput_table(&self) -> Table {
        let rows = self
            .throughput_stats()
            .into_iter()
            .map(|stats| {
                let label = match stats.operation {
                    Operation::Upload => "Upload Speed",
                    _ => "Download Speed",
                };
                row(label, &stats.summary, &THROUGHPUT_PERCENTILES, 2)
            });

        table(
            [
                "Operation",
                "min [MB/s]",
                "max [MB/s]",
                "P50 [MB/s]",
                "P10 [MB/s]",
                "P1 [MB/s]",
                "Mean [MB/s]",
                "Std Dev [MB/s]",
            ],
            rows,
        )
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title("Times"))?;
        writeln!(f, "{}", self.latency_table())?;
        writeln!(f)?;
        writeln!(f, "{}", self.title("Speeds"))?;
        writeln!(f, "{}", self.throughput_table())
    }
}

fn row(label: &str, summary: &Summary, percentiles: &[f64], precision: usize) -> Vec<String> {
    let cell = |value: f64| format!("{value:.precision$}");

    let mut row = vec![label.to_owned(), cell(summary.min), cell(summary.max)];
    row.extend(
        percentiles
            .iter()
            .map(|&p| cell(summary.percentile(p).unwrap_or_default())),
    );
    row.push(cell(summary.mean));
    row.push(cell(summary.stddev));
    row
}

fn table(header: [&str; 8], rows: impl IntoIterator<Item = Vec<String>>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    for row in rows {
        table.add_row(row);
    }
    for column in table.column_iter_mut().skip(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

#[cfg(test)]
mod tests {
    use bytesize::ByteSize;

    use super::*;
    use crate::stats::SampleSet;

    fn report(samples: RunSamples) -> BenchmarkReport {
        BenchmarkReport {
            config: RunConfig::new(4, 10, ByteSize::kib(500)).unwrap(),
            samples,
            completed_iterations: 0,
            error_count: 0,
            outcome: RunOutcome::Completed,
            elapsed: Duration::from_secs(10),
        }
    }

    #[test]
    fn empty_report_renders_zeros() {
        let report = report(RunSamples::default());

        for stats in report.latency_stats().iter().chain(&report.throughput_stats()) {
            assert_eq!(stats.summary.count, 0);
            assert_eq!(stats.summary.max, 0.0);
            assert_eq!(stats.summary.stddev, 0.0);
        }

        let rendered = report.to_string();
        assert!(rendered.contains("S3 Performance Times | 4 VUs | 10 seconds | 500.00 KiB file size"));
        assert!(rendered.contains("S3 Performance Speeds | 4 VUs | 10 seconds | 500.00 KiB file size"));
        assert!(rendered.contains("Upload Time"));
        assert!(rendered.contains("Download Speed"));
        assert!(rendered.contains("0.0"));
        assert!(rendered.contains("0.00"));
    }

    #[test]
    fn throughput_is_scaled_to_megabytes() {
        let samples = RunSamples {
            upload_throughput: [2_000_000.0, 4_000_000.0].into_iter().collect(),
            ..Default::default()
        };
        let report = report(samples);

        let stats = report.throughput_stats();
        assert_eq!(stats[0].operation, Operation::Upload);
        assert_eq!(stats[0].summary.min, 2.0);
        assert_eq!(stats[0].summary.max, 4.0);
        assert_eq!(stats[0].summary.mean, 3.0);
        assert_eq!(stats[1].summary.count, 0);

        let table = report.throughput_table().to_string();
        assert!(table.contains("4.00"));
        assert!(table.contains("3.00"));
    }

    #[test]
    fn latency_rows_use_one_decimal() {
        let samples = RunSamples {
            delete_latency: SampleSet::from_iter([10.0, 20.0, 30.0]),
            ..Default::default()
        };
        let report = report(samples);

        let stats = report.latency_stats();
        let delete = &stats[2];
        assert_eq!(delete.operation, Operation::Delete);
        assert_eq!(delete.summary.percentile(50.0), Some(20.0));

        let cells = row("Delete", &delete.summary, &LATENCY_PERCENTILES, 1);
        assert_eq!(cells[0], "Delete");
        assert_eq!(cells[1], "10.0");
        assert_eq!(cells[2], "30.0");
        assert_eq!(cells[3], "20.0");
        assert_eq!(cells[6], "20.0");
    }
}
