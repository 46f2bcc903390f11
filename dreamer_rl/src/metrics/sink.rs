//! Metrics sinks.
//!
//! A sink accepts named scalar metrics tagged with a step index, plus plain
//! text lines. The evaluation loop writes its summary through
//! [`MetricsSink`]; which backends receive it is the caller's choice.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Metric name to scalar value.
pub type Metrics = BTreeMap<String, f64>;

/// Backend receiving metrics and text lines.
pub trait MetricsSink {
    /// Record metrics at the given step.
    fn log_metrics(&mut self, metrics: &Metrics, step: u64);

    /// Emit a plain-text line.
    fn print(&mut self, line: &str);
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn log_metrics(&mut self, metrics: &Metrics, step: u64) {
        (**self).log_metrics(metrics, step)
    }

    fn print(&mut self, line: &str) {
        (**self).print(line)
    }
}

/// Build a [`Metrics`] map with a single entry.
pub fn single_metric(name: impl Into<String>, value: f64) -> Metrics {
    let mut metrics = Metrics::new();
    metrics.insert(name.into(), value);
    metrics
}

/// Sink printing to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Create a new console sink.
    pub fn new() -> Self {
        Self
    }
}

impl MetricsSink for ConsoleSink {
    fn log_metrics(&mut self, metrics: &Metrics, step: u64) {
        for (name, value) in metrics {
            println!("{:>8} {:<32} {:>12.4}", step, name, value);
        }
    }

    fn print(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Long-format CSV file sink: one `step,name,value` row per metric.
///
/// Text lines are forwarded to the `log` facade.
pub struct CsvSink {
    writer: BufWriter<File>,
    wrote_header: bool,
}

impl CsvSink {
    /// Create the CSV file, truncating an existing one.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV file
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            wrote_header: false,
        })
    }

    /// Flush buffered rows.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn write_rows(&mut self, metrics: &Metrics, step: u64) -> io::Result<()> {
        if !self.wrote_header {
            writeln!(self.writer, "step,name,value")?;
            self.wrote_header = true;
        }
        for (name, value) in metrics {
            writeln!(self.writer, "{},{},{}", step, name, value)?;
        }
        Ok(())
    }
}

impl MetricsSink for CsvSink {
    fn log_metrics(&mut self, metrics: &Metrics, step: u64) {
        if let Err(e) = self.write_rows(metrics, step) {
            log::warn!("failed to write metrics row: {}", e);
        }
    }

    fn print(&mut self, line: &str) {
        log::info!("{}", line);
    }
}

impl Drop for CsvSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Sink keeping everything in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    /// Recorded `(step, metrics)` pairs in arrival order.
    pub records: Vec<(u64, Metrics)>,
    /// Printed lines in arrival order.
    pub lines: Vec<String>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent value of a metric.
    pub fn last(&self, name: &str) -> Option<(u64, f64)> {
        self.records
            .iter()
            .rev()
            .find_map(|(step, metrics)| metrics.get(name).map(|&v| (*step, v)))
    }
}

impl MetricsSink for MemorySink {
    fn log_metrics(&mut self, metrics: &Metrics, step: u64) {
        self.records.push((step, metrics.clone()));
    }

    fn print(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Sink forwarding to several backends.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn MetricsSink>>,
}

impl MultiSink {
    /// Create an empty fan-out sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    pub fn add<S: MetricsSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Number of backends.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// True when no backend was added.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl MetricsSink for MultiSink {
    fn log_metrics(&mut self, metrics: &Metrics, step: u64) {
        for sink in &mut self.sinks {
            sink.log_metrics(metrics, step);
        }
    }

    fn print(&mut self, line: &str) {
        for sink in &mut self.sinks {
            sink.print(line);
        }
    }
}
