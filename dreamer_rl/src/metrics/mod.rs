//! Metrics sinks for evaluation results.
//!
//! - [`ConsoleSink`]: stdout
//! - [`CsvSink`]: CSV file for analysis
//! - [`MemorySink`]: in-memory records, used by tests
//! - [`MultiSink`]: fan-out to several sinks

pub mod sink;

pub use sink::{single_metric, ConsoleSink, CsvSink, MemorySink, Metrics, MetricsSink, MultiSink};
