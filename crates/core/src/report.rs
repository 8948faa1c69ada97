// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Aggregation and reporting.
//!
//! A [`Reporter`] folds every [`RunResult`] into a [`RunSummary`] and writes
//! the report. In text mode each benchmark's line is written as soon as it
//! is pushed, and the run ends with `go test`'s own footer:
//!
//! ```text
//! Benchmark1-4          2000        1068291 ns/op
//! Benchmark2-4           100       10067251 ns/op
//! PASS
//! ok  	github.com/cznic/bench	3.271s
//! ```
//!
//! JSON and markdown reports are rendered once, from the complete
//! [`Report`], by [`finish`](Reporter::finish).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;
use tracing::warn;

use crate::config::OutputFormat;
use crate::duration;
use crate::error::Result;
use crate::json;
use crate::markdown;
use crate::record::MeasurementRecord;
use crate::runner::{RunResult, PASS_MARKER};

/// Total elapsed time across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Sum of every run's reported elapsed time.
    pub total: Duration,
    /// Number of runs folded in.
    pub runs: usize,
}

impl RunSummary {
    /// Fold in one run's elapsed time.
    pub fn add(&mut self, elapsed: Duration) {
        self.total += elapsed;
        self.runs += 1;
    }

    /// Trailer line for `import_path`, in `go test` format.
    pub fn trailer(&self, import_path: &str) -> String {
        format!("ok  \t{}\t{}", import_path, duration::format(self.total))
    }
}

/// One benchmark's entry in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportLine {
    /// The result line parsed.
    Measured(MeasurementRecord),
    /// The result line did not parse and is kept verbatim.
    Raw {
        /// The line as printed by the tool.
        line: String,
    },
}

impl ReportLine {
    /// Normalize a result line, falling back to the raw text.
    pub fn from_result_line(line: &str) -> Self {
        match MeasurementRecord::parse_line(line) {
            Ok(record) => ReportLine::Measured(record),
            Err(err) => {
                warn!(error = %err, "passing result line through unparsed");
                ReportLine::Raw {
                    line: line.to_string(),
                }
            }
        }
    }

    /// Text rendering, records aligned to `width`.
    pub fn to_line(&self, width: usize) -> String {
        match self {
            ReportLine::Measured(record) => record.to_line(width),
            ReportLine::Raw { line } => line.clone(),
        }
    }
}

/// Complete results of one isobench run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Package benchmarked.
    pub import_path: String,
    /// Longest benchmark identifier, for alignment.
    pub width: usize,
    /// One entry per benchmark, in run order.
    pub results: Vec<ReportLine>,
    /// Sum of elapsed times, in nanoseconds.
    pub total_ns: u64,
    /// Sum of elapsed times, as `go test` prints it.
    pub total: String,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
}

/// Streams or buffers benchmark results into a report.
pub struct Reporter<W: Write> {
    out: W,
    format: OutputFormat,
    import_path: String,
    width: usize,
    results: Vec<ReportLine>,
    summary: RunSummary,
}

impl<W: Write> Reporter<W> {
    /// Create a reporter writing to `out`.
    pub fn new(out: W, format: OutputFormat, import_path: impl Into<String>, width: usize) -> Self {
        Self {
            out,
            format,
            import_path: import_path.into(),
            width,
            results: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    /// Add one run; its time counts whether or not its line parsed.
    pub fn push(&mut self, result: &RunResult) -> Result<()> {
        self.summary.add(result.elapsed);
        let line = ReportLine::from_result_line(&result.line);
        if self.format == OutputFormat::Text {
            writeln!(self.out, "{}", line.to_line(self.width))?;
            self.out.flush()?;
        }
        self.results.push(line);
        Ok(())
    }

    /// Write the footer or the buffered report.
    pub fn finish(mut self) -> Result<RunSummary> {
        match self.format {
            OutputFormat::Text => {
                writeln!(self.out, "{PASS_MARKER}")?;
                writeln!(self.out, "{}", self.summary.trailer(&self.import_path))?;
            }
            OutputFormat::Json => {
                let report = self.report();
                json::write_report(&report, &mut self.out)?;
            }
            OutputFormat::Markdown => {
                let report = self.report();
                self.out
                    .write_all(markdown::generate_summary(&report).as_bytes())?;
            }
        }
        self.out.flush()?;
        Ok(self.summary)
    }

    fn report(&self) -> Report {
        Report {
            import_path: self.import_path.clone(),
            width: self.width,
            results: self.results.clone(),
            total_ns: u64::try_from(self.summary.total.as_nanos()).unwrap_or(u64::MAX),
            total: duration::format(self.summary.total),
            generated_at: Utc::now(),
        }
    }
}
