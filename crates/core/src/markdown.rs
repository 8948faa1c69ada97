// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown output generation for benchmark reports.

use std::fmt::Write;

use crate::record::{format_ns_per_op, MeasurementRecord};
use crate::report::{Report, ReportLine};

/// Generate a markdown summary table from a report.
pub fn generate_summary(report: &Report) -> String {
    let mut output = String::new();

    writeln!(output, "# Benchmark Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Package: `{}`", report.import_path).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Generated: {}", report.generated_at.to_rfc3339()).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "## Results").unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "| Benchmark | Iterations | ns/op | MB/s | B/op | allocs/op |"
    )
    .unwrap();
    writeln!(
        output,
        "|-----------|-----------:|------:|-----:|-----:|----------:|"
    )
    .unwrap();

    let mut unparsed = Vec::new();
    for line in &report.results {
        match line {
            ReportLine::Measured(record) => writeln!(output, "{}", table_row(record)).unwrap(),
            ReportLine::Raw { line } => unparsed.push(line),
        }
    }

    if !unparsed.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "## Unparsed").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "```text").unwrap();
        for line in unparsed {
            writeln!(output, "{}", line).unwrap();
        }
        writeln!(output, "```").unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "---").unwrap();
    writeln!(output, "Total benchmarks: {}", report.results.len()).unwrap();
    writeln!(output, "Total time: {}", report.total).unwrap();

    output
}

fn table_row(record: &MeasurementRecord) -> String {
    fn cell<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    format!(
        "| {} | {} | {} | {} | {} | {} |",
        record.name,
        record.iterations,
        cell(record.ns_per_op.map(format_ns_per_op)),
        cell(record.mb_per_s.map(|v| format!("{:.2}", v))),
        cell(record.alloced_bytes_per_op),
        cell(record.allocs_per_op),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_generate_summary() {
        let report = Report {
            import_path: "example.com/pkg".into(),
            width: 10,
            results: vec![
                ReportLine::Measured(
                    MeasurementRecord::parse_line("BenchmarkA-4 100 123456.78 ns/op 64 B/op").unwrap(),
                ),
                ReportLine::Raw {
                    line: "BenchmarkB-4 skipped".into(),
                },
            ],
            total_ns: 2_000_000_000,
            total: "2s".into(),
            generated_at: Utc::now(),
        };

        let summary = generate_summary(&report);
        assert!(summary.contains("Package: `example.com/pkg`"));
        assert!(summary.contains("| BenchmarkA-4 | 100 | 123456 |  | 64 |  |"));
        assert!(summary.contains("## Unparsed"));
        assert!(summary.contains("BenchmarkB-4 skipped"));
        assert!(summary.contains("Total benchmarks: 2"));
        assert!(summary.contains("Total time: 2s"));
    }
}
