// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measurement records.
//!
//! This module parses the go tool's benchmark result line into a
//! [`MeasurementRecord`] and renders records back as benchcmp-compatible
//! text.
//!
//! Result-line grammar:
//!
//! ```text
//! line       = name ws iterations { ws value ws unit }
//! name       = "Benchmark" { non-ws }
//! iterations = decimal integer
//! unit       = "ns/op" | "MB/s" | "B/op" | "allocs/op" | other
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

use crate::error::{BenchError, Result};

/// Leading name and iteration count of a result line.
static RESULT_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<name>\S+)\s+(?P<iterations>\S+)(?P<rest>(?:\s.*)?)$")
        .expect("valid result line pattern")
});

/// Which optional measurements a record carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Measured(u8);

impl Measured {
    /// No optional measurement.
    pub const NONE: Measured = Measured(0);
    /// `ns/op` present.
    pub const NS_PER_OP: Measured = Measured(1 << 0);
    /// `MB/s` present.
    pub const MB_PER_S: Measured = Measured(1 << 1);
    /// `B/op` present.
    pub const ALLOCED_BYTES_PER_OP: Measured = Measured(1 << 2);
    /// `allocs/op` present.
    pub const ALLOCS_PER_OP: Measured = Measured(1 << 3);

    /// Whether every flag in `other` is set.
    pub fn contains(self, other: Measured) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Measured {
    type Output = Measured;

    fn bitor(self, rhs: Measured) -> Measured {
        Measured(self.0 | rhs.0)
    }
}

/// One parsed benchmark result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Benchmark name as printed, including any `-<procs>` suffix.
    pub name: String,
    /// Iterations run.
    pub iterations: u64,
    /// Nanoseconds per iteration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns_per_op: Option<f64>,
    /// Throughput in MB/s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mb_per_s: Option<f64>,
    /// Bytes allocated per iteration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alloced_bytes_per_op: Option<u64>,
    /// Allocations per iteration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocs_per_op: Option<u64>,
    /// Which of the optional fields are present.
    pub measured: Measured,
}

impl MeasurementRecord {
    /// Create a record with no optional measurements.
    pub fn new(name: impl Into<String>, iterations: u64) -> Self {
        Self {
            name: name.into(),
            iterations,
            ns_per_op: None,
            mb_per_s: None,
            alloced_bytes_per_op: None,
            allocs_per_op: None,
            measured: Measured::NONE,
        }
    }

    /// Parse a result line.
    ///
    /// Fails when the line has fewer than two fields, the name does not
    /// start with `Benchmark`, or the iteration count is not an integer.
    /// Measurement pairs with an unknown unit or an unparsable value are
    /// ignored.
    pub fn parse_line(line: &str) -> Result<Self> {
        let reject = |reason: &str| BenchError::ParseLine {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let caps = RESULT_HEAD
            .captures(line)
            .ok_or_else(|| reject("two fields required"))?;
        let name = &caps["name"];
        if !name.starts_with("Benchmark") {
            return Err(reject("first field does not start with \"Benchmark\""));
        }
        let iterations: u64 = caps["iterations"]
            .parse()
            .map_err(|_| reject("iteration count is not an integer"))?;

        let mut record = MeasurementRecord::new(name, iterations);
        let fields: Vec<&str> = caps["rest"].split_whitespace().collect();
        for pair in fields.chunks_exact(2) {
            record.apply(pair[0], pair[1]);
        }
        Ok(record)
    }

    fn apply(&mut self, value: &str, unit: &str) {
        match unit {
            "ns/op" => {
                if let Ok(v) = value.parse::<f64>() {
                    self.ns_per_op = Some(v);
                    self.measured = self.measured | Measured::NS_PER_OP;
                }
            }
            "MB/s" => {
                if let Ok(v) = value.parse::<f64>() {
                    self.mb_per_s = Some(v);
                    self.measured = self.measured | Measured::MB_PER_S;
                }
            }
            "B/op" => {
                if let Ok(v) = value.parse::<u64>() {
                    self.alloced_bytes_per_op = Some(v);
                    self.measured = self.measured | Measured::ALLOCED_BYTES_PER_OP;
                }
            }
            "allocs/op" => {
                if let Ok(v) = value.parse::<u64>() {
                    self.allocs_per_op = Some(v);
                    self.measured = self.measured | Measured::ALLOCS_PER_OP;
                }
            }
            _ => {}
        }
    }

    /// Render as a benchcmp-compatible line, name padded to `width + 4`.
    pub fn to_line(&self, width: usize) -> String {
        let mut line = format!(
            "{:<name_width$}{:>15}",
            self.name,
            self.iterations,
            name_width = width + 4
        );
        if let Some(ns) = self.ns_per_op {
            line.push_str(&format!("{:>15} ns/op", format_ns_per_op(ns)));
        }
        if let Some(mbs) = self.mb_per_s {
            line.push_str(&format!("{:>15.2} MB/s", mbs));
        }
        if let Some(bytes) = self.alloced_bytes_per_op {
            line.push_str(&format!("{:>15} B/op", bytes));
        }
        if let Some(allocs) = self.allocs_per_op {
            line.push_str(&format!("{:>15} allocs/op", allocs));
        }
        line
    }
}

impl fmt::Display for MeasurementRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line(self.name.len()))
    }
}

/// Render ns/op with two decimals, dropping the last three characters when
/// the integer part has three or more digits.
///
/// This is truncation of the rendered text, not rounding: `123456.78`
/// becomes `123456` and `100.99` becomes `100`.
pub fn format_ns_per_op(ns: f64) -> String {
    let mut s = format!("{:.2}", ns);
    if matches!(s.find('.'), Some(dot) if dot > 2) {
        s.truncate(s.len() - 3);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_line() {
        let record = MeasurementRecord::parse_line(
            "BenchmarkEncode-4   \t  200000\t      7042 ns/op\t 145.39 MB/s\t    2048 B/op\t       3 allocs/op",
        )
        .unwrap();
        assert_eq!(record.name, "BenchmarkEncode-4");
        assert_eq!(record.iterations, 200000);
        assert_eq!(record.ns_per_op, Some(7042.0));
        assert_eq!(record.mb_per_s, Some(145.39));
        assert_eq!(record.alloced_bytes_per_op, Some(2048));
        assert_eq!(record.allocs_per_op, Some(3));
        assert!(record.measured.contains(
            Measured::NS_PER_OP
                | Measured::MB_PER_S
                | Measured::ALLOCED_BYTES_PER_OP
                | Measured::ALLOCS_PER_OP
        ));
    }

    #[test]
    fn test_parse_minimal_line() {
        let record = MeasurementRecord::parse_line("BenchmarkNop-8   1000000").unwrap();
        assert_eq!(record, MeasurementRecord::new("BenchmarkNop-8", 1_000_000));
        assert!(record.measured.is_empty());
        assert_eq!(record.to_line(12), format!("{:<16}{:>15}", "BenchmarkNop-8", 1_000_000));
    }

    #[test]
    fn test_parse_rejects() {
        for line in [
            "",
            "BenchmarkOnly",
            "TestFoo 100 5 ns/op",
            "BenchmarkFoo abc 5 ns/op",
            "BenchmarkFoo -1 5 ns/op",
        ] {
            let err = MeasurementRecord::parse_line(line).unwrap_err();
            assert!(err.is_recoverable(), "{line:?} should be recoverable");
        }
    }

    #[test]
    fn test_unknown_units_and_bad_values_are_ignored() {
        let record = MeasurementRecord::parse_line(
            "BenchmarkX-2 10 1.5 ns/op 9 widgets/op oops B/op 7",
        )
        .unwrap();
        assert_eq!(record.ns_per_op, Some(1.5));
        assert_eq!(record.alloced_bytes_per_op, None);
        assert_eq!(record.measured, Measured::NS_PER_OP);
    }

    #[test]
    fn test_ns_per_op_truncation() {
        assert_eq!(format_ns_per_op(123456.78), "123456");
        assert_eq!(format_ns_per_op(1068291.0), "1068291");
        assert_eq!(format_ns_per_op(100.0), "100");
        assert_eq!(format_ns_per_op(100.999), "101");
        assert_eq!(format_ns_per_op(12.34), "12.34");
        assert_eq!(format_ns_per_op(3.0), "3.00");
        assert_eq!(format_ns_per_op(99.5), "99.50");
    }

    #[test]
    fn test_to_line_layout() {
        let record = MeasurementRecord::parse_line(
            "Benchmark1-4   \t    2000\t   1068291 ns/op",
        )
        .unwrap();
        let line = record.to_line("Benchmark1".len());
        assert_eq!(
            line,
            format!("{:<14}{:>15}{:>15} ns/op", "Benchmark1-4", 2000, "1068291")
        );
        assert!(!line.contains("MB/s"));
        assert!(!line.contains("B/op"));
    }

    #[test]
    fn test_to_line_with_memory_stats() {
        let record = MeasurementRecord::parse_line(
            "BenchmarkAlloc-4 500 2500 ns/op 12.5 MB/s 64 B/op 2 allocs/op",
        )
        .unwrap();
        let line = record.to_line(14);
        assert!(line.ends_with(&format!(
            "{:>15} ns/op{:>15} MB/s{:>15} B/op{:>15} allocs/op",
            "2500", "12.50", 64, 2
        )));
    }

    #[test]
    fn test_record_serializes_only_present_fields() {
        let record = MeasurementRecord::parse_line("BenchmarkA 10 5 ns/op").unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "BenchmarkA");
        assert_eq!(json["measured"], 1);
        assert!(json.get("mb_per_s").is_none());
    }
}
