// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark discovery.
//!
//! Benchmarks are found lexically: any line of a test file that starts a
//! top-level `func Benchmark...(` declaration names one benchmark. Nothing is
//! type-checked; a textual match is final.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{BenchError, Result};

/// Declaration grammar: `^func (Benchmark[^(]*)\(`.
///
/// Capture 1 is the identifier, up to but excluding the parameter list.
static DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^func (Benchmark[^(]*)\(").expect("valid declaration pattern"));

/// Name of one benchmark entry point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BenchmarkId(String);

impl BenchmarkId {
    /// Create a new benchmark ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the ID as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte length, as used for column alignment.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the name is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Anchored `-bench` pattern selecting exactly this benchmark.
    pub fn bench_pattern(&self) -> String {
        format!("^{}$", self.0)
    }
}

impl fmt::Display for BenchmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Benchmarks found in a set of sources, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Identifiers, files in supplied order and lines top to bottom.
    pub ids: Vec<BenchmarkId>,
    /// Longest identifier in bytes.
    pub width: usize,
}

impl Discovery {
    /// Append an identifier, keeping `width` current.
    pub fn push(&mut self, id: BenchmarkId) {
        self.width = self.width.max(id.len());
        self.ids.push(id);
    }

    /// Number of identifiers discovered.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing was discovered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Identifier declared on `line`, if it is a benchmark declaration.
pub fn declared_benchmark(line: &str) -> Option<BenchmarkId> {
    DECLARATION
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| BenchmarkId::new(m.as_str()))
}

/// Scan one source text, appending its benchmarks to `discovery`.
pub fn scan_source(source: &str, discovery: &mut Discovery) {
    for line in source.split('\n') {
        if let Some(id) = declared_benchmark(line) {
            discovery.push(id);
        }
    }
}

/// Scan source texts in order.
pub fn scan_sources<I, S>(sources: I) -> Discovery
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut discovery = Discovery::default();
    for source in sources {
        scan_source(source.as_ref(), &mut discovery);
    }
    discovery
}

/// Read and scan test files in order.
///
/// Any unreadable file aborts the scan; no partial discovery is returned.
pub fn scan_files<P: AsRef<Path>>(files: &[P]) -> Result<Discovery> {
    let mut discovery = Discovery::default();
    for path in files {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| BenchError::io(path, e))?;
        let before = discovery.len();
        scan_source(&String::from_utf8_lossy(&bytes), &mut discovery);
        debug!(
            file = %path.display(),
            found = discovery.len() - before,
            "scanned test file"
        );
    }
    Ok(discovery)
}
