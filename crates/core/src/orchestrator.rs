// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! The benchmark pipeline: discovery, isolated runs, normalization and
//! aggregation.
//!
//! Everything is sequential. The first fatal error stops the run; lines
//! already streamed stay written, but nothing further is reported and no
//! summary is emitted.

use std::io::Write;
use tracing::{debug, info, warn};

use crate::config::BenchConfig;
use crate::error::Result;
use crate::report::{Reporter, RunSummary};
use crate::resolver::PackageResolver;
use crate::runner::{RunResult, TestRunner};
use crate::scanner;

/// Runs every benchmark of one package, each in its own process.
pub struct Orchestrator<R, T> {
    config: BenchConfig,
    resolver: R,
    runner: T,
}

impl<R: PackageResolver, T: TestRunner> Orchestrator<R, T> {
    /// Create an orchestrator.
    pub fn new(config: BenchConfig, resolver: R, runner: T) -> Self {
        Self {
            config,
            resolver,
            runner,
        }
    }

    /// Run all benchmarks, writing the report to `out`.
    pub fn run<W: Write>(&self, out: W) -> Result<RunSummary> {
        self.runner.probe()?;

        let package = self.resolver.resolve(&self.config.target)?;
        let discovery = scanner::scan_files(&package.test_files)?;
        if discovery.is_empty() {
            warn!(
                import_path = %package.import_path,
                dir = %package.dir.display(),
                "no benchmarks found"
            );
        } else {
            debug!(
                import_path = %package.import_path,
                dir = %package.dir.display(),
                benchmarks = discovery.len(),
                "discovered benchmarks"
            );
        }

        let mut reporter = Reporter::new(
            out,
            self.config.format,
            package.import_path.as_str(),
            discovery.width,
        );
        for id in &discovery.ids {
            let output = self.runner.run(id, &package.import_path)?;
            let result = RunResult::from_output(id, &package.import_path, &output)?;
            info!(benchmark = %id, elapsed = ?result.elapsed, "benchmark finished");
            reporter.push(&result)?;
        }

        let summary = reporter.finish()?;
        debug_assert_eq!(summary.runs, discovery.len());
        Ok(summary)
    }
}
