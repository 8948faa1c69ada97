// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Isolated Go benchmark runner.
//!
//! Benchmarks sharing one `go test` process influence each other: a
//! benchmark that stressed the heap leaves garbage-collector work behind for
//! the next one. This crate runs every benchmark of a package in its own
//! process, one after another, and prints the results in the same format as
//! `go test -bench`, so the output can be fed to benchcmp.
//!
//! # Quick Start
//!
//! ```no_run
//! use isobench_core::{run_benchmarks, BenchConfig, Target};
//!
//! let config = BenchConfig::default()
//!     .with_target(Target::parse(Some("github.com/cznic/lldb")))
//!     .with_benchmem(true);
//!
//! let summary = run_benchmarks(&config, std::env::current_dir()?, std::io::stdout())?;
//! eprintln!("{} benchmarks in {:?}", summary.runs, summary.total);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! - [`scanner`] - benchmark discovery in test sources
//! - [`resolver`] - target to package and test files
//! - [`runner`] - one `go test` process per benchmark
//! - [`record`] - result line parsing and formatting
//! - [`report`] - aggregation and report output
//! - [`orchestrator`] - the pipeline tying them together

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod duration;
pub mod error;
pub mod json;
pub mod markdown;
pub mod orchestrator;
pub mod record;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod scanner;

pub use config::{BenchConfig, OutputFormat, SearchRoots, Settings, Target};
pub use error::{BenchError, Result};
pub use orchestrator::Orchestrator;
pub use record::{Measured, MeasurementRecord};
pub use report::{Report, ReportLine, RunSummary};
pub use resolver::{GopathResolver, Package, PackageResolver};
pub use runner::{GoTestRunner, RunOutput, RunResult, TestRunner};
pub use scanner::{BenchmarkId, Discovery};

use std::io::Write;
use std::path::PathBuf;

/// Run every benchmark selected by `config` and write the report to `out`.
///
/// Relative directory targets are resolved against `cwd`. This wires the
/// GOPATH resolver and the `go test` runner into an [`Orchestrator`].
///
/// # Errors
///
/// Returns the first fatal [`BenchError`]; text output already written for
/// earlier benchmarks is left in place.
pub fn run_benchmarks<W: Write>(
    config: &BenchConfig,
    cwd: impl Into<PathBuf>,
    out: W,
) -> Result<RunSummary> {
    let resolver = GopathResolver::new(config.roots.clone(), cwd);
    let runner = GoTestRunner::new(&config.go, config.benchmem);
    Orchestrator::new(config.clone(), resolver, runner).run(out)
}
