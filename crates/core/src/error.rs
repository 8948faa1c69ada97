// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for isobench.
//!
//! Every variant except [`BenchError::ParseLine`] is fatal: the orchestrator
//! stops at the first one and no summary is emitted.

use std::path::PathBuf;
use thiserror::Error;

use crate::duration::DurationError;

/// Errors that can occur while discovering, running or reporting benchmarks.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The external go tool could not be started.
    #[error("Cannot find the go tool {tool:?}: {source}")]
    ToolNotFound {
        /// Tool path or name as configured.
        tool: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The target directory is not below any package root.
    #[error("Cannot determine import path of {0}")]
    UnresolvedTarget(PathBuf),

    /// No package root contains the requested import path.
    #[error("Cannot find package {import_path:?} in any of: {searched}")]
    UnknownImportPath {
        /// Requested import path.
        import_path: String,
        /// Roots that were searched, joined for display.
        searched: String,
    },

    /// Settings could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source file or directory could not be read.
    #[error("{}: {source}", .path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The go tool exited with a non-zero status.
    #[error("go test {benchmark} failed ({status}):\n{output}")]
    ToolFailed {
        /// Benchmark being run.
        benchmark: String,
        /// Exit status description.
        status: String,
        /// Combined output of the failed run.
        output: String,
    },

    /// The go tool's combined output could not be collected.
    #[error("Cannot capture go test output: {0}")]
    Capture(#[source] std::io::Error),

    /// The output has fewer lines than a result line, `PASS` and a trailer.
    #[error("Unrecognized format of go test output:\n{output}")]
    UnrecognizedOutput {
        /// Raw output.
        output: String,
    },

    /// The output has enough lines but not the expected shape.
    #[error("Unexpected format of go test output ({reason}):\n{output}")]
    UnexpectedOutput {
        /// Which check failed.
        reason: String,
        /// Raw output.
        output: String,
    },

    /// The trailer's elapsed time is not a valid duration.
    #[error("Cannot parse benchmark duration ({source})\n{output}")]
    BadDuration {
        /// Raw output.
        output: String,
        /// Parse failure.
        #[source]
        source: DurationError,
    },

    /// A result line does not follow the benchmark line grammar.
    #[error("Unparsable benchmark line {line:?}: {reason}")]
    ParseLine {
        /// The offending line.
        line: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Writing the report failed.
    #[error("Cannot write report: {0}")]
    Report(#[from] std::io::Error),

    /// Serializing a structured report failed.
    #[error("Cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BenchError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BenchError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the orchestrator can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BenchError::ParseLine { .. })
    }
}

impl From<config::ConfigError> for BenchError {
    fn from(err: config::ConfigError) -> Self {
        BenchError::Config(err.to_string())
    }
}

/// Result type for isobench operations.
pub type Result<T> = std::result::Result<T, BenchError>;
