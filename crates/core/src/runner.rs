// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Isolated benchmark execution.
//!
//! Each benchmark gets its own `go test` process:
//!
//! ```text
//! go test -run NONE -bench ^<name>$ [-benchmem] <import-path>
//! ```
//!
//! The run blocks until the process exits. Its combined output must look
//! like a single-benchmark `go test` run:
//!
//! ```text
//! Benchmark1-4   	    2000	   1068291 ns/op
//! PASS
//! ok  	github.com/cznic/bench	2.250s
//! ```
//!
//! Anything else is fatal, and so is a non-zero exit.

use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use tracing::debug;

use crate::duration;
use crate::error::{BenchError, Result};
use crate::scanner::BenchmarkId;

/// Line the go tool prints after a passing run.
pub const PASS_MARKER: &str = "PASS";

/// Context lines newer toolchains print before the first result.
const CONTEXT_PREFIXES: [&str; 4] = ["goos:", "goarch:", "pkg:", "cpu:"];

/// Raw outcome of one external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// Whether the process exited successfully.
    pub success: bool,
    /// Human readable exit status.
    pub status: String,
    /// Standard output and standard error, in the order they were written.
    pub output: Vec<u8>,
}

impl RunOutput {
    /// A successful run with the given output.
    pub fn passed(output: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            status: "exit status: 0".to_string(),
            output: output.into(),
        }
    }

    /// A failed run with the given status and output.
    pub fn failed(status: impl Into<String>, output: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            status: status.into(),
            output: output.into(),
        }
    }

    fn from_process(status: ExitStatus, output: Vec<u8>) -> Self {
        Self {
            success: status.success(),
            status: status.to_string(),
            output,
        }
    }

    /// Output as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Validated result of one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// The benchmark's result line, verbatim.
    pub line: String,
    /// Elapsed time reported by the tool's trailer.
    pub elapsed: Duration,
}

impl RunResult {
    /// Validate the output of running `id` in package `import_path`.
    pub fn from_output(id: &BenchmarkId, import_path: &str, run: &RunOutput) -> Result<Self> {
        let text = run.text();
        if !run.success {
            return Err(BenchError::ToolFailed {
                benchmark: id.to_string(),
                status: run.status.clone(),
                output: text,
            });
        }

        let lines: Vec<&str> = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .skip_while(|l| CONTEXT_PREFIXES.iter().any(|p| l.starts_with(p)))
            .collect();
        if lines.len() < 3 {
            return Err(BenchError::UnrecognizedOutput {
                output: text.clone(),
            });
        }

        let unexpected = |reason: &str| BenchError::UnexpectedOutput {
            reason: reason.to_string(),
            output: text.clone(),
        };
        let trailer_prefix = format!("ok  \t{import_path}\t");
        if !lines[0].starts_with(id.as_str()) {
            return Err(unexpected("result line does not name the benchmark"));
        }
        if lines[1] != PASS_MARKER {
            return Err(unexpected("missing PASS"));
        }
        let Some(elapsed) = lines[2].strip_prefix(&trailer_prefix) else {
            return Err(unexpected("missing ok trailer for the package"));
        };

        let elapsed = duration::parse(elapsed).map_err(|source| BenchError::BadDuration {
            output: text.clone(),
            source,
        })?;

        Ok(Self {
            line: lines[0].to_string(),
            elapsed,
        })
    }
}

/// Runs one benchmark in a fresh process.
#[cfg_attr(test, mockall::automock)]
pub trait TestRunner {
    /// Check that the external tool can be started.
    fn probe(&self) -> Result<()>;

    /// Run exactly `id` in package `import_path`, blocking until it exits.
    fn run(&self, id: &BenchmarkId, import_path: &str) -> Result<RunOutput>;
}

/// [`TestRunner`] that invokes `go test`.
#[derive(Debug, Clone)]
pub struct GoTestRunner {
    go: PathBuf,
    benchmem: bool,
}

impl GoTestRunner {
    /// Create a runner for the given go tool.
    pub fn new(go: impl Into<PathBuf>, benchmem: bool) -> Self {
        Self {
            go: go.into(),
            benchmem,
        }
    }

    fn command(&self) -> Command {
        Command::new(&self.go)
    }

    fn not_found(&self, source: std::io::Error) -> BenchError {
        BenchError::ToolNotFound {
            tool: self.go.display().to_string(),
            source,
        }
    }
}

/// Arguments selecting exactly one benchmark and no tests.
pub fn test_args(id: &BenchmarkId, benchmem: bool, import_path: &str) -> Vec<String> {
    let mut args = vec![
        "test".to_string(),
        "-run".to_string(),
        "NONE".to_string(),
        "-bench".to_string(),
        id.bench_pattern(),
    ];
    if benchmem {
        args.push("-benchmem".to_string());
    }
    args.push(import_path.to_string());
    args
}

impl TestRunner for GoTestRunner {
    fn probe(&self) -> Result<()> {
        let output = self
            .command()
            .arg("version")
            .output()
            .map_err(|e| self.not_found(e))?;
        debug!(
            go = %self.go.display(),
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "found go tool"
        );
        Ok(())
    }

    fn run(&self, id: &BenchmarkId, import_path: &str) -> Result<RunOutput> {
        let args = test_args(id, self.benchmem, import_path);
        debug!(go = %self.go.display(), args = ?args, "running benchmark");

        // Both streams share one file description, so writes keep their order.
        let mut capture = tempfile::tempfile().map_err(BenchError::Capture)?;
        let stdout = capture.try_clone().map_err(BenchError::Capture)?;
        let stderr = capture.try_clone().map_err(BenchError::Capture)?;
        let status = self
            .command()
            .args(&args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|e| self.not_found(e))?;

        let mut output = Vec::new();
        capture
            .seek(SeekFrom::Start(0))
            .and_then(|_| capture.read_to_end(&mut output))
            .map_err(BenchError::Capture)?;
        Ok(RunOutput::from_process(status, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKG: &str = "github.com/cznic/bench";

    fn id(name: &str) -> BenchmarkId {
        BenchmarkId::new(name)
    }

    #[test]
    fn test_args_select_one_benchmark() {
        assert_eq!(
            test_args(&id("BenchmarkFoo"), false, PKG),
            vec!["test", "-run", "NONE", "-bench", "^BenchmarkFoo$", PKG]
        );
        assert_eq!(
            test_args(&id("BenchmarkFoo"), true, PKG),
            vec!["test", "-run", "NONE", "-bench", "^BenchmarkFoo$", "-benchmem", PKG]
        );
    }

    #[test]
    fn test_valid_output() {
        let run = RunOutput::passed(format!(
            "Benchmark1-4   \t    2000\t   1068291 ns/op\nPASS\nok  \t{PKG}\t2.250s\n"
        ));
        let result = RunResult::from_output(&id("Benchmark1"), PKG, &run).unwrap();
        assert_eq!(result.line, "Benchmark1-4   \t    2000\t   1068291 ns/op");
        assert_eq!(result.elapsed, Duration::from_millis(2250));
    }

    #[test]
    fn test_context_lines_are_skipped() {
        let run = RunOutput::passed(format!(
            "goos: linux\ngoarch: amd64\npkg: {PKG}\ncpu: Example CPU @ 2.00GHz\nBenchmark1-4 \t 10\t 5 ns/op\nPASS\nok  \t{PKG}\t0.912s\n"
        ));
        let result = RunResult::from_output(&id("Benchmark1"), PKG, &run).unwrap();
        assert_eq!(result.line, "Benchmark1-4 \t 10\t 5 ns/op");
        assert_eq!(result.elapsed, Duration::from_millis(912));
    }

    #[test]
    fn test_crlf_output() {
        let run = RunOutput::passed(format!(
            "Benchmark1-4 10 5 ns/op\r\nPASS\r\nok  \t{PKG}\t1s\r\n"
        ));
        let result = RunResult::from_output(&id("Benchmark1"), PKG, &run).unwrap();
        assert_eq!(result.elapsed, Duration::from_secs(1));
    }

    #[test]
    fn test_non_zero_exit_is_fatal() {
        let run = RunOutput::failed("exit status: 1", "--- FAIL: Benchmark1\nFAIL\n");
        let err = RunResult::from_output(&id("Benchmark1"), PKG, &run).unwrap_err();
        match err {
            BenchError::ToolFailed { benchmark, output, .. } => {
                assert_eq!(benchmark, "Benchmark1");
                assert!(output.contains("--- FAIL"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_too_few_lines() {
        let run = RunOutput::passed("Benchmark1-4 10 5 ns/op\nPASS");
        let err = RunResult::from_output(&id("Benchmark1"), PKG, &run).unwrap_err();
        assert!(matches!(err, BenchError::UnrecognizedOutput { .. }));
    }

    #[test]
    fn test_unexpected_shapes() {
        let cases = [
            format!("BenchmarkOther-4 10 5 ns/op\nPASS\nok  \t{PKG}\t1s\n"),
            format!("Benchmark1-4 10 5 ns/op\nFAIL\nok  \t{PKG}\t1s\n"),
            "Benchmark1-4 10 5 ns/op\nPASS\nok  \tgithub.com/other\t1s\n".to_string(),
        ];
        for output in cases {
            let run = RunOutput::passed(output.clone());
            let err = RunResult::from_output(&id("Benchmark1"), PKG, &run).unwrap_err();
            assert!(
                matches!(err, BenchError::UnexpectedOutput { .. }),
                "{output:?} gave {err}"
            );
        }
    }

    #[test]
    fn test_bad_duration() {
        let run = RunOutput::passed(format!("Benchmark1-4 10 5 ns/op\nPASS\nok  \t{PKG}\t(cached)\n"));
        let err = RunResult::from_output(&id("Benchmark1"), PKG, &run).unwrap_err();
        assert!(matches!(err, BenchError::BadDuration { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_keeps_stream_order() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let go = dir.path().join("go");
        std::fs::write(
            &go,
            "#!/bin/sh\necho \"--- FAIL: $5\"\necho 'panic: boom' >&2\necho FAIL\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&go, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = GoTestRunner::new(&go, false);
        let output = runner.run(&id("Benchmark1"), PKG).unwrap();
        assert!(!output.success);
        assert_eq!(output.text(), "--- FAIL: ^Benchmark1$\npanic: boom\nFAIL\n");
    }

    #[test]
    fn test_missing_tool() {
        let runner = GoTestRunner::new("/nonexistent/isobench/go", false);
        let err = runner.probe().unwrap_err();
        assert!(matches!(err, BenchError::ToolNotFound { .. }));
    }
}
