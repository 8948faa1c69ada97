//! CLI for isobench.
//!
//! This crate provides the `isobench` command: run every benchmark of a Go
//! package in its own `go test` process and print benchcmp-compatible
//! results.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use isobench_core::{BenchConfig, OutputFormat, SearchRoots, Settings, Target};
use std::env;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// isobench CLI.
#[derive(Parser, Debug)]
#[command(name = "isobench")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Benchmarks are run one by one, each in a fresh `go test` process. \
Correctness tests are never run.")]
pub struct Cli {
    /// Print memory allocation statistics for benchmarks.
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub benchmem: Option<bool>,

    /// Go tool used to run the benchmarks.
    #[arg(long, value_name = "PATH")]
    pub go: Option<PathBuf>,

    /// Report format: text, json or markdown.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Settings file (default: isobench.toml in the working directory, if present).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log progress to stderr; repeat for debug output.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Import path or directory of the package; defaults to the working directory.
    #[arg(value_name = "PACKAGE")]
    pub package: Option<String>,
}

impl Cli {
    /// Build the run configuration: settings first, then command-line flags.
    pub fn bench_config(&self, roots: SearchRoots) -> anyhow::Result<BenchConfig> {
        let settings = Settings::load(self.config.as_deref()).context("Cannot load settings")?;

        let mut config = BenchConfig::from_settings(settings)
            .with_target(Target::parse(self.package.as_deref()))
            .with_roots(roots);
        if let Some(benchmem) = self.benchmem {
            config = config.with_benchmem(benchmem);
        }
        if let Some(go) = &self.go {
            config = config.with_go(go);
        }
        if let Some(format) = self.format {
            config = config.with_format(format);
        }
        Ok(config)
    }
}

/// Accept the go tool's single-dash spelling of `-benchmem`, with or
/// without `=value`.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(flag) if flag == "-benchmem" || flag.starts_with("-benchmem=") => {
                OsString::from(format!("-{flag}"))
            }
            _ => arg,
        })
        .collect()
}

/// Package roots from `GOROOT`, `GOPATH` and `HOME`.
pub fn roots_from_env() -> SearchRoots {
    SearchRoots::from_env_values(
        env::var_os("GOROOT").as_deref(),
        env::var_os("GOPATH").as_deref(),
        env::var_os("HOME").as_deref(),
    )
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` after the summary has been printed, or the first fatal
/// error.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_from(normalize_args(env::args_os()));

    // .env may carry GOPATH, RUST_LOG or ISOBENCH_* settings.
    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    let config = cli.bench_config(roots_from_env())?;
    tracing::debug!(?config, "starting");

    let cwd = env::current_dir().context("Cannot determine the working directory")?;
    let stdout = io::stdout().lock();
    isobench_core::run_benchmarks(&config, cwd, stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from))).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_go_style_benchmem_flag() {
        let cli = parse(&["isobench", "-benchmem", "github.com/cznic/lldb"]);
        assert_eq!(cli.benchmem, Some(true));
        assert_eq!(cli.package.as_deref(), Some("github.com/cznic/lldb"));

        assert_eq!(parse(&["isobench", "-benchmem=true"]).benchmem, Some(true));
        assert_eq!(parse(&["isobench", "-benchmem=false"]).benchmem, Some(false));
        assert_eq!(parse(&["isobench", "--benchmem=0"]).benchmem, Some(false));
        assert_eq!(parse(&["isobench"]).benchmem, None);
        assert!(Cli::try_parse_from(normalize_args(
            ["isobench", "-benchmem=maybe"].iter().map(OsString::from)
        ))
        .is_err());
    }

    #[test]
    fn test_benchmem_false_overrides_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("isobench.toml");
        std::fs::write(&settings, "benchmem = true\n").unwrap();
        let settings = settings.to_string_lossy().into_owned();

        let cli = parse(&["isobench", "--config", &settings]);
        assert!(cli.bench_config(SearchRoots::default()).unwrap().benchmem);

        let cli = parse(&["isobench", "--config", &settings, "-benchmem=false"]);
        assert!(!cli.bench_config(SearchRoots::default()).unwrap().benchmem);
    }

    #[test]
    fn test_at_most_one_package() {
        let result = Cli::try_parse_from(["isobench", "a", "b"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_format_flag() {
        let cli = parse(&["isobench", "--format", "json"]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(Cli::try_parse_from(["isobench", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_flags_override_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("isobench.toml");
        std::fs::write(&settings, "go = \"/opt/go/bin/go\"\nformat = \"markdown\"\n").unwrap();
        let settings = settings.to_string_lossy().into_owned();

        let cli = parse(&["isobench", "--config", &settings, "--format", "text", "--benchmem"]);
        let config = cli.bench_config(SearchRoots::default()).unwrap();
        assert_eq!(config.go, PathBuf::from("/opt/go/bin/go"));
        assert_eq!(config.format, OutputFormat::Text);
        assert!(config.benchmem);
        assert_eq!(config.target, Target::CurrentDir);
    }
}
