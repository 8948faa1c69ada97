// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run configuration.
//!
//! [`BenchConfig`] is the single, explicit configuration value handed to the
//! orchestrator. It is assembled once, from [`Settings`] (defaults, an
//! optional settings file and `ISOBENCH_*` environment variables) overridden
//! by whatever the caller supplies on the command line.
//!
//! # Example
//!
//! ```no_run
//! use isobench_core::config::{BenchConfig, Settings, Target};
//!
//! let settings = Settings::load(None)?;
//! let config = BenchConfig::from_settings(settings)
//!     .with_target(Target::parse(Some("github.com/cznic/lldb")))
//!     .with_benchmem(true);
//! # Ok::<(), isobench_core::BenchError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{BenchError, Result};

/// Default settings file name, looked up in the working directory.
pub const SETTINGS_FILE: &str = "isobench";

/// Prefix of environment variables overriding settings.
pub const ENV_PREFIX: &str = "ISOBENCH";

/// Default external tool.
pub const DEFAULT_GO: &str = "go";

/// What to benchmark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Target {
    /// The working directory.
    #[default]
    CurrentDir,
    /// A package directory given as a path.
    Dir(PathBuf),
    /// A package given by import path.
    ImportPath(String),
}

impl Target {
    /// Interpret an optional positional argument.
    ///
    /// No argument or `.` selects the working directory; arguments starting
    /// with `./`, `../` or `/` are directories; anything else is an import
    /// path.
    pub fn parse(arg: Option<&str>) -> Self {
        match arg {
            None | Some(".") => Target::CurrentDir,
            Some(p) if p.starts_with("./") || p.starts_with("../") || p == ".." => {
                Target::Dir(PathBuf::from(p))
            }
            Some(p) if Path::new(p).is_absolute() => Target::Dir(PathBuf::from(p)),
            Some(p) => Target::ImportPath(p.to_string()),
        }
    }
}

/// How the final report is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OutputFormat {
    /// `go test` style lines, streamed; benchcmp compatible.
    #[default]
    Text,
    /// One JSON document after all runs.
    Json,
    /// A markdown table after all runs.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(BenchError::Config(format!(
                "unknown output format {other:?} (expected text, json or markdown)"
            ))),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = BenchError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Layered settings: defaults, then a settings file, then environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// External go tool.
    #[serde(default = "default_go")]
    pub go: String,
    /// Request allocation statistics.
    #[serde(default)]
    pub benchmem: bool,
    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_go() -> String {
    DEFAULT_GO.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            go: default_go(),
            benchmem: false,
            format: OutputFormat::default(),
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// With `file` set, that file must exist. Otherwise an `isobench.*` file
    /// in the working directory is used when present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(SETTINGS_FILE).required(false),
        };

        let settings = config::Config::builder()
            .set_default("go", DEFAULT_GO)?
            .set_default("benchmem", false)?
            .set_default("format", OutputFormat::default().to_string())?
            .add_source(file_source)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Package roots searched when resolving import paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRoots {
    /// Go installation root, searched first.
    pub goroot: Option<PathBuf>,
    /// GOPATH entries in order.
    pub gopath: Vec<PathBuf>,
}

impl SearchRoots {
    /// Build from raw `GOROOT`, `GOPATH` and `HOME` values.
    ///
    /// An unset or empty GOPATH falls back to `$HOME/go`.
    pub fn from_env_values(
        goroot: Option<&std::ffi::OsStr>,
        gopath: Option<&std::ffi::OsStr>,
        home: Option<&std::ffi::OsStr>,
    ) -> Self {
        let goroot = goroot.filter(|v| !v.is_empty()).map(PathBuf::from);
        let mut entries: Vec<PathBuf> = gopath
            .map(|v| std::env::split_paths(v).filter(|p| !p.as_os_str().is_empty()).collect())
            .unwrap_or_default();
        if entries.is_empty() {
            if let Some(home) = home.filter(|v| !v.is_empty()) {
                entries.push(Path::new(home).join("go"));
            }
        }
        Self {
            goroot,
            gopath: entries,
        }
    }

    /// `src` directories of every root, GOROOT first.
    pub fn src_dirs(&self) -> Vec<PathBuf> {
        self.goroot
            .iter()
            .chain(self.gopath.iter())
            .map(|root| root.join("src"))
            .collect()
    }
}

/// Explicit configuration of one isobench run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// External go tool.
    pub go: PathBuf,
    /// Pass `-benchmem` to every run.
    pub benchmem: bool,
    /// Package to benchmark.
    pub target: Target,
    /// Where import paths are looked up.
    pub roots: SearchRoots,
    /// Report format.
    pub format: OutputFormat,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::from_settings(Settings::default())
    }
}

impl BenchConfig {
    /// Start from loaded settings.
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            go: PathBuf::from(settings.go),
            benchmem: settings.benchmem,
            target: Target::default(),
            roots: SearchRoots::default(),
            format: settings.format,
        }
    }

    /// Set the external go tool.
    pub fn with_go(mut self, go: impl Into<PathBuf>) -> Self {
        self.go = go.into();
        self
    }

    /// Enable or disable allocation statistics.
    pub fn with_benchmem(mut self, benchmem: bool) -> Self {
        self.benchmem = benchmem;
        self
    }

    /// Set the target package.
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Set the package roots.
    pub fn with_roots(mut self, roots: SearchRoots) -> Self {
        self.roots = roots;
        self
    }

    /// Set the report format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}
