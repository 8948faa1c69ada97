// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Package resolution.
//!
//! Maps a [`Target`] to the package's import path, its directory and the
//! test files to scan. Lookup follows GOPATH conventions: a package with
//! import path `p` lives in `<root>/src/p` for GOROOT or any GOPATH entry.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{SearchRoots, Target};
use crate::error::{BenchError, Result};

/// A resolved package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Import path, as printed in the go tool's trailer line.
    pub import_path: String,
    /// Package directory.
    pub dir: PathBuf,
    /// Test sources, sorted by file name.
    pub test_files: Vec<PathBuf>,
}

/// Resolves a target to a package.
#[cfg_attr(test, mockall::automock)]
pub trait PackageResolver {
    /// Resolve `target` to its import path and test files.
    fn resolve(&self, target: &Target) -> Result<Package>;
}

/// Resolver backed by GOROOT and GOPATH source trees.
#[derive(Debug, Clone)]
pub struct GopathResolver {
    roots: SearchRoots,
    cwd: PathBuf,
}

impl GopathResolver {
    /// Create a resolver; `cwd` anchors relative directory targets.
    pub fn new(roots: SearchRoots, cwd: impl Into<PathBuf>) -> Self {
        Self {
            roots,
            cwd: cwd.into(),
        }
    }

    /// Import path of a directory below one of the source roots.
    fn import_path_of(&self, dir: &Path) -> Result<String> {
        for src in self.roots.src_dirs() {
            // `dir` is canonical; roots may be symlinked.
            let src = fs::canonicalize(&src).unwrap_or(src);
            if let Ok(rel) = dir.strip_prefix(&src) {
                if rel.as_os_str().is_empty() {
                    continue;
                }
                let parts: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                return Ok(parts.join("/"));
            }
        }
        Err(BenchError::UnresolvedTarget(dir.to_path_buf()))
    }

    /// Directory holding `import_path`, first root wins.
    fn dir_of(&self, import_path: &str) -> Result<PathBuf> {
        let src_dirs = self.roots.src_dirs();
        for src in &src_dirs {
            let candidate = import_path
                .split('/')
                .fold(src.clone(), |acc, part| acc.join(part));
            if candidate.is_dir() {
                return Ok(candidate);
            }
        }
        let searched = src_dirs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(BenchError::UnknownImportPath {
            import_path: import_path.to_string(),
            searched,
        })
    }
}

impl PackageResolver for GopathResolver {
    fn resolve(&self, target: &Target) -> Result<Package> {
        let (import_path, dir) = match target {
            Target::CurrentDir => {
                let dir = canonical(&self.cwd)?;
                (self.import_path_of(&dir)?, dir)
            }
            Target::Dir(path) => {
                let dir = canonical(&self.cwd.join(path))?;
                (self.import_path_of(&dir)?, dir)
            }
            Target::ImportPath(import_path) => (import_path.clone(), self.dir_of(import_path)?),
        };

        let test_files = test_files(&dir)?;
        debug!(
            import_path = %import_path,
            dir = %dir.display(),
            files = test_files.len(),
            "resolved package"
        );
        Ok(Package {
            import_path,
            dir,
            test_files,
        })
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| BenchError::io(path, e))
}

/// Whether the go tool would compile `name` as a test file.
pub fn is_test_file(name: &str) -> bool {
    name.ends_with("_test.go") && !name.starts_with('_') && !name.starts_with('.')
}

/// Test files directly inside `dir`, sorted by name.
pub fn test_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| BenchError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BenchError::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !is_test_file(name) {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| BenchError::io(entry.path(), e))?;
        if file_type.is_dir() {
            continue;
        }
        files.push(entry.path());
    }
    files.sort();
    Ok(files)
}
