//! Finding requirements files under the paths given on the command line.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, warn};

use crate::runtime::Runtime;

pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Directory names never descended into.
pub const EXCLUDED_DIRS: [&str; 4] = [".venv", "venv", "virtualenv", ".aws-sam"];

/// Walks directory trees depth-first, yielding `requirements.txt` files.
///
/// Entries are visited in name order. Symbolic links (to files or
/// directories) and excluded directories below a root are skipped. Directories
/// that cannot be listed are logged and skipped.
pub struct Discover<'a, R: Runtime + ?Sized> {
    runtime: &'a R,
    stack: Vec<PathBuf>,
}

impl<R: Runtime + ?Sized> Iterator for Discover<'_, R> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        while let Some(dir) = self.stack.pop() {
            let entries = match self.runtime.read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Cannot read directory {}: {:#}", dir.display(), e);
                    continue;
                }
            };

            let mut found = None;
            let mut subdirs = Vec::new();
            for entry in entries {
                if self.runtime.is_symlink(&entry) {
                    debug!("Skipping symlink {}", entry.display());
                    continue;
                }
                if self.runtime.is_dir(&entry) {
                    if !is_excluded(&entry) {
                        subdirs.push(entry);
                    }
                } else if entry.file_name().is_some_and(|n| n == REQUIREMENTS_FILE) {
                    found = Some(entry);
                }
            }

            self.stack.extend(subdirs.into_iter().rev());
            if found.is_some() {
                return found;
            }
        }
        None
    }
}

/// Lazily discovers requirements files under each root directory.
pub fn discover<'a, R: Runtime + ?Sized>(runtime: &'a R, roots: &[PathBuf]) -> Discover<'a, R> {
    Discover {
        runtime,
        stack: roots.iter().rev().cloned().collect(),
    }
}

fn is_excluded(dir: &Path) -> bool {
    dir.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

/// A problem with one command-line path. None of these stop the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathIssue {
    Missing(PathBuf),
    NotRequirementsFile { path: PathBuf, name: String },
    EmptyDirectory(PathBuf),
}

impl PathIssue {
    pub fn is_warning(&self) -> bool {
        matches!(self, PathIssue::EmptyDirectory(_))
    }
}

impl fmt::Display for PathIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathIssue::Missing(path) => write!(f, "Error: Path '{}' does not exist", path.display()),
            PathIssue::NotRequirementsFile { path, name } => write!(
                f,
                "Error: '{}' is not a requirements.txt file (found: {})",
                path.display(),
                name
            ),
            PathIssue::EmptyDirectory(path) => write!(
                f,
                "Warning: No requirements.txt files found in directory '{}'",
                path.display()
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResolvedFiles {
    pub roots: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
    pub issues: Vec<PathIssue>,
}

/// Turns command-line path arguments into the list of files to process.
///
/// No arguments, or a single `*`, means the working directory. Arguments
/// containing glob metacharacters are expanded. Explicit files must be named
/// `requirements.txt`.
#[tracing::instrument(skip(runtime))]
pub fn resolve_paths<R: Runtime + ?Sized>(runtime: &R, args: &[String]) -> Result<ResolvedFiles> {
    let mut resolved = ResolvedFiles {
        roots: expand_args(runtime, args)?,
        ..ResolvedFiles::default()
    };

    for root in resolved.roots.clone() {
        if !runtime.exists(&root) {
            resolved.issues.push(PathIssue::Missing(root));
        } else if runtime.is_dir(&root) {
            let before = resolved.files.len();
            resolved.files.extend(discover(runtime, std::slice::from_ref(&root)));
            if resolved.files.len() == before {
                resolved.issues.push(PathIssue::EmptyDirectory(root));
            }
        } else {
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if name == REQUIREMENTS_FILE {
                resolved.files.push(root);
            } else {
                resolved.issues.push(PathIssue::NotRequirementsFile { path: root, name });
            }
        }
    }

    debug!("Resolved {} requirements file(s)", resolved.files.len());
    Ok(resolved)
}

fn expand_args<R: Runtime + ?Sized>(runtime: &R, args: &[String]) -> Result<Vec<PathBuf>> {
    let args: Vec<&str> = args.iter().map(|a| a.trim()).filter(|a| !a.is_empty()).collect();
    if args.is_empty() || args == ["*"] {
        return Ok(vec![runtime.current_dir()?]);
    }

    let mut roots = Vec::new();
    for arg in args {
        if !has_glob_metachars(arg) {
            roots.push(PathBuf::from(arg));
            continue;
        }
        let matched: Vec<PathBuf> = match glob::glob(arg) {
            Ok(paths) => paths.filter_map(|p| p.ok()).collect(),
            Err(e) => {
                warn!("Invalid pattern '{}': {}", arg, e);
                Vec::new()
            }
        };
        if matched.is_empty() {
            roots.push(PathBuf::from(arg));
        } else {
            roots.extend(matched);
        }
    }
    Ok(roots)
}

fn has_glob_metachars(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}
