//! Applies one edit operation across many requirements files.
//!
//! Every file is read, transformed and (outside preview mode) written before
//! the next one is touched. Per-file failures are recorded in the result and
//! never stop the run. The only call to [`Runtime::write`] is gated on the
//! preview flag, so a preview cannot modify the filesystem.

use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::diff::{full_context_diff, render_plain};
use crate::requirements::{Collator, Document, EditStatus, Operation};
use crate::runtime::Runtime;

#[derive(Debug, Error)]
pub enum FileEditError {
    #[error("Failed to read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("{} is read-only, skipping file modification", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Failed to write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

/// The outcome for one file.
#[derive(Debug)]
pub struct FileEditResult {
    pub path: PathBuf,
    pub changed: bool,
    pub status: Option<EditStatus>,
    pub description: String,
    /// Full-context diff of the change, present whenever `changed`.
    pub diff: Option<String>,
    pub error: Option<FileEditError>,
    written: bool,
}

impl FileEditResult {
    fn failed(path: &Path, error: FileEditError) -> Self {
        Self {
            path: path.to_path_buf(),
            changed: false,
            status: None,
            description: error.to_string(),
            diff: None,
            error: Some(error),
            written: false,
        }
    }

    /// True if the new content reached the disk.
    pub fn was_written(&self) -> bool {
        self.written
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    #[cfg(test)]
    pub(crate) fn for_test(path: PathBuf, status: EditStatus) -> Self {
        Self {
            path,
            changed: status == EditStatus::Applied,
            status: Some(status),
            description: String::new(),
            diff: None,
            error: None,
            written: status == EditStatus::Applied,
        }
    }
}

/// Runs `operation` over `files` in order, returning one result per file.
#[tracing::instrument(skip(runtime, files))]
pub fn apply<R: Runtime + ?Sized>(
    runtime: &R,
    operation: &Operation,
    files: impl IntoIterator<Item = PathBuf>,
    preview: bool,
) -> Vec<FileEditResult> {
    let collator = operation.collator();
    files
        .into_iter()
        .map(|path| apply_one(runtime, operation, &collator, &path, preview))
        .collect()
}

fn apply_one<R: Runtime + ?Sized>(
    runtime: &R,
    operation: &Operation,
    collator: &Collator,
    path: &Path,
    preview: bool,
) -> FileEditResult {
    let original = match runtime.read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Skipping {}: {:#}", path.display(), e);
            return FileEditResult::failed(
                path,
                FileEditError::Read {
                    path: path.to_path_buf(),
                    reason: format!("{:#}", e),
                },
            );
        }
    };

    let document = Document::parse(&original);
    let outcome = operation.run(document.lines(), collator);
    debug!("{}: {}", path.display(), outcome.description);

    let mut result = FileEditResult {
        path: path.to_path_buf(),
        changed: outcome.changed,
        status: Some(outcome.status),
        description: outcome.description,
        diff: None,
        error: None,
        written: false,
    };
    if !outcome.changed {
        return result;
    }

    let updated = document.with_lines(outcome.lines).render();
    result.diff = Some(render_plain(&full_context_diff(&original, &updated)));

    if preview {
        return result;
    }

    match runtime.write(path, &updated) {
        Ok(()) => result.written = true,
        Err(e) if is_permission_denied(&e) => {
            result.error = Some(FileEditError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            warn!("Failed to write {}: {:#}", path.display(), e);
            result.error = Some(FileEditError::Write {
                path: path.to_path_buf(),
                reason: format!("{:#}", e),
            });
        }
    }
    result
}

fn is_permission_denied(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|e| e.kind() == io::ErrorKind::PermissionDenied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::{Edit, PackageName, SortOptions};
    use crate::runtime::MockRuntime;
    use anyhow::anyhow;
    use mockall::predicate::eq;

    fn remove(name: &str) -> Operation {
        Operation::new(Edit::Remove {
            name: PackageName::parse(name).unwrap(),
        })
    }

    fn update(name: &str, spec: &str) -> Operation {
        Operation::new(Edit::Update {
            name: PackageName::parse(name).unwrap(),
            specifier: spec.to_string(),
        })
    }

    fn permission_denied() -> anyhow::Error {
        anyhow::Error::new(io::Error::from(io::ErrorKind::PermissionDenied))
            .context("Failed to write file")
    }

    #[test]
    fn test_preview_never_writes() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("django==3.2\nflask\n".to_string()));
        runtime.expect_write().never();

        let files = vec![PathBuf::from("a/requirements.txt"), PathBuf::from("b/requirements.txt")];
        for operation in [
            remove("django"),
            update("django", "4.2"),
            Operation::new(Edit::Sort),
            Operation::new(Edit::Add {
                name: PackageName::parse("attrs").unwrap(),
                specifier: None,
                extras: Vec::new(),
            }),
        ] {
            let results = apply(&runtime, &operation, files.clone(), true);
            assert_eq!(results.len(), 2);
            assert!(results.iter().all(|r| !r.was_written()));
        }
    }

    #[test]
    fn test_preview_diff_matches_written_change() {
        let path = PathBuf::from("requirements.txt");
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("django==3.2  # LTS\nflask\n".to_string()));
        runtime
            .expect_write()
            .with(eq(path.clone()), eq("django==4.2.0  # LTS\nflask\n"))
            .times(1)
            .returning(|_, _| Ok(()));

        let operation = update("django", "4.2.0");
        let previewed = apply(&runtime, &operation, vec![path.clone()], true);
        let written = apply(&runtime, &operation, vec![path], false);

        assert_eq!(previewed[0].diff, written[0].diff);
        assert_eq!(
            previewed[0].diff.as_deref(),
            Some("-django==3.2  # LTS\n+django==4.2.0  # LTS\n flask\n")
        );
        assert!(written[0].was_written());
    }

    #[test]
    fn test_unchanged_file_is_not_written() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("flask\n".to_string()));
        runtime.expect_write().never();

        let results = apply(&runtime, &remove("django"), vec![PathBuf::from("requirements.txt")], false);
        assert!(!results[0].changed);
        assert_eq!(results[0].status, Some(EditStatus::NotFound));
        assert!(results[0].diff.is_none());
    }

    #[test]
    fn test_read_error_is_recorded_and_processing_continues() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("bad/requirements.txt")))
            .returning(|_| Err(anyhow!("boom")));
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("good/requirements.txt")))
            .returning(|_| Ok("django\n".to_string()));
        runtime.expect_write().times(1).returning(|_, _| Ok(()));

        let results = apply(
            &runtime,
            &remove("django"),
            vec![PathBuf::from("bad/requirements.txt"), PathBuf::from("good/requirements.txt")],
            false,
        );

        assert!(matches!(results[0].error, Some(FileEditError::Read { .. })));
        assert!(results[1].was_written());
        assert_eq!(results[1].path, PathBuf::from("good/requirements.txt"));
    }

    #[test]
    fn test_permission_denied_is_per_file() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("django\n".to_string()));
        runtime
            .expect_write()
            .with(eq(PathBuf::from("ro/requirements.txt")), mockall::predicate::always())
            .returning(|_, _| Err(permission_denied()));
        runtime
            .expect_write()
            .with(eq(PathBuf::from("rw/requirements.txt")), mockall::predicate::always())
            .returning(|_, _| Ok(()));

        let results = apply(
            &runtime,
            &remove("django"),
            vec![PathBuf::from("ro/requirements.txt"), PathBuf::from("rw/requirements.txt")],
            false,
        );

        assert!(matches!(results[0].error, Some(FileEditError::PermissionDenied { .. })));
        assert_eq!(
            results[0].error.as_ref().unwrap().to_string(),
            "ro/requirements.txt is read-only, skipping file modification"
        );
        assert!(!results[0].was_written());
        assert!(results[1].was_written());
    }

    #[test]
    fn test_other_write_errors_are_recorded() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("django\n".to_string()));
        runtime
            .expect_write()
            .returning(|_, _| Err(anyhow!("disk full")));

        let results = apply(&runtime, &remove("django"), vec![PathBuf::from("requirements.txt")], false);
        assert!(matches!(results[0].error, Some(FileEditError::Write { .. })));
    }

    #[test]
    fn test_sort_after_edit_runs_through_orchestrator() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("zlib\nbeta\n".to_string()));
        runtime
            .expect_write()
            .with(mockall::predicate::always(), eq("alpha\nbeta\nzlib\n"))
            .times(1)
            .returning(|_, _| Ok(()));

        let operation = Operation::new(Edit::Add {
            name: PackageName::parse("alpha").unwrap(),
            specifier: None,
            extras: Vec::new(),
        })
        .with_sort(SortOptions::default(), true);
        let results = apply(&runtime, &operation, vec![PathBuf::from("requirements.txt")], false);
        assert!(results[0].was_written());
    }
}
