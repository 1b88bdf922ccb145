use std::path::PathBuf;

use anyhow::Result;
use log::debug;

use crate::{
    apply::{FileEditError, FileEditResult},
    config::Settings,
    console::Console,
    discovery::resolve_paths,
    error::UserInputError,
    requirements::{Edit, EditStatus},
    runtime::Runtime,
};

mod cat;
pub mod config;
mod edit;
mod find;
mod sort;
mod versions;

pub use cat::cat;
pub use edit::{EditArgs, add, remove, update};
pub use find::find;
pub use sort::{SortArgs, SortTally, sort};
pub use versions::{VersionsArgs, render_versions, versions};

/// What every command runs with.
pub struct Context<'a, R: Runtime + ?Sized> {
    pub runtime: &'a R,
    pub settings: Settings,
    pub console: Console,
}

impl<'a, R: Runtime + ?Sized> Context<'a, R> {
    pub fn new(runtime: &'a R, settings: Settings, console: Console) -> Self {
        Self {
            runtime,
            settings,
            console,
        }
    }
}

/// Resolves path arguments, reporting unusable ones on stderr.
///
/// Fails with [`UserInputError::NoRequirementsFiles`] when nothing is left.
#[tracing::instrument(skip(ctx))]
pub(crate) fn gather_files<R: Runtime + ?Sized>(
    ctx: &Context<'_, R>,
    paths: &[String],
) -> Result<Vec<PathBuf>> {
    let resolved = resolve_paths(ctx.runtime, paths)?;
    for issue in &resolved.issues {
        if issue.is_warning() {
            ctx.console.warn(&issue.to_string());
        } else {
            eprintln!("{}", ctx.console.error(&issue.to_string()));
        }
    }

    if resolved.files.is_empty() {
        let explicit = paths.iter().any(|p| !p.trim().is_empty() && p.trim() != "*");
        let roots = if explicit { resolved.roots } else { Vec::new() };
        return Err(UserInputError::NoRequirementsFiles(roots).into());
    }
    debug!("Processing {} file(s)", resolved.files.len());
    Ok(resolved.files)
}

/// Prints a per-file error to stderr.
pub(crate) fn print_file_error(console: &Console, error: &FileEditError) {
    match error {
        FileEditError::PermissionDenied { .. } => console.warn(&format!("Warning: {}", error)),
        _ => eprintln!("{}", console.error(&format!("Error: {}", error))),
    }
}

/// The line printed for a file that was handled without error, if any.
fn outcome_message(edit: &Edit, result: &FileEditResult) -> Option<String> {
    let file = result.path.display();
    let package = edit.package().map(|p| p.as_str()).unwrap_or_default();
    match (result.status?, edit) {
        (EditStatus::Applied, Edit::Remove { .. }) => Some(format!("Removed {} from {}", package, file)),
        (EditStatus::Applied, Edit::Sort) => Some(format!("Sorted {}", file)),
        (EditStatus::Applied, _) => Some(format!("Updated {}", file)),
        (EditStatus::AlreadyPresent, _) => Some(format!("{} already exists in {}", package, file)),
        (EditStatus::NotFound, Edit::Update { .. }) => Some(format!("{} not found in {}", package, file)),
        (EditStatus::NotFound, _) => None,
        (EditStatus::Unchanged, Edit::Sort) => Some(format!("{} is already sorted", file)),
        (EditStatus::Unchanged, Edit::Update { specifier, .. }) => {
            Some(format!("{} is already {} in {}", package, specifier, file))
        }
        (EditStatus::Unchanged, _) => None,
    }
}

/// Prints the outcome of an edit for every file, in processing order.
pub(crate) fn report_results(console: &Console, edit: &Edit, results: &[FileEditResult], preview: bool) {
    for result in results {
        if let Some(error) = &result.error {
            print_file_error(console, error);
            continue;
        }
        if preview && result.changed {
            println!("{}", console.path(&result.path.display().to_string()));
            if let Some(diff) = &result.diff {
                console.print_diff(diff);
            }
            println!();
            continue;
        }
        if let Some(message) = outcome_message(edit, result) {
            println!("{}", message);
        }
    }
}

/// Turns per-file errors into a failing exit status once every file has
/// been processed.
pub(crate) fn fail_on_errors(results: &[FileEditResult]) -> Result<()> {
    let failed = results.iter().filter(|r| r.is_error()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} file(s) could not be processed", failed, results.len());
    }
    Ok(())
}
