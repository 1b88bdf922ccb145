use anyhow::Result;

use crate::{
    apply::{FileEditResult, apply},
    requirements::{Edit, EditStatus, Operation},
    runtime::Runtime,
};

use super::{Context, fail_on_errors, gather_files, report_results};

#[derive(Debug, Clone, Default)]
pub struct SortArgs {
    pub paths: Vec<String>,
    pub preview: bool,
    /// Overrides `sort.locale`.
    pub locale: Option<String>,
    /// Drop standalone comments and sort the file as one block.
    pub legacy: bool,
}

/// Per-run counts for the closing summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortTally {
    pub sorted: usize,
    pub already_sorted: usize,
    pub skipped: usize,
}

impl SortTally {
    pub fn from_results(results: &[FileEditResult]) -> Self {
        let mut tally = Self::default();
        for result in results {
            if result.is_error() {
                tally.skipped += 1;
            } else if result.status == Some(EditStatus::Applied) {
                tally.sorted += 1;
            } else {
                tally.already_sorted += 1;
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.sorted + self.already_sorted + self.skipped
    }

    /// `Summary: ...` naming only the non-zero counts.
    pub fn summary(&self) -> String {
        let parts: Vec<String> = [
            (self.sorted, "sorted"),
            (self.already_sorted, "already sorted"),
            (self.skipped, "skipped"),
        ]
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{} {}", count, label))
        .collect();
        format!("Summary: {} ({} files total)", parts.join(", "), self.total())
    }
}

/// Sort requirements files
#[tracing::instrument(skip(ctx, args))]
pub fn sort<R: Runtime + ?Sized>(ctx: &Context<'_, R>, args: &SortArgs) -> Result<()> {
    let mut options = ctx.settings.sort.clone();
    if let Some(locale) = args.locale.as_deref().filter(|l| !l.trim().is_empty()) {
        options.locale = locale.trim().to_string();
    }
    if args.legacy {
        options.preserve_comments = false;
    }

    if args.preview {
        println!("Previewing changes");
    }
    let files = gather_files(ctx, &args.paths)?;

    let operation = Operation::new(Edit::Sort).with_sort(options, false);
    let results = apply(ctx.runtime, &operation, files, args.preview);
    report_results(&ctx.console, &operation.edit, &results, args.preview);

    let tally = SortTally::from_results(&results);
    if tally.total() > 1 {
        println!("\n{}", tally.summary());
    }
    fail_on_errors(&results)
}
