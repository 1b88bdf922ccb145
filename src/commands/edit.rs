use anyhow::Result;
use log::debug;

use crate::{
    apply::apply,
    error::UserInputError,
    requirements::{Edit, Operation, PackageName, is_valid_name, normalize_specifier},
    runtime::Runtime,
};

use super::{Context, fail_on_errors, gather_files, report_results};

/// Options shared by `add`, `update` and `remove`.
#[derive(Debug, Clone, Default)]
pub struct EditArgs {
    pub paths: Vec<String>,
    pub preview: bool,
    /// `--sort`/`--no-sort`; `None` defers to `edit.sort`.
    pub sort: Option<bool>,
}

/// Add a package to every requirements file that does not list it yet
#[tracing::instrument(skip(ctx, args))]
pub fn add<R: Runtime + ?Sized>(
    ctx: &Context<'_, R>,
    package: &str,
    version: Option<&str>,
    extras: &[String],
    args: &EditArgs,
) -> Result<()> {
    let name = PackageName::parse(package)?;
    let specifier = version
        .filter(|v| !v.trim().is_empty())
        .map(normalize_specifier)
        .transpose()?;
    let extras = parse_extras(extras)?;

    run(
        ctx,
        Edit::Add {
            name,
            specifier,
            extras,
        },
        args,
    )
}

/// Change the specifier of a package wherever it is listed
#[tracing::instrument(skip(ctx, args))]
pub fn update<R: Runtime + ?Sized>(
    ctx: &Context<'_, R>,
    package: &str,
    specifier: &str,
    args: &EditArgs,
) -> Result<()> {
    let name = PackageName::parse(package)?;
    let specifier = normalize_specifier(specifier)?;
    run(ctx, Edit::Update { name, specifier }, args)
}

/// Remove a package from every requirements file
#[tracing::instrument(skip(ctx, args))]
pub fn remove<R: Runtime + ?Sized>(ctx: &Context<'_, R>, package: &str, args: &EditArgs) -> Result<()> {
    let name = PackageName::parse(package)?;
    run(ctx, Edit::Remove { name }, args)
}

/// Extras may be given as repeated flags or comma-separated.
fn parse_extras(raw: &[String]) -> Result<Vec<String>, UserInputError> {
    let mut extras: Vec<String> = Vec::new();
    for extra in raw.iter().flat_map(|e| e.split(',')).map(str::trim) {
        if extra.is_empty() {
            continue;
        }
        if !is_valid_name(extra) {
            return Err(UserInputError::InvalidPackageName(extra.to_string()));
        }
        if !extras.iter().any(|e| e == extra) {
            extras.push(extra.to_string());
        }
    }
    Ok(extras)
}

fn run<R: Runtime + ?Sized>(ctx: &Context<'_, R>, edit: Edit, args: &EditArgs) -> Result<()> {
    let sort_after_edit = args.sort.unwrap_or(ctx.settings.sort_after_edit);
    debug!("Running '{}' (sort after edit: {})", edit, sort_after_edit);

    if args.preview {
        println!("Previewing changes");
    }
    let files = gather_files(ctx, &args.paths)?;

    let operation = Operation::new(edit).with_sort(ctx.settings.sort.clone(), sort_after_edit);
    let results = apply(ctx.runtime, &operation, files, args.preview);
    report_results(&ctx.console, &operation.edit, &results, args.preview);
    fail_on_errors(&results)
}
