use anyhow::Result;

use crate::{
    requirements::{Document, PackageName, RequirementLine, matches},
    runtime::Runtime,
};

use super::{Context, gather_files};

/// The lines of `text` that name `package`.
pub(crate) fn matching_lines(text: &str, package: &PackageName) -> Vec<RequirementLine> {
    Document::parse(text)
        .lines()
        .iter()
        .filter(|line| matches(line, package.as_str()))
        .cloned()
        .collect()
}

/// Print the requirements files that list a package
#[tracing::instrument(skip(ctx, paths))]
pub fn find<R: Runtime + ?Sized>(
    ctx: &Context<'_, R>,
    package: &str,
    paths: &[String],
    verbose: bool,
) -> Result<()> {
    let name = PackageName::parse(package)?;
    let files = gather_files(ctx, paths)?;

    let mut failed = 0;
    for file in &files {
        let text = match ctx.runtime.read_to_string(file) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("{}", ctx.console.error(&format!("Error: {:#}", e)));
                failed += 1;
                continue;
            }
        };
        let found = matching_lines(&text, &name);
        if found.is_empty() {
            continue;
        }
        println!("{}", file.display());
        if verbose {
            for line in &found {
                println!("{}", line.raw());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) could not be read", failed, files.len());
    }
    Ok(())
}
