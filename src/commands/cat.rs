use anyhow::Result;

use crate::runtime::Runtime;

use super::{Context, gather_files};

/// Print requirements files, each under a path header
#[tracing::instrument(skip(ctx, paths))]
pub fn cat<R: Runtime + ?Sized>(ctx: &Context<'_, R>, paths: &[String]) -> Result<()> {
    let files = gather_files(ctx, paths)?;

    let mut failed = 0;
    for file in &files {
        match ctx.runtime.read_to_string(file) {
            Ok(text) => {
                println!("{}", ctx.console.path(&file.display().to_string()));
                println!("{}", text.trim());
                println!();
            }
            Err(e) => {
                eprintln!("{}", ctx.console.error(&format!("Error: {:#}", e)));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) could not be read", failed, files.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::console::Console;
    use crate::test_utils::MockFs;

    #[test]
    fn test_cat_leaves_files_untouched() {
        let fs = MockFs::new().file("/work/requirements.txt", "b\na\n\n\n");
        let runtime = fs.runtime();
        let ctx = Context::new(&runtime, Settings::default(), Console::plain());
        cat(&ctx, &[]).unwrap();
        assert_eq!(fs.contents("/work/requirements.txt").unwrap(), "b\na\n\n\n");
    }

    #[test]
    fn test_cat_missing_path_only() {
        let fs = MockFs::new();
        let runtime = fs.runtime();
        let ctx = Context::new(&runtime, Settings::default(), Console::plain());
        let err = cat(&ctx, &["/work/nowhere".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "No requirements.txt files found in '/work/nowhere'");
    }
}
