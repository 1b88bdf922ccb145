use anyhow::Result;
use log::debug;

use crate::{
    console::Console,
    index::{IndexQuery, PackageIndex, lookup_versions},
    requirements::PackageName,
    runtime::Runtime,
};

use super::Context;

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct VersionsArgs {
    pub package: String,
    pub all: bool,
    pub limit: usize,
    pub one_per_line: bool,
    pub index_url: Option<String>,
    pub fallback_url: Option<String>,
    pub include_yanked: bool,
}

impl Default for VersionsArgs {
    fn default() -> Self {
        Self {
            package: String::new(),
            all: false,
            limit: DEFAULT_LIMIT,
            one_per_line: false,
            index_url: None,
            fallback_url: None,
            include_yanked: false,
        }
    }
}

/// Show the versions of a package available on the configured indexes
#[tracing::instrument(skip(ctx, index, args), fields(package = %args.package))]
pub async fn versions<R: Runtime + ?Sized, I: PackageIndex + ?Sized>(
    ctx: &Context<'_, R>,
    index: &I,
    args: &VersionsArgs,
) -> Result<()> {
    let name = PackageName::parse(&args.package)?;
    let settings = ctx
        .settings
        .clone()
        .with_index_overrides(args.index_url.as_deref(), args.fallback_url.as_deref());
    debug!(
        "Using index {} (from {})",
        settings.index_url, settings.index_source
    );

    let query = IndexQuery::from_settings(&settings, args.include_yanked);
    let found = lookup_versions(index, &name, &query).await?;
    if found.is_empty() {
        anyhow::bail!("No versions found for '{}'", name);
    }

    for line in render_versions(&ctx.console, &name, &found, args) {
        println!("{}", line);
    }
    Ok(())
}

/// The lines printed for a non-empty, newest-first version list.
pub fn render_versions(
    console: &Console,
    package: &PackageName,
    versions: &[String],
    args: &VersionsArgs,
) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(latest) = versions.first() else {
        return lines;
    };
    lines.push(format!(
        "{} (latest: {})",
        console.package(package.as_str()),
        console.version(latest)
    ));

    let limit = args.limit.max(1);
    let shown = if args.all {
        versions
    } else {
        &versions[..versions.len().min(limit)]
    };

    if args.one_per_line {
        lines.extend(shown.iter().cloned());
    } else {
        lines.push(format!("Available versions: {}", shown.join(", ")));
        if !args.all && versions.len() > limit {
            lines.push(console.warning(&format!(
                "(showing {} of {} versions, use --all for complete list)",
                limit,
                versions.len()
            )));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::UserInputError;
    use crate::http::NonRetryableError;
    use crate::index::MockPackageIndex;
    use crate::test_utils::MockFs;

    fn many(n: usize) -> Vec<String> {
        (0..n).rev().map(|i| format!("1.{}", i)).collect()
    }

    fn args(all: bool, limit: usize, one_per_line: bool) -> VersionsArgs {
        VersionsArgs {
            package: "requests".to_string(),
            all,
            limit,
            one_per_line,
            ..VersionsArgs::default()
        }
    }

    fn requests() -> PackageName {
        PackageName::parse("requests").unwrap()
    }

    #[test]
    fn test_render_truncated_list() {
        let lines = render_versions(&Console::plain(), &requests(), &many(12), &args(false, 10, false));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "requests (latest: 1.11)");
        assert!(lines[1].starts_with("Available versions: 1.11, 1.10, 1.9"));
        assert!(lines[1].ends_with("1.2"));
        assert_eq!(lines[2], "(showing 10 of 12 versions, use --all for complete list)");
    }

    #[test]
    fn test_render_all_versions() {
        let lines = render_versions(&Console::plain(), &requests(), &many(12), &args(true, 10, false));
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("1.1, 1.0"));
    }

    #[test]
    fn test_render_one_per_line() {
        let lines = render_versions(&Console::plain(), &requests(), &many(3), &args(false, 2, true));
        assert_eq!(lines, vec!["requests (latest: 1.2)", "1.2", "1.1"]);
    }

    #[test]
    fn test_render_short_list_has_no_hint() {
        let lines = render_versions(&Console::plain(), &requests(), &many(3), &args(false, 10, false));
        assert_eq!(lines, vec!["requests (latest: 1.2)", "Available versions: 1.2, 1.1, 1.0"]);
    }

    #[tokio::test]
    async fn test_versions_uses_cli_index_url() {
        let fs = MockFs::new();
        let runtime = fs.runtime();
        let ctx = Context::new(&runtime, Settings::default(), Console::plain());

        let mut index = MockPackageIndex::new();
        index
            .expect_fetch_versions()
            .withf(|url, name, yanked| url == "https://mirror/simple/" && name == "requests" && !*yanked)
            .times(1)
            .returning(|_, _, _| Ok(vec!["2.0".to_string()]));

        let args = VersionsArgs {
            index_url: Some("https://mirror/simple/".to_string()),
            ..args(false, 10, false)
        };
        versions(&ctx, &index, &args).await.unwrap();
    }

    #[tokio::test]
    async fn test_versions_errors() {
        let fs = MockFs::new();
        let runtime = fs.runtime();
        let ctx = Context::new(&runtime, Settings::default(), Console::plain());

        let mut index = MockPackageIndex::new();
        index
            .expect_fetch_versions()
            .withf(|_, name, _| name == "nope")
            .returning(|_, _, _| Err(NonRetryableError::NotFound("x".to_string()).into()));
        index
            .expect_fetch_versions()
            .withf(|_, name, _| name == "empty")
            .returning(|_, _, _| Ok(Vec::new()));

        let err = versions(&ctx, &index, &VersionsArgs { package: "nope".into(), ..VersionsArgs::default() })
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<UserInputError>(),
            Some(&UserInputError::PackageNotInIndex("nope".to_string()))
        );

        let err = versions(&ctx, &index, &VersionsArgs { package: "empty".into(), ..VersionsArgs::default() })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No versions found for 'empty'");
    }
}
