use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use requirements_cli::{
    commands::{self, Context, EditArgs, SortArgs, VersionsArgs},
    config::ConfigLoader,
    console::{Console, should_use_color},
    http::{DEFAULT_TIMEOUT_SECS, HttpClient},
    index::SimpleIndex,
    runtime::{RealRuntime, Runtime},
};

/// requirements - manage requirements.txt files
///
/// Add, update, remove, find and sort packages across every requirements.txt
/// file under the given paths, and look up package versions on a package index.
///
/// Virtual environment directories (.venv, venv, virtualenv, .aws-sam) and
/// symbolic links are never searched.
///
/// Examples:
///   requirements update django 4.2.0          # pin django everywhere below .
///   requirements remove flask backend/ --preview
///   requirements versions requests --limit 5
#[derive(Parser, Debug)]
#[command(author, version = env!("REQUIREMENTS_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Force colored output
    #[arg(long, global = true, overrides_with = "no_color")]
    color: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true, overrides_with = "color")]
    no_color: bool,

    /// Show debug logging (place before the subcommand)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

impl Cli {
    fn color_flag(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Add a package to requirements.txt files that do not list it
    Add(AddCmd),

    /// Update the version specifier of a package
    Update(UpdateCmd),

    /// Remove a package from requirements.txt files
    Remove(RemoveCmd),

    /// Sort requirements.txt files
    Sort(SortCmd),

    /// List the requirements.txt files that contain a package
    Find(FindCmd),

    /// Print requirements.txt files
    Cat(PathsArg),

    /// Show available versions of a package
    Versions(VersionsCmd),

    /// Manage configuration settings
    #[command(subcommand)]
    Config(ConfigCmd),
}

#[derive(clap::Args, Debug)]
struct PathsArg {
    /// Files or directories to search (default: current directory)
    #[arg(value_name = "PATHS")]
    paths: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct WriteOpts {
    /// Show the changes without saving them
    #[arg(long, visible_alias = "dry-run")]
    preview: bool,

    /// Sort the file after a change (overrides edit.sort)
    #[arg(long, overrides_with = "no_sort")]
    sort: bool,

    /// Do not sort the file after a change (overrides edit.sort)
    #[arg(long = "no-sort", overrides_with = "sort")]
    no_sort: bool,
}

impl WriteOpts {
    fn into_edit_args(self, paths: Vec<String>) -> EditArgs {
        let sort = match (self.sort, self.no_sort) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        EditArgs {
            paths,
            preview: self.preview,
            sort,
        }
    }
}

#[derive(clap::Args, Debug)]
struct AddCmd {
    /// Package name
    package: String,

    /// Version specifier, e.g. 2.0 or ">=2.0,<3"
    #[arg(long = "version", value_name = "SPEC")]
    version: Option<String>,

    /// Extras, comma-separated
    #[arg(long, value_name = "EXTRAS", value_delimiter = ',')]
    extras: Vec<String>,

    #[command(flatten)]
    paths: PathsArg,

    #[command(flatten)]
    opts: WriteOpts,
}

#[derive(clap::Args, Debug)]
struct UpdateCmd {
    /// Package name (matched case-insensitively, - _ . equivalent)
    package: String,

    /// New version specifier; "==" is assumed without an operator
    #[arg(value_name = "SPEC", allow_hyphen_values = true)]
    specifier: String,

    #[command(flatten)]
    paths: PathsArg,

    #[command(flatten)]
    opts: WriteOpts,
}

#[derive(clap::Args, Debug)]
struct RemoveCmd {
    /// Package name
    package: String,

    #[command(flatten)]
    paths: PathsArg,

    #[command(flatten)]
    opts: WriteOpts,
}

#[derive(clap::Args, Debug)]
struct SortCmd {
    #[command(flatten)]
    paths: PathsArg,

    /// Show the changes without saving them
    #[arg(long, visible_alias = "dry-run")]
    preview: bool,

    /// Collation locale (overrides sort.locale)
    #[arg(long, value_name = "LOCALE")]
    locale: Option<String>,

    /// Drop standalone comments and sort each file as one block
    #[arg(long)]
    legacy: bool,
}

#[derive(clap::Args, Debug)]
struct FindCmd {
    /// Package name
    package: String,

    #[command(flatten)]
    paths: PathsArg,

    /// Also print the matching lines
    #[arg(long)]
    verbose: bool,
}

#[derive(clap::Args, Debug)]
struct VersionsCmd {
    /// Package name
    package: String,

    /// Show every version
    #[arg(long)]
    all: bool,

    /// Number of versions to show
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    limit: u32,

    /// One version per line
    #[arg(short = '1', long = "one-per-line")]
    one_per_line: bool,

    /// Package index URL (PEP 503 Simple API)
    #[arg(long, value_name = "URL")]
    index_url: Option<String>,

    /// Index tried when the primary one is unreachable
    #[arg(long, value_name = "URL")]
    fallback_url: Option<String>,

    /// Include yanked releases
    #[arg(long)]
    include_yanked: bool,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigCmd {
    /// Show the config file and effective settings
    Show,
    /// Print the config file path
    Path,
    /// Set a configuration key
    Set {
        /// One of color.enabled, pypi.index_url, pypi.fallback_url,
        /// pypi.extra_index_urls, sort.locale, sort.preserve_comments, edit.sort
        key: String,
        value: String,
    },
    /// Remove a configuration key
    Unset { key: String },
    /// Create the config file with commented defaults
    Init,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let runtime = RealRuntime;
    let settings = ConfigLoader::new(&runtime).settings();
    let console = Console::new(should_use_color(&runtime, cli.color_flag(), settings.color));
    let ctx = Context::new(&runtime, settings, console);

    match run(cli.command, &ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", ctx.console.error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run<R: Runtime + ?Sized>(command: Commands, ctx: &Context<'_, R>) -> Result<()> {
    match command {
        Commands::Add(cmd) => commands::add(
            ctx,
            &cmd.package,
            cmd.version.as_deref(),
            &cmd.extras,
            &cmd.opts.into_edit_args(cmd.paths.paths),
        ),
        Commands::Update(cmd) => commands::update(
            ctx,
            &cmd.package,
            &cmd.specifier,
            &cmd.opts.into_edit_args(cmd.paths.paths),
        ),
        Commands::Remove(cmd) => {
            commands::remove(ctx, &cmd.package, &cmd.opts.into_edit_args(cmd.paths.paths))
        }
        Commands::Sort(cmd) => commands::sort(
            ctx,
            &SortArgs {
                paths: cmd.paths.paths,
                preview: cmd.preview,
                locale: cmd.locale,
                legacy: cmd.legacy,
            },
        ),
        Commands::Find(cmd) => commands::find(ctx, &cmd.package, &cmd.paths.paths, cmd.verbose),
        Commands::Cat(cmd) => commands::cat(ctx, &cmd.paths),
        Commands::Versions(cmd) => {
            let http = HttpClient::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;
            let index = SimpleIndex::new(http);
            let args = VersionsArgs {
                package: cmd.package,
                all: cmd.all,
                limit: cmd.limit as usize,
                one_per_line: cmd.one_per_line,
                index_url: cmd.index_url,
                fallback_url: cmd.fallback_url,
                include_yanked: cmd.include_yanked,
            };
            commands::versions(ctx, &index, &args).await
        }
        Commands::Config(cmd) => match cmd {
            ConfigCmd::Show => commands::config::show(ctx),
            ConfigCmd::Path => commands::config::path(ctx),
            ConfigCmd::Set { key, value } => commands::config::set(ctx, &key, &value),
            ConfigCmd::Unset { key } => commands::config::unset(ctx, &key),
            ConfigCmd::Init => commands::config::init(ctx),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_update_parsing() {
        let cli = parse(&["requirements", "update", "django", "4.2.0", "a", "b", "--dry-run"]);
        match cli.command {
            Commands::Update(cmd) => {
                assert_eq!(cmd.package, "django");
                assert_eq!(cmd.specifier, "4.2.0");
                assert_eq!(cmd.paths.paths, vec!["a", "b"]);
                let args = cmd.opts.into_edit_args(cmd.paths.paths);
                assert!(args.preview);
                assert_eq!(args.sort, None);
            }
            _ => panic!("Expected Update command"),
        }
    }

    #[test]
    fn test_cli_sort_flags() {
        let cli = parse(&["requirements", "remove", "flask", "--sort"]);
        match cli.command {
            Commands::Remove(cmd) => assert_eq!(cmd.opts.into_edit_args(Vec::new()).sort, Some(true)),
            _ => panic!("Expected Remove command"),
        }
        let cli = parse(&["requirements", "add", "flask", "--sort", "--no-sort"]);
        match cli.command {
            Commands::Add(cmd) => assert_eq!(cmd.opts.into_edit_args(Vec::new()).sort, Some(false)),
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_cli_add_options() {
        let cli = parse(&[
            "requirements", "add", "requests", "--version", ">=2", "--extras", "socks,security", "svc",
        ]);
        match cli.command {
            Commands::Add(cmd) => {
                assert_eq!(cmd.version.as_deref(), Some(">=2"));
                assert_eq!(cmd.extras, vec!["socks", "security"]);
                assert_eq!(cmd.paths.paths, vec!["svc"]);
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_cli_versions_defaults() {
        let cli = parse(&["requirements", "versions", "django"]);
        match cli.command {
            Commands::Versions(cmd) => {
                assert_eq!(cmd.limit, 10);
                assert!(!cmd.all && !cmd.one_per_line && !cmd.include_yanked);
                assert_eq!(cmd.index_url, None);
            }
            _ => panic!("Expected Versions command"),
        }
        let cli = parse(&["requirements", "versions", "django", "-1", "--limit", "3"]);
        match cli.command {
            Commands::Versions(cmd) => assert!(cmd.one_per_line && cmd.limit == 3),
            _ => panic!("Expected Versions command"),
        }
        assert!(Cli::try_parse_from(["requirements", "versions", "x", "--limit", "0"]).is_err());
    }

    #[test]
    fn test_cli_verbose_levels() {
        let cli = parse(&["requirements", "-v", "find", "django", "--verbose"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Find(cmd) => assert!(cmd.verbose),
            _ => panic!("Expected Find command"),
        }
    }

    #[test]
    fn test_cli_color_flags() {
        assert_eq!(parse(&["requirements", "cat"]).color_flag(), None);
        assert_eq!(parse(&["requirements", "cat", "--no-color"]).color_flag(), Some(false));
        assert_eq!(parse(&["requirements", "--color", "cat"]).color_flag(), Some(true));
    }

    #[test]
    fn test_cli_config_set() {
        let cli = parse(&["requirements", "config", "set", "edit.sort", "true"]);
        assert!(matches!(cli.command, Commands::Config(ConfigCmd::Set { .. })));
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["requirements"]).is_err());
    }
}
