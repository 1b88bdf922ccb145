//! Layered configuration.
//!
//! Layers, lowest priority first: built-in defaults, pip configuration files,
//! the user file `~/.requirements/config.toml`, the `[tool.requirements-cli]`
//! table of the project's `pyproject.toml`, environment variables, and
//! finally command-line flags (applied by the commands).

mod env;
mod file;
mod pip;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;

pub use env::{ENV_COLOR, ENV_EXTRA_INDEX_URLS, ENV_FALLBACK_URL, ENV_INDEX_URL, ENV_LOCALE};
pub use file::{ConfigFile, ConfigKey, DEFAULT_CONFIG, parse_bool, render_table};
pub use pip::{parse_pip_conf, pip_config_paths};

use crate::requirements::SortOptions;
use crate::runtime::Runtime;

pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple/";
pub const CONFIG_DIR_NAME: &str = ".requirements";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Where the effective index URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSource {
    Cli,
    Environment,
    Project,
    User,
    PipConf,
    Default,
}

impl fmt::Display for IndexSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexSource::Cli => "cli",
            IndexSource::Environment => "environment",
            IndexSource::Project => "project",
            IndexSource::User => "user",
            IndexSource::PipConf => "pip.conf",
            IndexSource::Default => "default",
        })
    }
}

/// Each configuration layer as loaded.
#[derive(Debug, Default, Clone)]
pub struct Layers {
    pub pip: ConfigFile,
    pub user: ConfigFile,
    pub project: ConfigFile,
    pub env: ConfigFile,
    pub project_root: Option<PathBuf>,
}

impl Layers {
    pub fn merged(&self) -> ConfigFile {
        self.pip
            .clone()
            .overlay(self.user.clone())
            .overlay(self.project.clone())
            .overlay(self.env.clone())
    }

    fn index_source(&self) -> IndexSource {
        if self.env.pypi.index_url.is_some() {
            IndexSource::Environment
        } else if self.project.pypi.index_url.is_some() {
            IndexSource::Project
        } else if self.user.pypi.index_url.is_some() {
            IndexSource::User
        } else if self.pip.pypi.index_url.is_some() {
            IndexSource::PipConf
        } else {
            IndexSource::Default
        }
    }

    pub fn settings(&self) -> Settings {
        let merged = self.merged();
        let sort_defaults = SortOptions::default();
        Settings {
            color: merged.color.enabled,
            index_url: merged
                .pypi
                .index_url
                .unwrap_or_else(|| DEFAULT_INDEX_URL.to_string()),
            index_source: self.index_source(),
            fallback_url: merged.pypi.fallback_url,
            extra_index_urls: merged.pypi.extra_index_urls.unwrap_or_default(),
            sort: SortOptions {
                locale: merged.sort.locale.unwrap_or(sort_defaults.locale),
                preserve_comments: merged
                    .sort
                    .preserve_comments
                    .unwrap_or(sort_defaults.preserve_comments),
            },
            sort_after_edit: merged.edit.sort.unwrap_or(false),
        }
    }
}

/// The effective settings after merging every layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub color: Option<bool>,
    pub index_url: String,
    pub index_source: IndexSource,
    pub fallback_url: Option<String>,
    pub extra_index_urls: Vec<String>,
    pub sort: SortOptions,
    pub sort_after_edit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Layers::default().settings()
    }
}

impl Settings {
    /// Applies `--index-url` and `--fallback-url`.
    pub fn with_index_overrides(mut self, index_url: Option<&str>, fallback_url: Option<&str>) -> Self {
        if let Some(url) = index_url.filter(|u| !u.trim().is_empty()) {
            self.index_url = url.trim().to_string();
            self.index_source = IndexSource::Cli;
        }
        if let Some(url) = fallback_url.filter(|u| !u.trim().is_empty()) {
            self.fallback_url = Some(url.trim().to_string());
        }
        self
    }
}

#[derive(Deserialize, Default)]
struct PyProject {
    #[serde(default)]
    tool: PyProjectTool,
}

#[derive(Deserialize, Default)]
struct PyProjectTool {
    #[serde(default, rename = "requirements-cli")]
    requirements_cli: Option<ConfigFile>,
}

/// Loads configuration layers through a [`Runtime`].
pub struct ConfigLoader<'a, R: Runtime + ?Sized> {
    runtime: &'a R,
}

impl<'a, R: Runtime + ?Sized> ConfigLoader<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// `~/.requirements/config.toml`.
    pub fn user_config_path(&self) -> Result<PathBuf> {
        let home = self
            .runtime
            .home_dir()
            .context("Could not determine the home directory")?;
        Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Nearest ancestor of the working directory holding a `pyproject.toml`,
    /// else the nearest one holding `.git`.
    pub fn find_project_root(&self) -> Option<PathBuf> {
        let start = self.runtime.current_dir().ok()?;
        let ancestors: Vec<&Path> = start.ancestors().collect();
        ancestors
            .iter()
            .find(|dir| self.runtime.is_file(&dir.join("pyproject.toml")))
            .or_else(|| ancestors.iter().find(|dir| self.runtime.exists(&dir.join(".git"))))
            .map(|dir| dir.to_path_buf())
    }

    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Layers {
        let project_root = self.find_project_root();
        let project = project_root
            .as_deref()
            .map(|root| self.load_project(root))
            .unwrap_or_default();
        let user = match self.user_config_path() {
            Ok(path) => self.load_user(&path),
            Err(e) => {
                debug!("{:#}", e);
                ConfigFile::default()
            }
        };

        Layers {
            pip: pip::load_pip_config(self.runtime),
            user,
            project,
            env: env::load_env_config(self.runtime),
            project_root,
        }
    }

    pub fn settings(&self) -> Settings {
        self.load().settings()
    }

    fn load_user(&self, path: &Path) -> ConfigFile {
        if !self.runtime.is_file(path) {
            return ConfigFile::default();
        }
        self.read_toml(path, |text| ConfigFile::parse(text))
    }

    fn load_project(&self, root: &Path) -> ConfigFile {
        let path = root.join("pyproject.toml");
        if !self.runtime.is_file(&path) {
            return ConfigFile::default();
        }
        self.read_toml(&path, |text| {
            toml::from_str::<PyProject>(text).map(|p| p.tool.requirements_cli.unwrap_or_default())
        })
    }

    /// Malformed or unreadable files are logged and treated as empty.
    fn read_toml<F>(&self, path: &Path, parse: F) -> ConfigFile
    where
        F: FnOnce(&str) -> Result<ConfigFile, toml::de::Error>,
    {
        let text = match self.runtime.read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Ignoring unreadable config {}: {:#}", path.display(), e);
                return ConfigFile::default();
            }
        };
        match parse(&text) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring malformed config {}: {}", path.display(), e);
                ConfigFile::default()
            }
        }
    }

    /// Reads the user file as a raw table for editing.
    pub fn read_user_table(&self) -> Result<toml::Table> {
        let path = self.user_config_path()?;
        if !self.runtime.is_file(&path) {
            return Ok(toml::Table::new());
        }
        let text = self.runtime.read_to_string(&path)?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn write_user_table(&self, table: &toml::Table) -> Result<PathBuf> {
        let path = self.user_config_path()?;
        if let Some(dir) = path.parent() {
            self.runtime.create_dir_all(dir)?;
        }
        let text = render_table(table).context("Failed to serialize configuration")?;
        self.runtime.write(&path, &text)?;
        Ok(path)
    }
}
