//! Errors reported to the user before any file is touched.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserInputError {
    #[error("Invalid package name: '{0}'")]
    InvalidPackageName(String),

    #[error("Invalid version specifier: '{0}'")]
    InvalidSpecifier(String),

    #[error("No requirements.txt files found in {}", format_paths(.0))]
    NoRequirementsFiles(Vec<PathBuf>),

    #[error("Unknown configuration key '{0}' (valid keys: {keys})", keys = crate::config::ConfigKey::names().join(", "))]
    InvalidConfigKey(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidConfigValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Package '{0}' not found")]
    PackageNotInIndex(String),
}

fn format_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "the current directory".to_string();
    }
    paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<_>>()
        .join(", ")
}
