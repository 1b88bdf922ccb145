//! Environment variables and well-known directories.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn env_var_impl(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    pub(crate) fn current_dir_impl(&self) -> Result<PathBuf> {
        env::current_dir().context("Failed to determine the working directory")
    }

    pub(crate) fn home_dir_impl(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    pub(crate) fn config_dir_impl(&self) -> Option<PathBuf> {
        dirs::config_dir()
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};

    #[test]
    fn test_real_runtime_env_and_dirs() {
        let runtime = RealRuntime;

        assert!(runtime.env_var("PATH").is_ok());
        assert!(runtime.env_var("REQUIREMENTS_CLI_SURELY_UNSET_VARIABLE").is_err());

        let cwd = runtime.current_dir().unwrap();
        assert!(cwd.is_absolute());

        let home = runtime.home_dir();
        assert!(home.is_some() || cfg!(target_os = "linux"));
    }
}
