//! Index settings from pip configuration files.

use std::path::PathBuf;

use log::debug;

use super::file::{ConfigFile, PypiSection};
use crate::runtime::Runtime;

/// pip configuration files, lowest priority first.
pub fn pip_config_paths<R: Runtime + ?Sized>(runtime: &R) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let home = runtime.home_dir();

    if cfg!(windows) {
        let program_data = runtime
            .env_var("PROGRAMDATA")
            .unwrap_or_else(|_| r"C:\ProgramData".to_string());
        paths.push(PathBuf::from(program_data).join("pip").join("pip.ini"));
        if let Ok(appdata) = runtime.env_var("APPDATA") {
            paths.push(PathBuf::from(appdata).join("pip").join("pip.ini"));
        }
    } else {
        paths.push(PathBuf::from("/etc/pip.conf"));
        let xdg_dirs = runtime
            .env_var("XDG_CONFIG_DIRS")
            .unwrap_or_else(|_| "/etc/xdg".to_string());
        for dir in xdg_dirs.split(':').filter(|d| !d.is_empty()) {
            paths.push(PathBuf::from(dir).join("pip").join("pip.conf"));
        }
        if let Some(home) = &home {
            paths.push(home.join("Library/Application Support/pip/pip.conf"));
        }
        let xdg_home = runtime
            .env_var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| home.as_ref().map(|h| h.join(".config")));
        if let Some(xdg_home) = xdg_home {
            paths.push(xdg_home.join("pip").join("pip.conf"));
        }
        if let Some(home) = &home {
            paths.push(home.join(".pip").join("pip.conf"));
        }
    }

    if let Ok(venv) = runtime.env_var("VIRTUAL_ENV") {
        let name = if cfg!(windows) { "pip.ini" } else { "pip.conf" };
        paths.push(PathBuf::from(venv).join(name));
    }
    paths
}

/// Loads `[global] index-url` and `extra-index-url` from every pip
/// configuration file, later files overriding earlier ones.
#[tracing::instrument(skip(runtime))]
pub fn load_pip_config<R: Runtime + ?Sized>(runtime: &R) -> ConfigFile {
    pip_config_paths(runtime)
        .into_iter()
        .filter(|path| runtime.is_file(path))
        .filter_map(|path| match runtime.read_to_string(&path) {
            Ok(text) => {
                debug!("Reading pip configuration {}", path.display());
                Some(parse_pip_conf(&text))
            }
            Err(e) => {
                debug!("Ignoring unreadable {}: {:#}", path.display(), e);
                None
            }
        })
        .fold(ConfigFile::default(), ConfigFile::overlay)
}

/// Parses the `[global]` section of a pip INI file.
pub fn parse_pip_conf(text: &str) -> ConfigFile {
    let mut section = String::new();
    let mut current_key: Option<String> = None;
    let mut index_url = None;
    let mut extra: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        // Indented lines continue the previous value.
        if line.starts_with(char::is_whitespace) {
            if section == "global" && current_key.as_deref() == Some("extra-index-url") {
                let value = extra.get_or_insert_with(String::new);
                value.push('\n');
                value.push_str(trimmed);
            }
            continue;
        }

        if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            section = name.trim().to_ascii_lowercase();
            current_key = None;
            continue;
        }

        let Some((key, value)) = trimmed.split_once(['=', ':']) else {
            current_key = None;
            continue;
        };
        let key = key.trim().to_ascii_lowercase().replace('_', "-");
        let value = value.trim().to_string();
        if section == "global" {
            match key.as_str() {
                "index-url" => index_url = Some(value),
                "extra-index-url" => extra = Some(value),
                _ => {}
            }
        }
        current_key = Some(key);
    }

    let extra_index_urls = extra.map(|raw| {
        raw.split_whitespace()
            .map(str::to_string)
            .collect::<Vec<_>>()
    });

    ConfigFile {
        pypi: PypiSection {
            index_url: index_url.filter(|url| !url.is_empty()),
            fallback_url: None,
            extra_index_urls: extra_index_urls.filter(|urls| !urls.is_empty()),
        },
        ..ConfigFile::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::Path;

    #[test]
    fn test_parse_global_section() {
        let config = parse_pip_conf(
            "[global]\nindex-url = https://nexus/simple/\nextra-index-url =\n    https://a/simple/\n    https://b/simple/\ntimeout = 60\n[install]\nindex-url = https://ignored/\n",
        );
        assert_eq!(config.pypi.index_url.as_deref(), Some("https://nexus/simple/"));
        assert_eq!(
            config.pypi.extra_index_urls,
            Some(vec!["https://a/simple/".to_string(), "https://b/simple/".to_string()])
        );
    }

    #[test]
    fn test_parse_ignores_other_sections_and_comments() {
        let config = parse_pip_conf("# comment\n[install]\nindex-url: https://x/\n");
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_colon_separator() {
        let config = parse_pip_conf("[global]\nindex_url: https://x/simple/\n");
        assert_eq!(config.pypi.index_url.as_deref(), Some("https://x/simple/"));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_later_files_win() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/user")));
        runtime.expect_env_var().returning(|_| Err(std::env::VarError::NotPresent));
        runtime.expect_is_file().returning(|p| {
            p == Path::new("/etc/pip.conf") || p == Path::new("/home/user/.pip/pip.conf")
        });
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("/etc/pip.conf")))
            .returning(|_| Ok("[global]\nindex-url = https://system/\nextra-index-url = https://extra/\n".into()));
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("/home/user/.pip/pip.conf")))
            .returning(|_| Ok("[global]\nindex-url = https://user/\n".into()));

        let config = load_pip_config(&runtime);
        assert_eq!(config.pypi.index_url.as_deref(), Some("https://user/"));
        assert_eq!(
            config.pypi.extra_index_urls,
            Some(vec!["https://extra/".to_string()])
        );
    }
}
