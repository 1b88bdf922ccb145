//! The environment-variable configuration layer.

use super::file::{ColorSection, ConfigFile, PypiSection, SortSection, parse_bool};
use crate::runtime::Runtime;

pub const ENV_INDEX_URL: &str = "REQUIREMENTS_CLI_INDEX_URL";
pub const ENV_FALLBACK_URL: &str = "REQUIREMENTS_CLI_FALLBACK_URL";
pub const ENV_EXTRA_INDEX_URLS: &str = "REQUIREMENTS_CLI_EXTRA_INDEX_URLS";
pub const ENV_COLOR: &str = "REQUIREMENTS_CLI_COLOR";
pub const ENV_LOCALE: &str = "REQUIREMENTS_CLI_LOCALE";
pub const PIP_INDEX_URL: &str = "PIP_INDEX_URL";
pub const PIP_EXTRA_INDEX_URL: &str = "PIP_EXTRA_INDEX_URL";

pub fn load_env_config<R: Runtime + ?Sized>(runtime: &R) -> ConfigFile {
    let var = |key: &str| {
        runtime
            .env_var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let index_url = var(ENV_INDEX_URL).or_else(|| var(PIP_INDEX_URL));
    let extra_index_urls = match var(ENV_EXTRA_INDEX_URLS) {
        Some(urls) => Some(
            urls.split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        None => var(PIP_EXTRA_INDEX_URL)
            .map(|urls| urls.split_whitespace().map(str::to_string).collect()),
    };

    ConfigFile {
        color: ColorSection {
            enabled: var(ENV_COLOR).and_then(|v| parse_bool(&v)),
        },
        pypi: PypiSection {
            index_url,
            fallback_url: var(ENV_FALLBACK_URL),
            extra_index_urls,
        },
        sort: SortSection {
            locale: var(ENV_LOCALE),
            preserve_comments: None,
        },
        ..ConfigFile::default()
    }
}
