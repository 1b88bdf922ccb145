//! The TOML configuration file format and its editable keys.

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::error::UserInputError;

/// One configuration layer. Every field is optional so layers can be
/// overlaid.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub color: ColorSection,
    pub pypi: PypiSection,
    pub sort: SortSection,
    pub edit: EditSection,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSection {
    pub enabled: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PypiSection {
    pub index_url: Option<String>,
    pub fallback_url: Option<String>,
    pub extra_index_urls: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSection {
    pub locale: Option<String>,
    pub preserve_comments: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSection {
    /// Re-sort files after add, update and remove.
    pub sort: Option<bool>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Values set in `upper` replace the ones in `self`.
    pub fn overlay(self, upper: ConfigFile) -> ConfigFile {
        ConfigFile {
            color: ColorSection {
                enabled: upper.color.enabled.or(self.color.enabled),
            },
            pypi: PypiSection {
                index_url: upper.pypi.index_url.or(self.pypi.index_url),
                fallback_url: upper.pypi.fallback_url.or(self.pypi.fallback_url),
                extra_index_urls: upper.pypi.extra_index_urls.or(self.pypi.extra_index_urls),
            },
            sort: SortSection {
                locale: upper.sort.locale.or(self.sort.locale),
                preserve_comments: upper.sort.preserve_comments.or(self.sort.preserve_comments),
            },
            edit: EditSection {
                sort: upper.edit.sort.or(self.edit.sort),
            },
        }
    }
}

/// A `section.key` name accepted by `config set` and `config unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ColorEnabled,
    IndexUrl,
    FallbackUrl,
    ExtraIndexUrls,
    SortLocale,
    SortPreserveComments,
    EditSort,
}

const ALL_KEYS: [ConfigKey; 7] = [
    ConfigKey::ColorEnabled,
    ConfigKey::IndexUrl,
    ConfigKey::FallbackUrl,
    ConfigKey::ExtraIndexUrls,
    ConfigKey::SortLocale,
    ConfigKey::SortPreserveComments,
    ConfigKey::EditSort,
];

impl ConfigKey {
    pub fn parse(name: &str) -> Result<Self, UserInputError> {
        ALL_KEYS
            .into_iter()
            .find(|key| key.name() == name.trim())
            .ok_or_else(|| UserInputError::InvalidConfigKey(name.to_string()))
    }

    pub fn names() -> Vec<&'static str> {
        ALL_KEYS.iter().map(|key| key.name()).collect()
    }

    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::ColorEnabled => "color.enabled",
            ConfigKey::IndexUrl => "pypi.index_url",
            ConfigKey::FallbackUrl => "pypi.fallback_url",
            ConfigKey::ExtraIndexUrls => "pypi.extra_index_urls",
            ConfigKey::SortLocale => "sort.locale",
            ConfigKey::SortPreserveComments => "sort.preserve_comments",
            ConfigKey::EditSort => "edit.sort",
        }
    }

    fn path(self) -> (&'static str, &'static str) {
        self.name().split_once('.').unwrap_or(("", self.name()))
    }

    /// Validates `raw` and converts it to the TOML value stored for this key.
    pub fn parse_value(self, raw: &str) -> Result<Value, UserInputError> {
        let invalid = |reason: &str| UserInputError::InvalidConfigValue {
            key: self.name().to_string(),
            value: raw.to_string(),
            reason: reason.to_string(),
        };
        let raw_trimmed = raw.trim();

        match self {
            ConfigKey::ColorEnabled | ConfigKey::SortPreserveComments | ConfigKey::EditSort => {
                parse_bool(raw_trimmed)
                    .map(Value::Boolean)
                    .ok_or_else(|| invalid("expected true or false"))
            }
            ConfigKey::IndexUrl | ConfigKey::FallbackUrl => {
                if is_http_url(raw_trimmed) {
                    Ok(Value::String(raw_trimmed.to_string()))
                } else {
                    Err(invalid("expected an http:// or https:// URL"))
                }
            }
            ConfigKey::ExtraIndexUrls => {
                let urls: Vec<&str> = raw_trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .collect();
                if urls.iter().all(|url| is_http_url(url)) {
                    Ok(Value::Array(
                        urls.into_iter().map(|url| Value::String(url.to_string())).collect(),
                    ))
                } else {
                    Err(invalid("expected comma-separated http:// or https:// URLs"))
                }
            }
            ConfigKey::SortLocale => {
                if raw_trimmed.is_empty() || raw_trimmed.contains(char::is_whitespace) {
                    Err(invalid("expected a locale name such as en_US.UTF-8"))
                } else {
                    Ok(Value::String(raw_trimmed.to_string()))
                }
            }
        }
    }

    /// Sets this key in a raw config table, keeping every other entry.
    pub fn set(self, table: &mut Table, raw: &str) -> Result<(), UserInputError> {
        let value = self.parse_value(raw)?;
        let (section, key) = self.path();
        let entry = table
            .entry(section)
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        if let Value::Table(section_table) = entry {
            section_table.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Removes this key; empty sections are dropped. Returns false if the key
    /// was not set.
    pub fn unset(self, table: &mut Table) -> bool {
        let (section, key) = self.path();
        let Some(Value::Table(section_table)) = table.get_mut(section) else {
            return false;
        };
        let removed = section_table.remove(key).is_some();
        if section_table.is_empty() {
            table.remove(section);
        }
        removed
    }
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn is_http_url(text: &str) -> bool {
    (text.starts_with("http://") || text.starts_with("https://"))
        && !text.contains(char::is_whitespace)
        && text.len() > "https://".len()
}

/// Serializes a raw table with the standard file header.
pub fn render_table(table: &Table) -> Result<String, toml::ser::Error> {
    let body = toml::to_string_pretty(table)?;
    Ok(format!(
        "# Requirements CLI Configuration\n# This file is auto-generated. You can edit it manually.\n\n{}",
        body
    ))
}

pub const DEFAULT_CONFIG: &str = r#"# Requirements CLI Configuration
# Place this file at ~/.requirements/config.toml

[color]
# Enable or disable colored output
# Default: auto-detected based on terminal support
# enabled = true

[pypi]
# Package index used by `versions`
# Default: https://pypi.org/simple/
# index_url = "https://nexus.example.com/repository/pypi/simple/"

# Used when the primary index fails (network errors only, not 404s)
# fallback_url = "https://pypi.org/simple/"

# Searched after the primary index
# extra_index_urls = ["https://private.example.com/simple/"]

[sort]
# Collation locale for sorting; "C" sorts by byte value
# locale = "en_US.UTF-8"

# Keep standalone comments when sorting
# preserve_comments = true

[edit]
# Sort files after add, update and remove
# sort = false
"#;
