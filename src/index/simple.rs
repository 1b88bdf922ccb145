//! Parsing Simple Repository API responses into version lists.
//!
//! JSON responses follow PEP 691 and HTML responses PEP 503. In both cases
//! only the file names and their yanked flags matter.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use super::version::sort_newest_first;
use crate::requirements::normalize_name;

/// Prefers the JSON form and accepts HTML from older indexes.
pub const ACCEPT: &str = "application/vnd.pypi.simple.v1+json, text/html;q=0.1";

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("valid anchor pattern")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

static YANKED_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)data-yanked\b").expect("valid attribute pattern"));

const SDIST_SUFFIXES: [&str; 2] = [".tar.gz", ".zip"];

/// One file listed for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub filename: String,
    pub yanked: bool,
}

#[derive(Deserialize)]
struct ProjectPage {
    #[serde(default)]
    files: Vec<JsonFile>,
}

#[derive(Deserialize)]
struct JsonFile {
    filename: String,
    #[serde(default)]
    yanked: Option<serde_json::Value>,
}

impl JsonFile {
    /// `yanked` is either a boolean or a reason string.
    fn is_yanked(&self) -> bool {
        match &self.yanked {
            Some(serde_json::Value::Bool(yanked)) => *yanked,
            Some(serde_json::Value::String(_)) => true,
            _ => false,
        }
    }
}

pub fn parse_json(body: &str) -> Result<Vec<ProjectFile>> {
    let page: ProjectPage =
        serde_json::from_str(body).context("Failed to parse JSON project page")?;
    Ok(page
        .files
        .into_iter()
        .map(|file| ProjectFile {
            yanked: file.is_yanked(),
            filename: file.filename,
        })
        .collect())
}

pub fn parse_html(body: &str) -> Vec<ProjectFile> {
    ANCHOR
        .captures_iter(body)
        .map(|caps| {
            let text = TAG.replace_all(&caps[2], "");
            ProjectFile {
                filename: unescape(text.trim()),
                yanked: YANKED_ATTR.is_match(&caps[1]),
            }
        })
        .filter(|file| !file.filename.is_empty())
        .collect()
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Parses a project page, picking the format from the content type or,
/// failing that, from the body itself.
pub fn parse_project_page(content_type: Option<&str>, body: &str) -> Result<Vec<ProjectFile>> {
    let is_json = match content_type {
        Some(ct) => ct.to_ascii_lowercase().contains("json"),
        None => body.trim_start().starts_with('{'),
    };
    if is_json {
        parse_json(body)
    } else {
        Ok(parse_html(body))
    }
}

/// Builds a matcher for distribution file names of `package`, tolerating
/// any run of `-`, `_` or `.` between the parts of the name.
fn filename_prefix(package: &str) -> Option<Regex> {
    let normalized = normalize_name(package);
    let parts: Vec<String> = normalized.split('-').map(regex::escape).collect();
    Regex::new(&format!(r"^{}[-_](?P<rest>.+)$", parts.join("[-_.]+"))).ok()
}

/// The version encoded in a wheel or sdist file name, if it names `package`.
pub fn version_from_filename(package: &str, filename: &str) -> Option<String> {
    let lower = filename.to_ascii_lowercase();
    version_with_prefix(&filename_prefix(package)?, &lower)
}

fn version_with_prefix(prefix: &Regex, lower: &str) -> Option<String> {
    let rest = prefix.captures(lower)?.name("rest")?.as_str();

    if let Some(stem) = rest.strip_suffix(".whl") {
        let mut parts = stem.split('-');
        let version = parts.next()?;
        // A wheel has at least python, abi and platform tags after the version.
        if parts.count() < 3 {
            return None;
        }
        return Some(version.to_string());
    }

    SDIST_SUFFIXES
        .iter()
        .find_map(|suffix| rest.strip_suffix(suffix))
        .map(str::to_string)
}

/// Valid, de-duplicated versions of `package` among `files`, newest first.
pub fn extract_versions(package: &str, files: &[ProjectFile], include_yanked: bool) -> Vec<String> {
    let Some(prefix) = filename_prefix(package) else {
        return Vec::new();
    };
    sort_newest_first(
        files
            .iter()
            .filter(|file| include_yanked || !file.yanked)
            .filter_map(|file| version_with_prefix(&prefix, &file.filename.to_ascii_lowercase())),
    )
}
