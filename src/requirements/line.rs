//! Line classification for requirements files.
//!
//! Every physical line maps to exactly one [`RequirementLine`]. The raw text
//! is always kept, so lines that are never edited serialize byte-for-byte.

use std::sync::LazyLock;

use regex::Regex;

use super::name::PackageName;
use super::specifier::is_well_formed;

static REQUIREMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)(?P<extras>\s*\[[^\]]*\])?(?P<rest>.*)$",
    )
    .expect("valid requirement pattern")
});

const PATH_PREFIXES: [&str; 5] = ["./", "../", ".\\", "..\\", "~/"];

const URL_PREFIXES: [&str; 8] = [
    "git+", "git://", "hg+", "svn+", "bzr+", "http://", "https://", "file:",
];

const ARCHIVE_SUFFIXES: [&str; 5] = [".whl", ".tar.gz", ".tgz", ".tar.bz2", ".zip"];

/// A trailing `#` comment, with the whitespace that separated it from the
/// directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineComment {
    gap: String,
    text: String,
}

impl InlineComment {
    /// The comment text, starting with `#`.
    pub fn text(&self) -> &str {
        &self.text
    }

    fn render_into(&self, out: &mut String) {
        out.push_str(&self.gap);
        out.push_str(&self.text);
    }
}

/// The version constraint attached to a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier {
    /// Bare package name.
    Unpinned,
    /// Version clauses, kept verbatim (e.g. `>=1.0,<2.0`).
    Version(String),
    /// Direct reference (`name @ url`).
    Url(String),
}

impl Specifier {
    pub fn as_str(&self) -> &str {
        match self {
            Specifier::Unpinned => "",
            Specifier::Version(text) | Specifier::Url(text) => text,
        }
    }
}

/// A package requirement: name, extras, specifier, marker, pip options and
/// comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    name: PackageName,
    extras: Option<String>,
    specifier: Specifier,
    marker: Option<String>,
    options: Option<String>,
    comment: Option<InlineComment>,
}

impl Requirement {
    /// Builds a new requirement from user intent.
    pub fn new(name: PackageName, extras: &[String], specifier: Option<&str>) -> Self {
        let extras = (!extras.is_empty()).then(|| format!("[{}]", extras.join(",")));
        let specifier = match specifier {
            Some(text) if !text.trim().is_empty() => Specifier::Version(text.trim().to_string()),
            _ => Specifier::Unpinned,
        };
        Self {
            name,
            extras,
            specifier,
            marker: None,
            options: None,
            comment: None,
        }
    }

    pub fn name(&self) -> &PackageName {
        &self.name
    }

    /// The extras in the order written.
    #[cfg(test)]
    pub fn extras(&self) -> Vec<&str> {
        self.extras
            .as_deref()
            .map(|text| {
                text.trim()
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .split(',')
                    .map(str::trim)
                    .filter(|extra| !extra.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn specifier(&self) -> &Specifier {
        &self.specifier
    }

    /// Environment marker text, verbatim from the whitespace before `;`.
    #[cfg(test)]
    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// Trailing pip options (`--hash=...`) and continuation, verbatim.
    #[cfg(test)]
    pub fn options(&self) -> Option<&str> {
        self.options.as_deref()
    }

    pub fn comment(&self) -> Option<&InlineComment> {
        self.comment.as_ref()
    }

    /// Returns a copy with the specifier replaced; everything else is kept.
    pub fn with_specifier(&self, specifier: &str) -> Self {
        Self {
            specifier: Specifier::Version(specifier.to_string()),
            ..self.clone()
        }
    }

    /// Renders the requirement back to a single line.
    pub fn render(&self) -> String {
        let mut out = self.name.as_str().to_string();
        if let Some(extras) = &self.extras {
            out.push_str(extras);
        }
        match &self.specifier {
            Specifier::Unpinned => {}
            Specifier::Version(text) => out.push_str(text),
            Specifier::Url(url) => {
                out.push_str(" @ ");
                out.push_str(url);
            }
        }
        if let Some(marker) = &self.marker {
            out.push_str(marker);
        }
        if let Some(options) = &self.options {
            out.push_str(options);
        }
        if let Some(comment) = &self.comment {
            comment.render_into(&mut out);
        }
        out
    }
}

/// A local path, editable install, VCS or direct URL reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathReference {
    target: String,
    comment: Option<InlineComment>,
}

impl PathReference {
    /// The reference without its inline comment (e.g. `-e ./local`).
    #[cfg(test)]
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn comment(&self) -> Option<&InlineComment> {
        self.comment.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    PathReference(PathReference),
    Requirement(Requirement),
    /// Anything else; passes through every operation untouched.
    Unparseable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementLine {
    raw: String,
    kind: LineKind,
}

impl RequirementLine {
    pub fn from_requirement(requirement: Requirement) -> Self {
        Self {
            raw: requirement.render(),
            kind: LineKind::Requirement(requirement),
        }
    }

    pub fn blank() -> Self {
        Self {
            raw: String::new(),
            kind: LineKind::Blank,
        }
    }

    /// The text this line serializes to.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &LineKind {
        &self.kind
    }

    pub fn requirement(&self) -> Option<&Requirement> {
        match &self.kind {
            LineKind::Requirement(requirement) => Some(requirement),
            _ => None,
        }
    }

    pub fn inline_comment(&self) -> Option<&InlineComment> {
        match &self.kind {
            LineKind::Requirement(requirement) => requirement.comment(),
            LineKind::PathReference(reference) => reference.comment(),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.kind, LineKind::Blank)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, LineKind::Comment)
    }

    /// Whether a trailing `\` joins this line to the next one. Comment lines
    /// never continue.
    pub fn continues(&self) -> bool {
        !self.is_comment() && self.raw.trim_end().ends_with('\\')
    }
}

/// Classifies one raw line of a requirements file.
pub fn classify(raw: &str) -> RequirementLine {
    RequirementLine {
        raw: raw.to_string(),
        kind: classify_kind(raw),
    }
}

fn classify_kind(raw: &str) -> LineKind {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with('#') {
        return LineKind::Comment;
    }

    let (content, comment) = split_inline_comment(trimmed);
    if is_path_reference(content) {
        return LineKind::PathReference(PathReference {
            target: content.to_string(),
            comment,
        });
    }

    match parse_requirement(content, comment) {
        Some(requirement) => LineKind::Requirement(requirement),
        None => LineKind::Unparseable,
    }
}

/// Splits off a `#` comment that is preceded by whitespace. A `#` glued to
/// the preceding token (URL fragments, `==1.0#x`) is left in the content.
fn split_inline_comment(text: &str) -> (&str, Option<InlineComment>) {
    for (idx, ch) in text.char_indices() {
        if ch == '#' && text[..idx].ends_with(char::is_whitespace) {
            let content = text[..idx].trim_end();
            let comment = InlineComment {
                gap: text[content.len()..idx].to_string(),
                text: text[idx..].to_string(),
            };
            return (content, Some(comment));
        }
    }
    (text, None)
}

fn is_path_reference(content: &str) -> bool {
    let lower = content.to_ascii_lowercase();

    if lower.starts_with("-e ")
        || lower.starts_with("-e\t")
        || lower.starts_with("--editable ")
        || lower.starts_with("--editable=")
    {
        return true;
    }

    if content == "." || content == ".." || PATH_PREFIXES.iter().any(|p| content.starts_with(p)) {
        return true;
    }

    if is_absolute_path(content) || URL_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }

    // A bare archive filename such as `pkg-1.0.tar.gz`, possibly followed by
    // a marker or options.
    let first = lower.split_whitespace().next().unwrap_or_default();
    ARCHIVE_SUFFIXES.iter().any(|s| first.ends_with(s))
        && !first.contains(['@', '=', '<', '>', '~', '!', ';'])
}

fn is_absolute_path(content: &str) -> bool {
    let bytes = content.as_bytes();
    if content.starts_with('/') || content.starts_with('\\') {
        return true;
    }
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && matches!(bytes[2], b'\\' | b'/')
}

fn parse_requirement(content: &str, comment: Option<InlineComment>) -> Option<Requirement> {
    let caps = REQUIREMENT_PATTERN.captures(content)?;
    let name = PackageName::new_unchecked(&caps["name"]);
    let extras = caps.name("extras").map(|m| m.as_str().to_string());
    let rest = caps.name("rest").map_or("", |m| m.as_str());
    let (rest, options) = split_options(rest)?;

    let (specifier, marker) = match rest.trim_start().strip_prefix('@') {
        Some(url_part) => parse_url_specifier(url_part.trim_start())?,
        None => parse_version_specifier(rest)?,
    };

    Some(Requirement {
        name,
        extras,
        specifier,
        marker,
        options,
        comment,
    })
}

/// Splits per-requirement options (`--hash=sha256:...`) and a final `\`
/// continuation off the end of a requirement. Both must be separated from
/// the requirement by whitespace.
fn split_options(rest: &str) -> Option<(&str, Option<String>)> {
    let start = rest.char_indices().find(|&(idx, ch)| {
        (ch == '\\' || rest[idx..].starts_with("--")) && rest[..idx].ends_with(char::is_whitespace)
    });
    let Some((idx, _)) = start else {
        return Some((rest, None));
    };

    let tokens: Vec<&str> = rest[idx..].split_whitespace().collect();
    let well_formed = tokens.iter().enumerate().all(|(pos, token)| {
        if *token == "\\" {
            pos + 1 == tokens.len()
        } else {
            is_option(token)
        }
    });
    if !well_formed {
        return None;
    }

    let head = rest[..idx].trim_end();
    Some((head, Some(rest[head.len()..].to_string())))
}

/// `--name` or `--name=value`.
fn is_option(token: &str) -> bool {
    let Some(body) = token.strip_prefix("--") else {
        return false;
    };
    let name = body.split_once('=').map_or(body, |(name, _)| name);
    !name.is_empty() && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
}

/// `name @ url [; marker]`; the marker must be separated by whitespace.
fn parse_url_specifier(text: &str) -> Option<(Specifier, Option<String>)> {
    let marker_start = text
        .char_indices()
        .find(|&(idx, ch)| ch == ';' && text[..idx].ends_with(char::is_whitespace))
        .map(|(idx, _)| idx);

    let (url, marker) = match marker_start {
        Some(idx) => {
            let url = text[..idx].trim_end();
            (url, Some(text[url.len()..].to_string()))
        }
        None => (text, None),
    };

    if url.is_empty() || url.contains(char::is_whitespace) {
        return None;
    }
    if let Some(marker) = &marker {
        if !is_valid_marker(marker) {
            return None;
        }
    }
    Some((Specifier::Url(url.to_string()), marker))
}

fn parse_version_specifier(rest: &str) -> Option<(Specifier, Option<String>)> {
    let (spec_text, marker) = match rest.find(';') {
        Some(idx) => {
            let spec = rest[..idx].trim_end();
            (spec, Some(rest[spec.len()..].to_string()))
        }
        None => (rest, None),
    };

    if spec_text.contains('#') {
        return None;
    }
    if let Some(marker) = &marker {
        if !is_valid_marker(marker) {
            return None;
        }
    }

    let spec_text = spec_text.trim();
    let specifier = if spec_text.is_empty() {
        Specifier::Unpinned
    } else if is_well_formed(spec_text) {
        Specifier::Version(spec_text.to_string())
    } else {
        return None;
    };
    Some((specifier, marker))
}

fn is_valid_marker(marker: &str) -> bool {
    let body = marker.trim_start().trim_start_matches(';').trim();
    !body.is_empty() && !body.contains('#')
}
