//! Package names: normalization, validation and line matching.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::line::{LineKind, RequirementLine};
use crate::error::UserInputError;

/// PEP 508 distribution name.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?$").expect("valid name pattern")
});

static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("valid separator pattern"));

/// Normalizes a package name: lowercase, with runs of `-`, `_` and `.`
/// collapsed to a single `-`.
pub fn normalize_name(name: &str) -> String {
    SEPARATOR_RUNS
        .replace_all(&name.to_lowercase(), "-")
        .into_owned()
}

/// Returns true if `name` is a syntactically valid distribution name.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// A package name as written, with its normalized identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageName {
    display: String,
    normalized: String,
}

impl PackageName {
    /// Builds a name from text already known to be a valid name token.
    pub(crate) fn new_unchecked(display: &str) -> Self {
        Self {
            display: display.to_string(),
            normalized: normalize_name(display),
        }
    }

    /// Parses user input into a package name.
    pub fn parse(input: &str) -> Result<Self, UserInputError> {
        let trimmed = input.trim();
        if !is_valid_name(trimmed) {
            return Err(UserInputError::InvalidPackageName(input.to_string()));
        }
        Ok(Self::new_unchecked(trimmed))
    }

    /// The original spelling.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Decides whether `candidate` is a requirement on the package `target`.
///
/// Extras and specifiers are ignored: only the package identity counts.
/// Path references, comments, blanks and unparseable lines never match.
pub fn matches(candidate: &RequirementLine, target: &str) -> bool {
    match candidate.kind() {
        LineKind::Requirement(requirement) => {
            requirement.name().normalized() == normalize_name(target.trim())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::classify;

    #[test]
    fn test_normalize_name_collapses_separators() {
        assert_eq!(normalize_name("Django"), "django");
        assert_eq!(normalize_name("django_rest"), "django-rest");
        assert_eq!(normalize_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_name("A__B-._C"), "a-b-c");
    }

    #[test]
    fn test_matches_is_case_and_separator_insensitive() {
        assert!(matches(&classify("Django==3.2"), "django"));
        assert!(matches(&classify("django_rest"), "django-rest"));
        assert!(matches(&classify("django-rest>=1.0"), "Django_Rest"));
        assert!(matches(&classify("zope.interface"), "zope-interface"));
    }

    #[test]
    fn test_matches_ignores_extras_and_specifier() {
        assert!(matches(&classify("requests[security]>=2.0"), "requests"));
        assert!(matches(&classify("requests  # pinned elsewhere"), "requests"));
        assert!(matches(
            &classify("requests @ https://example.com/requests-2.0.whl"),
            "requests"
        ));
    }

    #[test]
    fn test_matches_requires_whole_name() {
        assert!(!matches(&classify("django-rest==1.0"), "django"));
        assert!(!matches(&classify("django==1.0"), "django-rest"));
    }

    #[test]
    fn test_non_requirement_lines_never_match() {
        assert!(!matches(&classify("# django==3.2"), "django"));
        assert!(!matches(&classify(""), "django"));
        assert!(!matches(&classify("-e ./django"), "django"));
        assert!(!matches(
            &classify("git+https://github.com/user/repo.git#egg=django"),
            "django"
        ));
        assert!(!matches(&classify("-r django.txt"), "django"));
    }

    #[test]
    fn test_package_name_parse() {
        let name = PackageName::parse(" Django_Rest ").unwrap();
        assert_eq!(name.as_str(), "Django_Rest");
        assert_eq!(name.normalized(), "django-rest");

        assert!(PackageName::parse("").is_err());
        assert!(PackageName::parse("-django").is_err());
        assert!(PackageName::parse("django==3.2").is_err());
        assert!(PackageName::parse("my package").is_err());
    }
}
