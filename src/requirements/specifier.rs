//! Structural checks on version specifiers.
//!
//! Specifiers are carried as opaque text. The only semantics applied here are
//! a structural PEP 440 shape check and detection of a missing operator.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::UserInputError;

/// Comparison operators, longest first so prefixes resolve correctly.
pub const OPERATORS: [&str; 8] = ["===", "==", "~=", "!=", ">=", "<=", ">", "<"];

static CLAUSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(===|==|~=|!=|>=|<=|>|<)\s*[A-Za-z0-9][A-Za-z0-9.*+!_-]*\s*$")
        .expect("valid clause pattern")
});

/// Returns true if the text begins with a comparison operator.
pub fn has_operator(specifier: &str) -> bool {
    let trimmed = specifier.trim_start();
    OPERATORS.iter().any(|op| trimmed.starts_with(op))
}

/// Returns true if `text` is a comma-separated list of `<op><version>`
/// clauses, optionally wrapped in parentheses.
pub fn is_well_formed(text: &str) -> bool {
    let mut inner = text.trim();
    if let Some(stripped) = inner.strip_prefix('(') {
        match stripped.strip_suffix(')') {
            Some(s) => inner = s,
            None => return false,
        }
    }
    !inner.trim().is_empty() && inner.split(',').all(|clause| CLAUSE_PATTERN.is_match(clause))
}

/// Prefixes `==` when no operator is present.
pub fn ensure_operator(specifier: &str) -> String {
    let trimmed = specifier.trim();
    if has_operator(trimmed) {
        trimmed.to_string()
    } else {
        format!("=={}", trimmed)
    }
}

/// Prefixes `==` when no operator is present, then checks the result.
pub fn normalize_specifier(input: &str) -> Result<String, UserInputError> {
    let specifier = ensure_operator(input);
    if is_well_formed(&specifier) {
        Ok(specifier)
    } else {
        Err(UserInputError::InvalidSpecifier(input.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_specifier_injects_equals() {
        assert_eq!(normalize_specifier("4.2.0").unwrap(), "==4.2.0");
        assert_eq!(normalize_specifier(" 1.0 ").unwrap(), "==1.0");
    }

    #[test]
    fn test_normalize_specifier_keeps_operators() {
        for spec in [">=4.2.0", "~=4.2", "!=4.1.0", "<5", ">1", "<=2.0", "===1.0-custom"] {
            assert_eq!(normalize_specifier(spec).unwrap(), spec);
        }
        assert_eq!(
            normalize_specifier(">=4.0.0,<5.0.0").unwrap(),
            ">=4.0.0,<5.0.0"
        );
        assert_eq!(normalize_specifier("==2.*").unwrap(), "==2.*");
    }

    #[test]
    fn test_normalize_specifier_rejects_garbage() {
        assert!(normalize_specifier("").is_err());
        assert!(normalize_specifier(">=").is_err());
        assert!(normalize_specifier("1.0 2.0").is_err());
        assert!(normalize_specifier(">=1.0,,<2").is_err());
        assert!(normalize_specifier("=>1.0").is_err());
    }

    #[test]
    fn test_is_well_formed_accepts_parenthesized() {
        assert!(is_well_formed("(>=1.0, <2.0)"));
        assert!(!is_well_formed("(>=1.0"));
    }

    #[test]
    fn test_ensure_operator() {
        assert_eq!(ensure_operator("4.2.0"), "==4.2.0");
        assert_eq!(ensure_operator(">=1"), ">=1");
    }

    #[test]
    fn test_has_operator() {
        assert!(has_operator("==1.0"));
        assert!(has_operator(" >1"));
        assert!(!has_operator("1.0"));
    }
}
