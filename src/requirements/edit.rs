//! Edit operations: pure transformations over the lines of one file.

use std::fmt;

use super::collate::Collator;
use super::line::{Requirement, RequirementLine};
use super::name::{PackageName, matches};
use super::sort::{SortOptions, sort_with};
use super::specifier::ensure_operator;

/// What the user asked to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Add {
        name: PackageName,
        specifier: Option<String>,
        extras: Vec<String>,
    },
    Update {
        name: PackageName,
        specifier: String,
    },
    Remove {
        name: PackageName,
    },
    Sort,
}

impl Edit {
    pub fn package(&self) -> Option<&PackageName> {
        match self {
            Edit::Add { name, .. } | Edit::Update { name, .. } | Edit::Remove { name } => Some(name),
            Edit::Sort => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStatus {
    /// The edit changed the file.
    Applied,
    /// `add` found the package already listed.
    AlreadyPresent,
    /// `update`/`remove` found no line for the package.
    NotFound,
    /// Matched, but the result is identical (same specifier, already sorted).
    Unchanged,
}

/// Result of running an edit over one file's lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub lines: Vec<RequirementLine>,
    pub changed: bool,
    pub status: EditStatus,
    pub description: String,
}

impl EditOutcome {
    fn unchanged(lines: &[RequirementLine], status: EditStatus, description: String) -> Self {
        Self {
            lines: lines.to_vec(),
            changed: false,
            status,
            description,
        }
    }

    fn applied(lines: Vec<RequirementLine>, description: String) -> Self {
        Self {
            lines,
            changed: true,
            status: EditStatus::Applied,
            description,
        }
    }
}

/// Appends a requirement after the last non-blank line unless the package is
/// already listed.
pub fn add(
    lines: &[RequirementLine],
    name: &PackageName,
    specifier: Option<&str>,
    extras: &[String],
) -> EditOutcome {
    if lines.iter().any(|line| matches(line, name.as_str())) {
        return EditOutcome::unchanged(
            lines,
            EditStatus::AlreadyPresent,
            format!("{} is already present", name),
        );
    }

    let specifier = specifier
        .filter(|text| !text.trim().is_empty())
        .map(ensure_operator);
    let requirement = Requirement::new(name.clone(), extras, specifier.as_deref());
    let description = format!("Added {}", requirement.render());

    let insert_at = lines
        .iter()
        .rposition(|line| !line.is_blank())
        .map_or(0, |idx| idx + 1);
    let mut result = lines.to_vec();
    result.insert(insert_at, RequirementLine::from_requirement(requirement));
    EditOutcome::applied(result, description)
}

/// Rewrites the specifier of every line for the package, keeping extras,
/// marker, inline comment and position.
pub fn update(lines: &[RequirementLine], name: &PackageName, specifier: &str) -> EditOutcome {
    let specifier = ensure_operator(specifier);
    let mut found = false;
    let mut changed = false;

    let result: Vec<RequirementLine> = lines
        .iter()
        .map(|line| match line.requirement() {
            Some(requirement) if matches(line, name.as_str()) => {
                found = true;
                let updated = RequirementLine::from_requirement(requirement.with_specifier(&specifier));
                if updated.raw() != line.raw() {
                    changed = true;
                }
                updated
            }
            _ => line.clone(),
        })
        .collect();

    if !found {
        return EditOutcome::unchanged(
            lines,
            EditStatus::NotFound,
            format!("package {} not found", name),
        );
    }
    if !changed {
        return EditOutcome::unchanged(
            lines,
            EditStatus::Unchanged,
            format!("{} is already {}", name, specifier),
        );
    }
    EditOutcome::applied(result, format!("Updated {} to {}", name, specifier))
}

/// Drops every line for the package, along with the `\` continuation lines
/// that belong to it; all other lines keep their order.
pub fn remove(lines: &[RequirementLine], name: &PackageName) -> EditOutcome {
    let mut result = Vec::with_capacity(lines.len());
    let mut dropping = false;
    for line in lines {
        if dropping || matches(line, name.as_str()) {
            dropping = line.continues();
            continue;
        }
        result.push(line.clone());
    }

    if result.len() == lines.len() {
        return EditOutcome::unchanged(
            lines,
            EditStatus::NotFound,
            format!("package {} not found", name),
        );
    }
    let count = lines.len() - result.len();
    EditOutcome::applied(result, format!("Removed {} ({} line(s))", name, count))
}

fn sort_lines(lines: &[RequirementLine], collator: &Collator, preserve_comments: bool) -> EditOutcome {
    let sorted = sort_with(lines, collator, preserve_comments);
    let same = sorted.len() == lines.len()
        && sorted.iter().zip(lines).all(|(a, b)| a.raw() == b.raw());
    if same {
        EditOutcome::unchanged(lines, EditStatus::Unchanged, "already sorted".to_string())
    } else {
        EditOutcome::applied(sorted, "sorted".to_string())
    }
}

/// An edit together with the sort settings it runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub edit: Edit,
    pub sort: SortOptions,
    /// Re-sort the file after a successful add, update or remove.
    pub sort_after_edit: bool,
}

impl Operation {
    pub fn new(edit: Edit) -> Self {
        Self {
            edit,
            sort: SortOptions::default(),
            sort_after_edit: false,
        }
    }

    pub fn with_sort(mut self, sort: SortOptions, sort_after_edit: bool) -> Self {
        self.sort = sort;
        self.sort_after_edit = sort_after_edit;
        self
    }

    /// The collator for this operation's locale, falling back to ordinal.
    pub fn collator(&self) -> Collator {
        Collator::for_locale_or_ordinal(&self.sort.locale)
    }

    pub fn run(&self, lines: &[RequirementLine], collator: &Collator) -> EditOutcome {
        let mut outcome = match &self.edit {
            Edit::Add {
                name,
                specifier,
                extras,
            } => add(lines, name, specifier.as_deref(), extras),
            Edit::Update { name, specifier } => update(lines, name, specifier),
            Edit::Remove { name } => remove(lines, name),
            Edit::Sort => return sort_lines(lines, collator, self.sort.preserve_comments),
        };

        if outcome.changed && self.sort_after_edit {
            outcome.lines = sort_with(&outcome.lines, collator, self.sort.preserve_comments);
        }
        outcome
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Add { name, .. } => write!(f, "add {}", name),
            Edit::Update { name, specifier } => write!(f, "update {} {}", name, specifier),
            Edit::Remove { name } => write!(f, "remove {}", name),
            Edit::Sort => f.write_str("sort"),
        }
    }
}
