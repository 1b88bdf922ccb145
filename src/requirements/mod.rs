//! The requirements-file text model.
//!
//! - `line` - classifies raw lines into [`RequirementLine`]s
//! - `name` - package name normalization and matching
//! - `specifier` - structural specifier checks
//! - `collate` - locale-aware comparison
//! - `sort` - the section-aware sort engine
//! - `edit` - add, update and remove
//! - `document` - whole-file parse and serialization

mod collate;
mod document;
mod edit;
mod line;
mod name;
mod sort;
mod specifier;

pub use collate::{Collator, LocaleUnavailable};
pub use document::{Document, LineEnding};
pub use edit::{Edit, EditOutcome, EditStatus, Operation, add, remove, update};
pub use line::{InlineComment, LineKind, PathReference, Requirement, RequirementLine, Specifier, classify};
pub use name::{PackageName, is_valid_name, matches, normalize_name};
pub use sort::{SortOptions, sort, sort_with};
pub use specifier::{ensure_operator, has_operator, is_well_formed, normalize_specifier};
