//! Sorting of requirement lines.
//!
//! With comment preservation on, a file is a list of sections separated by
//! blank lines and each section is sorted on its own:
//!
//! - leading comment lines stay pinned at the top of the section;
//! - comment lines directly above a requirement or path reference move with it;
//! - unparseable lines (with the comments above them) are anchored at the top,
//!   right after the pinned comments;
//! - requirements are ordered by normalized name, path references follow in
//!   their original order;
//! - comments after the last entry stay at the end of the section;
//! - lines joined by a trailing `\` stay with the line they continue.
//!
//! Legacy mode drops standalone comments and blank lines and treats the whole
//! file as a single section.

use std::mem;

use super::collate::Collator;
use super::line::{LineKind, RequirementLine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOptions {
    pub locale: String,
    pub preserve_comments: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            locale: "C".to_string(),
            preserve_comments: true,
        }
    }
}

/// Sorts `lines`, opening a collator for `options.locale`. Falls back to
/// ordinal order (with a warning) if the locale is unavailable.
pub fn sort(lines: &[RequirementLine], options: &SortOptions) -> Vec<RequirementLine> {
    let collator = Collator::for_locale_or_ordinal(&options.locale);
    sort_with(lines, &collator, options.preserve_comments)
}

pub fn sort_with(
    lines: &[RequirementLine],
    collator: &Collator,
    preserve_comments: bool,
) -> Vec<RequirementLine> {
    if !preserve_comments {
        return sort_legacy(lines, collator);
    }

    let mut sorted = Vec::with_capacity(lines.len());
    for section in lines.split(RequirementLine::is_blank).filter(|s| !s.is_empty()) {
        if !sorted.is_empty() {
            sorted.push(RequirementLine::blank());
        }
        sorted.extend(sort_section(section, collator));
    }
    sorted
}

/// A directive together with the comment lines attached above it and the
/// continuation lines below it.
struct Entry<'a> {
    comments: Vec<&'a RequirementLine>,
    line: &'a RequirementLine,
    continuation: &'a [RequirementLine],
}

impl<'a> Entry<'a> {
    fn sort_key(&self) -> &'a str {
        self.line
            .requirement()
            .map_or("", |requirement| requirement.name().normalized())
    }

    fn into_lines(self) -> impl Iterator<Item = &'a RequirementLine> {
        self.comments
            .into_iter()
            .chain(std::iter::once(self.line))
            .chain(self.continuation)
    }
}

/// The lines continuing `lines[idx]`, up to the first one without a
/// trailing `\`.
fn continuation_of(lines: &[RequirementLine], idx: usize) -> &[RequirementLine] {
    let mut end = idx;
    while end + 1 < lines.len() && lines[end].continues() {
        end += 1;
    }
    &lines[idx + 1..=end]
}

fn sort_section(section: &[RequirementLine], collator: &Collator) -> Vec<RequirementLine> {
    let header_len = section.iter().take_while(|line| line.is_comment()).count();
    let (header, body) = section.split_at(header_len);

    let mut anchored = Vec::new();
    let mut requirements = Vec::new();
    let mut paths = Vec::new();
    let mut pending = Vec::new();

    let mut idx = 0;
    while idx < body.len() {
        let line = &body[idx];
        let continuation = continuation_of(body, idx);
        idx += 1 + continuation.len();
        let bucket = match line.kind() {
            LineKind::Comment => {
                pending.push(line);
                continue;
            }
            // Sections never contain blank lines.
            LineKind::Blank => continue,
            LineKind::Requirement(_) => &mut requirements,
            LineKind::PathReference(_) => &mut paths,
            LineKind::Unparseable => &mut anchored,
        };
        bucket.push(Entry {
            comments: mem::take(&mut pending),
            line,
            continuation,
        });
    }

    sort_entries(&mut requirements, collator);

    header
        .iter()
        .chain(anchored.into_iter().flat_map(Entry::into_lines))
        .chain(requirements.into_iter().flat_map(Entry::into_lines))
        .chain(paths.into_iter().flat_map(Entry::into_lines))
        .chain(pending)
        .cloned()
        .collect()
}

fn sort_legacy(lines: &[RequirementLine], collator: &Collator) -> Vec<RequirementLine> {
    let mut anchored = Vec::new();
    let mut requirements = Vec::new();
    let mut paths = Vec::new();

    let mut idx = 0;
    while idx < lines.len() {
        let line = &lines[idx];
        let continuation = continuation_of(lines, idx);
        idx += 1 + continuation.len();
        let bucket = match line.kind() {
            LineKind::Blank | LineKind::Comment => continue,
            LineKind::Requirement(_) => &mut requirements,
            LineKind::PathReference(_) => &mut paths,
            LineKind::Unparseable => &mut anchored,
        };
        bucket.push(Entry {
            comments: Vec::new(),
            line,
            continuation,
        });
    }

    sort_entries(&mut requirements, collator);

    anchored
        .into_iter()
        .chain(requirements)
        .chain(paths)
        .flat_map(Entry::into_lines)
        .cloned()
        .collect()
}

/// Stable, so equal names keep their relative order.
fn sort_entries(entries: &mut [Entry<'_>], collator: &Collator) {
    entries.sort_by(|a, b| collator.compare(a.sort_key(), b.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::classify;

    fn lines(texts: &[&str]) -> Vec<RequirementLine> {
        texts.iter().map(|text| classify(text)).collect()
    }

    fn texts(lines: &[RequirementLine]) -> Vec<&str> {
        lines.iter().map(RequirementLine::raw).collect()
    }

    fn sorted(input: &[&str]) -> Vec<String> {
        let sorted = sort(&lines(input), &SortOptions::default());
        texts(&sorted).into_iter().map(str::to_string).collect()
    }

    #[test]
    fn test_path_references_go_last() {
        assert_eq!(
            sorted(&["zlib==1.0", "-e ./local", "alpha==2.0"]),
            vec!["alpha==2.0", "zlib==1.0", "-e ./local"]
        );
    }

    #[test]
    fn test_path_references_keep_relative_order() {
        assert_eq!(
            sorted(&["../zeta", "b", "./alpha", "a"]),
            vec!["a", "b", "../zeta", "./alpha"]
        );
    }

    #[test]
    fn test_leading_comment_stays_above_first_package() {
        assert_eq!(
            sorted(&["# LTS", "django==3.2", "flask==2.0"]),
            vec!["# LTS", "django==3.2", "flask==2.0"]
        );
    }

    #[test]
    fn test_attached_comment_moves_with_package() {
        assert_eq!(
            sorted(&["zope==1.0", "# LTS", "django==3.2", "flask==2.0"]),
            vec!["# LTS", "django==3.2", "flask==2.0", "zope==1.0"]
        );
    }

    #[test]
    fn test_leading_comment_run_is_pinned() {
        assert_eq!(
            sorted(&["# Web", "# frameworks", "flask==2.0", "django==3.2"]),
            vec!["# Web", "# frameworks", "django==3.2", "flask==2.0"]
        );
    }

    #[test]
    fn test_inline_comments_travel_with_lines() {
        assert_eq!(
            sorted(&["requests==2.0  # http", "-e ./a  # local", "attrs  # classes"]),
            vec!["attrs  # classes", "requests==2.0  # http", "-e ./a  # local"]
        );
    }

    #[test]
    fn test_sections_sorted_independently() {
        assert_eq!(
            sorted(&["b", "a", "", "", "# dev", "z", "y", ""]),
            vec!["a", "b", "", "# dev", "y", "z"]
        );
    }

    #[test]
    fn test_sort_uses_normalized_names() {
        assert_eq!(
            sorted(&["Zope.Interface", "django_rest", "Django", "alpha"]),
            vec!["alpha", "Django", "django_rest", "Zope.Interface"]
        );
    }

    #[test]
    fn test_unparseable_lines_anchor_at_section_start() {
        assert_eq!(
            sorted(&["b", "-r base.txt", "a", "--index-url https://x/simple"]),
            vec!["-r base.txt", "--index-url https://x/simple", "a", "b"]
        );
    }

    #[test]
    fn test_continuation_lines_move_with_their_requirement() {
        let input = [
            "zope==1.0 \\",
            "    --hash=sha256:zzz",
            "# web",
            "django==3.2 \\",
            "    --hash=sha256:aaa \\",
            "    --hash=sha256:bbb",
            "attrs==23.1 --hash=sha256:ccc",
        ];
        let expected = vec![
            "attrs==23.1 --hash=sha256:ccc",
            "# web",
            "django==3.2 \\",
            "    --hash=sha256:aaa \\",
            "    --hash=sha256:bbb",
            "zope==1.0 \\",
            "    --hash=sha256:zzz",
        ];
        assert_eq!(sorted(&input), expected);

        let legacy = SortOptions {
            preserve_comments: false,
            ..SortOptions::default()
        };
        let result = sort(&lines(&input), &legacy);
        let mut without_comment = expected.clone();
        without_comment.remove(1);
        assert_eq!(texts(&result), without_comment);
    }

    #[test]
    fn test_trailing_comments_stay_at_end() {
        assert_eq!(sorted(&["b", "a", "# end"]), vec!["a", "b", "# end"]);
    }

    #[test]
    fn test_legacy_mode_drops_comments_and_blanks() {
        let options = SortOptions {
            preserve_comments: false,
            ..SortOptions::default()
        };
        let result = sort(
            &lines(&["# header", "b  # keep", "", "-e ./x", "# gone", "a"]),
            &options,
        );
        assert_eq!(texts(&result), vec!["a", "b  # keep", "-e ./x"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let inputs: Vec<Vec<&str>> = vec![
            vec!["zlib==1.0", "-e ./local", "alpha==2.0"],
            vec!["z", "# c", "a", "b", "", "", "-r x.txt", "y", "# tail"],
            vec!["b", "# about a", "a", "./p", "# about q", "../q"],
            vec!["# head", "", "c", "B", "a"],
        ];
        for input in inputs {
            let collator = Collator::Ordinal;
            let once = sort_with(&lines(&input), &collator, true);
            let twice = sort_with(&once, &collator, true);
            assert_eq!(texts(&once), texts(&twice), "input {:?}", input);

            let once = sort_with(&lines(&input), &collator, false);
            let twice = sort_with(&once, &collator, false);
            assert_eq!(texts(&once), texts(&twice), "legacy input {:?}", input);
        }
    }

    #[test_log::test]
    fn test_unavailable_locale_still_sorts() {
        let options = SortOptions {
            locale: "xx_NOWHERE.UTF-8".to_string(),
            preserve_comments: true,
        };
        let err = match Collator::for_locale(&options.locale) {
            Err(err) => err,
            Ok(_) => panic!("locale {} should not exist", options.locale),
        };
        assert_eq!(err.to_string(), "locale 'xx_NOWHERE.UTF-8' is not available");

        let result = sort(&lines(&["b", "a", "Zope"]), &options);
        assert_eq!(texts(&result), vec!["a", "b", "Zope"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(sort(&[], &SortOptions::default()).is_empty());
        assert!(sort(&lines(&["", "  "]), &SortOptions::default()).is_empty());
    }
}
