//! Full-context diffs for preview output.

use diffy::{DiffOptions, Line};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Removed(String),
    Added(String),
}

impl DiffLine {
    pub fn prefix(&self) -> char {
        match self {
            DiffLine::Context(_) => ' ',
            DiffLine::Removed(_) => '-',
            DiffLine::Added(_) => '+',
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DiffLine::Context(text) | DiffLine::Removed(text) | DiffLine::Added(text) => text,
        }
    }
}

/// Diffs two texts keeping every unchanged line as context.
pub fn full_context_diff(old: &str, new: &str) -> Vec<DiffLine> {
    let context = old.lines().count().max(new.lines().count()) + 1;
    let patch = DiffOptions::new()
        .set_context_len(context)
        .create_patch(old, new);

    if patch.hunks().is_empty() {
        return old.lines().map(|l| DiffLine::Context(l.to_string())).collect();
    }

    patch
        .hunks()
        .iter()
        .flat_map(|hunk| hunk.lines())
        .map(|line| match line {
            Line::Context(text) => DiffLine::Context(strip_eol(text)),
            Line::Delete(text) => DiffLine::Removed(strip_eol(text)),
            Line::Insert(text) => DiffLine::Added(strip_eol(text)),
        })
        .collect()
}

/// Renders diff lines without headers: each line prefixed by `-`, `+` or a
/// space.
pub fn render_plain(lines: &[DiffLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push(line.prefix());
        out.push_str(line.text());
        out.push('\n');
    }
    out
}

fn strip_eol(text: &str) -> String {
    text.trim_end_matches(['\n', '\r']).to_string()
}
