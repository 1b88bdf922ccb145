//! Whole-file parsing and serialization.

use super::line::{RequirementLine, classify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// The ending of the first line is used when the file is rewritten.
    fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(idx) if text[..idx].ends_with('\r') => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }
}

/// The classified lines of one requirements file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<RequirementLine>,
    /// The ending read after each line; the last line has none when the
    /// file lacks a final newline.
    endings: Vec<LineEnding>,
    line_ending: LineEnding,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut endings = Vec::new();
        for piece in text.split_inclusive('\n') {
            let (line, ending) = if let Some(line) = piece.strip_suffix("\r\n") {
                (line, Some(LineEnding::CrLf))
            } else if let Some(line) = piece.strip_suffix('\n') {
                (line, Some(LineEnding::Lf))
            } else {
                (piece, None)
            };
            lines.push(classify(line));
            endings.extend(ending);
        }

        Self {
            lines,
            endings,
            line_ending: LineEnding::detect(text),
        }
    }

    pub fn lines(&self) -> &[RequirementLine] {
        &self.lines
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// A document with the same formatting but different lines.
    pub fn with_lines(&self, lines: Vec<RequirementLine>) -> Self {
        Self {
            endings: vec![self.line_ending; lines.len()],
            lines,
            line_ending: self.line_ending,
        }
    }

    /// Reassembles the lines exactly as they were read.
    #[cfg(test)]
    pub fn to_original_text(&self) -> String {
        let mut text = String::new();
        for (idx, line) in self.lines.iter().enumerate() {
            text.push_str(line.raw());
            if let Some(ending) = self.endings.get(idx) {
                text.push_str(ending.as_str());
            }
        }
        text
    }

    /// The text written to disk after an edit: lines joined by single
    /// newlines, trailing whitespace stripped, exactly one final newline.
    pub fn render(&self) -> String {
        let joined = join(&self.lines, self.line_ending);
        let mut text = joined.trim_end().to_string();
        text.push_str(self.line_ending.as_str());
        text
    }
}

fn join(lines: &[RequirementLine], line_ending: LineEnding) -> String {
    lines
        .iter()
        .map(RequirementLine::raw)
        .collect::<Vec<_>>()
        .join(line_ending.as_str())
}
