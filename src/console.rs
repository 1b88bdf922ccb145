//! Styled terminal output.

use owo_colors::OwoColorize;

use crate::runtime::Runtime;

/// Decides on color once and styles text accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Console {
    color: bool,
}

/// Picks color mode: the `--color`/`--no-color` flag, then `NO_COLOR`, then
/// the configured `color.enabled`, then terminal detection.
pub fn should_use_color<R: Runtime + ?Sized>(
    runtime: &R,
    flag: Option<bool>,
    configured: Option<bool>,
) -> bool {
    if let Some(color) = flag {
        return color;
    }
    if runtime.env_var("NO_COLOR").is_ok() {
        return false;
    }
    if let Some(color) = configured {
        return color;
    }
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

impl Console {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn path(&self, text: &str) -> String {
        if self.color {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn package(&self, text: &str) -> String {
        if self.color {
            text.green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn version(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn warning(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn error(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    /// Colors a rendered diff line by its prefix.
    pub fn diff_line(&self, line: &str) -> String {
        if !self.color {
            return line.to_string();
        }
        match line.chars().next() {
            Some('+') => line.green().to_string(),
            Some('-') => line.red().to_string(),
            _ => line.to_string(),
        }
    }

    pub fn print_diff(&self, diff: &str) {
        for line in diff.lines() {
            println!("{}", self.diff_line(line));
        }
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{}", self.warning(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn runtime(no_color: bool) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq("NO_COLOR"))
            .returning(move |_| {
                if no_color {
                    Ok(String::new())
                } else {
                    Err(std::env::VarError::NotPresent)
                }
            });
        runtime
    }

    #[test]
    fn test_flag_wins() {
        assert!(should_use_color(&runtime(true), Some(true), Some(false)));
        assert!(!should_use_color(&runtime(false), Some(false), Some(true)));
    }

    #[test]
    fn test_no_color_beats_config() {
        assert!(!should_use_color(&runtime(true), None, Some(true)));
    }

    #[test]
    fn test_config_beats_detection() {
        assert!(should_use_color(&runtime(false), None, Some(true)));
        assert!(!should_use_color(&runtime(false), None, Some(false)));
    }

    #[test]
    fn test_plain_console_leaves_text_alone() {
        let console = Console::plain();
        assert_eq!(console.path("requirements.txt"), "requirements.txt");
        assert_eq!(console.diff_line("+django"), "+django");
    }

    #[test]
    fn test_colored_console_emits_ansi() {
        let console = Console::new(true);
        assert!(console.package("django").contains("\u{1b}["));
        assert!(console.diff_line("-old").contains("\u{1b}[31m"));
        assert_eq!(console.diff_line(" same"), " same");
    }
}
