//! Terminal colors for rendered diagnostics

use crossterm::style::Stylize;

/// ANSI styling for rendered diagnostics.
///
/// Whether colors are wanted is decided once by the caller (usually from
/// terminal detection at startup) and passed in here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    colored: bool,
}

impl Style {
    pub const PLAIN: Style = Style { colored: false };
    pub const COLORED: Style = Style { colored: true };

    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    /// `file:line:col` prefix
    pub fn location(&self, text: &str) -> String {
        if self.colored {
            text.bold().white().to_string()
        } else {
            text.to_string()
        }
    }

    /// The `error:` label
    pub fn error(&self, text: &str) -> String {
        if self.colored {
            text.bold().red().to_string()
        } else {
            text.to_string()
        }
    }

    /// Highlighted excerpt text and the caret line underneath it
    pub fn highlight(&self, text: &str) -> String {
        if self.colored && !text.is_empty() {
            text.bold().red().to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_style_is_passthrough() {
        let style = Style::PLAIN;
        assert_eq!(style.location("a.h:1:1:"), "a.h:1:1:");
        assert_eq!(style.error("error:"), "error:");
        assert_eq!(style.highlight("^~~"), "^~~");
    }

    #[test]
    fn test_colored_style_wraps_text() {
        let styled = Style::COLORED.error("error:");
        assert!(styled.contains("error:"));
        assert!(styled.starts_with('\u{1b}'));
    }
}
