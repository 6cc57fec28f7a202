//! Positioned error messages
//!
//! A [`Diagnostic`] is a message anchored to a [`Span`]. The [`Renderer`]
//! turns it into the familiar compiler layout:
//!
//! ```text
//! settings.h:4:26: error: Value in CONSTRAIN() must be in range -128 to 127
//! 4 | i8 volume CONSTRAIN(0, 300);
//!   |                        ^~~
//! ```
//!
//! The excerpt covers every line the span touches, with the common leading
//! indentation removed. The first underlined byte gets a `^`, every other
//! one a `~`.

pub mod style;

pub use style::Style;

use crate::source::{SourceMap, Span};

/// A single error message anchored to source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// Formats diagnostics against the buffers of a [`SourceMap`].
pub struct Renderer<'a> {
    sources: &'a SourceMap,
    style: Style,
}

impl<'a> Renderer<'a> {
    pub fn new(sources: &'a SourceMap, style: Style) -> Self {
        Self { sources, style }
    }

    /// Print the rendered diagnostic to stderr.
    pub fn emit(&self, diagnostic: &Diagnostic) {
        eprint!("{}", self.render(diagnostic));
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let Some(file) = self.sources.try_get(diagnostic.span.source) else {
            return format!(
                "{} {}\n",
                self.style.error("error:"),
                diagnostic.message
            );
        };

        let bytes = file.bytes();
        let start = diagnostic.span.offset.min(bytes.len());
        let end = diagnostic.span.end().clamp(start, bytes.len());
        let (line, column) = line_col(bytes, start);

        let location = format!("{}:{}:{}:", file.name(), line, column);
        let mut out = format!(
            "{} {} {}\n",
            self.style.location(&location),
            self.style.error("error:"),
            diagnostic.message
        );

        // Lines touched by the span, as (start, end) byte ranges without
        // their newline
        let last = if end > start { end - 1 } else { start };
        let block_end = line_end(bytes, last);
        let mut lines = Vec::new();
        let mut pos = line_start(bytes, start);
        loop {
            let eol = line_end(bytes, pos);
            lines.push((pos, eol));
            if eol >= block_end {
                break;
            }
            pos = eol + 1;
        }

        let indent = lines
            .iter()
            .map(|&(from, to)| &bytes[from..to])
            .filter(|text| text.iter().any(|b| !b.is_ascii_whitespace()))
            .map(|text| {
                text.iter().take_while(|&&b| b == b' ' || b == b'\t').count()
            })
            .min()
            .unwrap_or(0);
        let gutter = (line + lines.len() - 1).to_string().len();

        for (index, &(from, to)) in lines.iter().enumerate() {
            let text_start = (from + indent).min(to);
            let seg_start = start.max(from).clamp(text_start, to);
            let seg_end = end.min(to).max(seg_start);

            let before = excerpt(&bytes[text_start..seg_start]);
            let marked = excerpt(&bytes[seg_start..seg_end]);
            let after = excerpt(&bytes[seg_end..to]);
            let after = after.trim_end_matches('\r');

            out.push_str(&format!(
                "{:>gutter$} | {}{}{}\n",
                line + index,
                before,
                self.style.highlight(&marked),
                after
            ));

            let width = marked.chars().count();
            let underline = if index == 0 {
                format!("^{}", "~".repeat(width.saturating_sub(1)))
            } else if width > 0 {
                "~".repeat(width)
            } else {
                continue;
            };
            out.push_str(&format!(
                "{:gutter$} | {}{}\n",
                "",
                " ".repeat(before.chars().count()),
                self.style.highlight(&underline)
            ));
        }

        out
    }
}

/// 1-based line and byte column of `offset`.
pub fn line_col(bytes: &[u8], offset: usize) -> (usize, usize) {
    let offset = offset.min(bytes.len());
    let line = bytes[..offset].iter().filter(|&&b| b == b'\n').count() + 1;
    (line, offset - line_start(bytes, offset) + 1)
}

fn line_start(bytes: &[u8], offset: usize) -> usize {
    bytes[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |newline| newline + 1)
}

fn line_end(bytes: &[u8], offset: usize) -> usize {
    bytes[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |newline| offset + newline)
}

fn excerpt(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\t', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str, offset: usize, len: usize, message: &str) -> String {
        let mut sources = SourceMap::new();
        let id = sources.add("t.h", text);
        let renderer = Renderer::new(&sources, Style::PLAIN);
        renderer.render(&Diagnostic::new(Span::new(id, offset, len), message))
    }

    #[test]
    fn test_render_strips_indent() {
        let text = "struct s {\n    int x DEFAULT(300);\n};\n";
        let offset = text.find("300").unwrap();
        let out = render(text, offset, 3, "Value out of range");
        let expected = format!(
            "t.h:2:19: error: Value out of range\n\
             2 | int x DEFAULT(300);\n  | {}^~~\n",
            " ".repeat(14)
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_render_multi_line_span() {
        let out = render("  abc\n  defg\n", 3, 7, "msg");
        assert_eq!(out, "t.h:1:4: error: msg\n1 | abc\n  |  ^~\n2 | defg\n  | ~~\n");
    }

    #[test]
    fn test_render_empty_span_at_end() {
        let out = render("struct s {", 10, 0, "Expected closing '}'");
        let expected = format!(
            "t.h:1:11: error: Expected closing '}}'\n1 | struct s {{\n  | {}^\n",
            " ".repeat(10)
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_render_without_source() {
        let sources = SourceMap::new();
        let renderer = Renderer::new(&sources, Style::PLAIN);
        let out = renderer.render(&Diagnostic::new(Span::empty(), "oops"));
        assert_eq!(out, "error: oops\n");
    }

    #[test]
    fn test_line_col() {
        let text = b"ab\ncd\n";
        assert_eq!(line_col(text, 0), (1, 1));
        assert_eq!(line_col(text, 4), (2, 2));
        assert_eq!(line_col(text, 6), (3, 1));
    }
}
