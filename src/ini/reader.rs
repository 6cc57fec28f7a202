//! Token reader over one INI buffer
//!
//! Wraps the shared [`Lexer`] in INI mode (`#` and `;` comments) and adds the
//! section scan every generated `T_parse_all` performs.

use super::IniError;
use crate::parser::lexer::{Lexer, Syntax, Token, TokenKind};
use crate::source::{SourceId, SourceMap, Span};
use log::debug;

pub struct IniReader<'a> {
    sources: &'a SourceMap,
    lexer: Lexer<'a>,
}

impl<'a> IniReader<'a> {
    pub fn new(sources: &'a SourceMap, id: SourceId) -> Self {
        Self {
            sources,
            lexer: Lexer::new(id, sources.get(id).text(), Syntax::Ini),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, IniError> {
        Ok(self.lexer.next_token()?)
    }

    pub fn peek_token(&mut self) -> Result<Token, IniError> {
        Ok(self.lexer.peek_token()?)
    }

    pub fn text(&self, span: Span) -> &'a str {
        self.sources.text(span)
    }

    pub(crate) fn error(&self, message: impl Into<String>, span: Span) -> IniError {
        IniError::new(message, span)
    }
}

/// Find every `[name]` header and hand the reader to `on_section` right
/// after it. The callback returns the token that ended its section, and
/// scanning resumes from that token; returning [`TokenKind::End`] stops
/// the scan early. Headers of other sections are skipped.
pub fn parse_all<'a, F>(
    reader: &mut IniReader<'a>,
    name: &str,
    mut on_section: F,
) -> Result<(), IniError>
where
    F: FnMut(&mut IniReader<'a>) -> Result<Token, IniError>,
{
    let mut token = reader.next_token()?;
    loop {
        match token.kind {
            TokenKind::End => return Ok(()),
            TokenKind::LBracket => {}
            _ => {
                token = reader.next_token()?;
                continue;
            }
        }

        let header = reader.next_token()?;
        if header.kind != TokenKind::Ident {
            return Err(reader.error(
                "Expected a section name within the brackets. Example: [mysection]",
                header.span,
            ));
        }
        if reader.text(header.span) != name {
            token = reader.next_token()?;
            continue;
        }

        let close = reader.next_token()?;
        if close.kind != TokenKind::RBracket {
            return Err(reader.error("Missing closing bracket \"]\"", close.span));
        }
        debug!("entering [{}] at offset {}", name, header.span.offset);
        token = on_section(reader)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_for(text: &str) -> (SourceMap, SourceId) {
        let mut sources = SourceMap::new();
        let id = sources.add("test.ini", text);
        (sources, id)
    }

    /// Skip a section body: everything up to the next `[`.
    fn skip_body(reader: &mut IniReader) -> Result<Token, IniError> {
        loop {
            let token = reader.next_token()?;
            if matches!(token.kind, TokenKind::LBracket | TokenKind::End) {
                return Ok(token);
            }
        }
    }

    #[test]
    fn test_callback_per_occurrence() {
        let (sources, id) =
            reader_for("[sprite]\nx = 1\n[other]\ny = 2\n[sprite]\nx = 3\n");
        let mut reader = IniReader::new(&sources, id);
        let mut offsets = Vec::new();
        parse_all(&mut reader, "sprite", |reader| {
            offsets.push(reader.lexer.position());
            skip_body(reader)
        })
        .unwrap();
        assert_eq!(offsets, vec![8, 37]);
    }

    #[test]
    fn test_end_token_stops_scan() {
        let (sources, id) = reader_for("[a]\n[a]\n");
        let mut reader = IniReader::new(&sources, id);
        let mut calls = 0;
        parse_all(&mut reader, "a", |reader| {
            calls += 1;
            let token = reader.next_token()?;
            Ok(Token {
                kind: TokenKind::End,
                span: token.span,
            })
        })
        .unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_header_errors() {
        let (sources, id) = reader_for("[1]");
        let err = parse_all(&mut IniReader::new(&sources, id), "a", skip_body)
            .unwrap_err();
        assert_eq!(
            err.message,
            "Expected a section name within the brackets. Example: [mysection]"
        );

        let (sources, id) = reader_for("[a\nkey = 1");
        let err = parse_all(&mut IniReader::new(&sources, id), "a", skip_body)
            .unwrap_err();
        assert_eq!(err.message, "Missing closing bracket \"]\"");
        assert_eq!(sources.text(err.span), "key");
    }

    #[test]
    fn test_lex_error_surfaces() {
        let (sources, id) = reader_for("# comment\nname = \"open");
        let err = parse_all(&mut IniReader::new(&sources, id), "a", skip_body)
            .unwrap_err();
        assert_eq!(err.message, "Missing closing quote on string literal");
    }
}
