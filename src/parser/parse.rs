//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct, its error type, the token
//! helpers shared by every grammar rule and the top-level `SECTION` rule.
//!
//! # Parser Architecture
//!
//! The Parser is recursive descent, split across files with `impl Parser`
//! blocks:
//! - This module: Parser struct, helpers, and the top-level grammar
//! - `declarations`: struct bodies, field types and declarators, and the
//!   unknown-type recovery path
//! - `attributes`: `DEFAULT`, `CONSTRAIN`, `IGNORE`, `STRING`, `STRINGLIST`
//!
//! # Top-Level Grammar
//!
//! ```text
//! section := "SECTION" "(" string ")" "struct" ident "{" field* "}"
//! ```
//!
//! Everything between sections is skipped without being tokenized, so the
//! declarations can live in ordinary C headers and sources.

use crate::diagnostics::Diagnostic;
use crate::parser::lexer::{LexError, Lexer, Syntax, Token, TokenKind};
use crate::schema::{Schema, Section, TypeError};
use crate::source::{FileKind, SourceFile, SourceId, SourceMap, Span};
use log::debug;
use std::fmt;
use thiserror::Error;

/// Which stage of the taxonomy an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unterminated comment or string, oversized integer
    Lexical,
    /// Missing punctuation or keyword
    Syntax,
    /// Literal or modifier that doesn't fit the declared type
    Type,
    /// Field type that can't be classified and has no escape attribute
    Unsupported,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "lexical error"),
            ErrorKind::Syntax => write!(f, "syntax error"),
            ErrorKind::Type => write!(f, "type error"),
            ErrorKind::Unsupported => write!(f, "unsupported construct"),
        }
    }
}

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.span, self.message.clone())
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            kind: ErrorKind::Lexical,
            message: err.message,
            span: err.span,
        }
    }
}

/// Recursive descent parser over one input buffer
pub struct Parser<'a> {
    pub(crate) sources: &'a SourceMap,
    pub(crate) file: &'a SourceFile,
    pub(crate) lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(sources: &'a SourceMap, id: SourceId) -> Self {
        let file = sources.get(id);
        Self {
            sources,
            file,
            lexer: Lexer::new(id, file.text(), Syntax::C),
        }
    }

    /// Parse every `SECTION` in the buffer, appending to `schema`.
    pub fn parse_into(&mut self, schema: &mut Schema) -> Result<(), ParseError> {
        while let Some(keyword) = self.lexer.scan_until("SECTION")? {
            let section = self.parse_section(keyword)?;
            debug!(
                "{}: section [{}] with {} keys",
                self.file.name(),
                self.text(section.name),
                section.keys.len()
            );
            schema.sections.push(section);
        }
        Ok(())
    }

    fn parse_section(&mut self, keyword: Token) -> Result<Section, ParseError> {
        self.expect_next(TokenKind::LParen, "Expected '(' after SECTION")?;
        let name = self.expect_next(
            TokenKind::Str,
            "Expected section name. Example: SECTION(\"name\")",
        )?;
        let name = name.string_contents();
        if name.is_empty() {
            return Err(self.syntax_error(
                "Section name can't be empty",
                keyword.span.to(name),
            ));
        }
        if !is_section_name(self.text(name)) {
            return Err(self.syntax_error(
                "Section name may only contain letters, digits, '_' and '-', \
                 and must not start with a digit",
                name,
            ));
        }
        self.expect_next(TokenKind::RParen, "Missing closing ')'")?;

        let struct_keyword = self.advance()?;
        if !self.is_word(struct_keyword, "struct") {
            return Err(self.syntax_error(
                "Expected 'struct' after SECTION name",
                struct_keyword.span,
            ));
        }
        let struct_name = self.expect_next(TokenKind::Ident, "Missing struct name")?;
        self.expect_next(TokenKind::LBrace, "Expected '{' after struct name")?;

        let mut section = Section::new(name, struct_name.span);
        let close = self.parse_struct_body(&mut section)?;
        if close.kind != TokenKind::RBrace {
            return Err(self.syntax_error("Expected closing '}'", close.span));
        }

        if self.file.kind() == FileKind::Source {
            section.struct_def = Some(struct_keyword.span.to(close.span));
        }

        Ok(section)
    }

    // ===== Helper methods =====

    pub(crate) fn advance(&mut self) -> Result<Token, ParseError> {
        Ok(self.lexer.next_token()?)
    }

    /// Scan the next token and require it to be of `kind`.
    pub(crate) fn expect_next(
        &mut self,
        kind: TokenKind,
        message: &str,
    ) -> Result<Token, ParseError> {
        let token = self.advance()?;
        if same_kind(token.kind, kind) {
            Ok(token)
        } else {
            Err(self.syntax_error(message, token.span))
        }
    }

    /// Scan the next token and require an integer literal.
    pub(crate) fn expect_int(
        &mut self,
        message: &str,
    ) -> Result<(i64, Token), ParseError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Int(n) => Ok((n, token)),
            _ => Err(self.syntax_error(message, token.span)),
        }
    }

    pub(crate) fn text(&self, span: Span) -> &'a str {
        self.sources.text(span)
    }

    /// True if `token` is the identifier `word`
    pub(crate) fn is_word(&self, token: Token, word: &str) -> bool {
        token.kind == TokenKind::Ident && self.text(token.span) == word
    }

    pub(crate) fn syntax_error(&self, message: &str, span: Span) -> ParseError {
        ParseError::new(ErrorKind::Syntax, message, span)
    }

    pub(crate) fn type_error(
        &self,
        message: impl Into<String>,
        span: Span,
    ) -> ParseError {
        ParseError::new(ErrorKind::Type, message, span)
    }

    pub(crate) fn resolve_error(&self, err: TypeError, span: Span) -> ParseError {
        ParseError::new(ErrorKind::Type, err.to_string(), span)
    }
}

/// Token kinds compared without their payload
fn same_kind(a: TokenKind, b: TokenKind) -> bool {
    std::mem::discriminant(&a) == std::mem::discriminant(&b)
}

/// A section name must scan as a single INI key, `[mysection]`.
fn is_section_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let Some(&first) = bytes.first() else {
        return false;
    };
    let starts_number =
        first == b'-' && bytes.get(1).is_some_and(|b| b.is_ascii_digit());
    (first.is_ascii_alphabetic() || first == b'_' || first == b'-')
        && !starts_number
        && bytes[1..]
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str, text: &str) -> (SourceMap, Result<Schema, ParseError>) {
        let mut sources = SourceMap::new();
        let id = sources.add(name, text);
        let mut schema = Schema::new();
        let result = Parser::new(&sources, id)
            .parse_into(&mut schema)
            .map(|_| schema);
        (sources, result)
    }

    #[test]
    fn test_parse_sections() {
        let text = "#include <stdint.h>\n\
                    SECTION(\"video\") struct video { int width; };\n\
                    int unrelated(void);\n\
                    SECTION(\"audio\") struct audio { bool mute; };\n";
        let (sources, result) = parse("config.h", text);
        let schema = result.unwrap();

        assert_eq!(schema.sections.len(), 2);
        assert_eq!(sources.text(schema.sections[0].name), "video");
        assert_eq!(sources.text(schema.sections[0].struct_name), "video");
        assert_eq!(sources.text(schema.sections[1].name), "audio");
        assert_eq!(schema.sections[0].struct_def, None);
    }

    #[test]
    fn test_struct_def_captured_for_sources() {
        let text = "SECTION(\"s\") struct cfg { int a; };";
        let (sources, result) = parse("main.c", text);
        let schema = result.unwrap();
        let def = schema.sections[0].struct_def.unwrap();
        assert_eq!(sources.text(def), "struct cfg { int a; }");
    }

    #[test]
    fn test_section_syntax_errors() {
        let cases = [
            ("SECTION \"s\"", "Expected '(' after SECTION"),
            ("SECTION(s)", "Expected section name. Example: SECTION(\"name\")"),
            ("SECTION(\"s\" struct", "Missing closing ')'"),
            ("SECTION(\"s\") union u {", "Expected 'struct' after SECTION name"),
            ("SECTION(\"s\") struct {", "Missing struct name"),
            ("SECTION(\"s\") struct s;", "Expected '{' after struct name"),
            ("SECTION(\"s\") struct s { int a;", "Expected closing '}'"),
            ("SECTION(\"\") struct s {};", "Section name can't be empty"),
        ];
        for (text, message) in cases {
            let (_, result) = parse("t.h", text);
            let err = result.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Syntax, "{}", text);
            assert_eq!(err.message, message);
        }
    }

    #[test]
    fn test_section_name_must_be_a_key() {
        assert!(is_section_name("video"));
        assert!(is_section_name("key-bindings_2"));
        assert!(!is_section_name("2d"));
        assert!(!is_section_name("-1"));
        assert!(!is_section_name("my section"));

        let (_, result) = parse("t.h", "SECTION(\"a b\") struct s {};");
        assert_eq!(result.unwrap_err().kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_lex_error_converts() {
        let (_, result) = parse("t.h", "SECTION(\"s) struct s {};");
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert_eq!(err.span.offset, 8);
    }
}
