//! Byte-level scanner shared by the schema parser and the INI reader
//!
//! The same scanner runs in two modes:
//! - [`Syntax::C`]: `/* */` and `//` comments, `;` is punctuation.
//! - [`Syntax::Ini`]: `#` and `;` start a line comment.
//!
//! Tokens carry a [`Span`] instead of owned text. Bytes that cannot start a
//! token are skipped, so the scanner can walk over arbitrary C code between
//! `SECTION` declarations.

use crate::source::{SourceId, Span};
use std::fmt;
use thiserror::Error;

/// Comment syntax the lexer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    C,
    Ini,
}

/// Token variants produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    LParen,    // (
    RParen,    // )
    Equals,    // =
    Comma,     // ,
    Colon,     // :
    Star,      // *
    Semicolon, // ;

    Ident,
    /// The span of a string token includes both quotes
    Str,
    Int(i64),
    Float(f64),

    End,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Equals => write!(f, "'='"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Ident => write!(f, "identifier"),
            TokenKind::Str => write!(f, "string literal"),
            TokenKind::Int(n) => write!(f, "integer literal {}", n),
            TokenKind::Float(n) => write!(f, "float literal {}", n),
            TokenKind::End => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Contents of a string literal without the surrounding quotes.
    /// Escapes are left as written.
    pub fn string_contents(&self) -> Span {
        debug_assert_eq!(self.kind, TokenKind::Str);
        Span::new(self.span.source, self.span.offset + 1, self.span.len - 2)
    }
}

/// Unterminated comment or string, or an integer that doesn't fit 64 bits.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

pub struct Lexer<'a> {
    source: SourceId,
    input: &'a [u8],
    position: usize,
    syntax: Syntax,
}

impl<'a> Lexer<'a> {
    pub fn new(source: SourceId, input: &'a str, syntax: Syntax) -> Self {
        Self {
            source,
            input: input.as_bytes(),
            position: 0,
            syntax,
        }
    }

    /// Byte offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Tokenize the remaining input, including the final `End`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            tokens.push(token);
            if token.kind == TokenKind::End {
                return Ok(tokens);
            }
        }
    }

    /// Look at the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<Token, LexError> {
        let saved = self.position;
        let token = self.next_token();
        self.position = saved;
        token
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.skip_whitespace_and_comments()?;

            let start = self.position;
            let Some(byte) = self.peek() else {
                return Ok(self.token(TokenKind::End, start));
            };

            let kind = match byte {
                b'{' => TokenKind::LBrace,
                b'}' => TokenKind::RBrace,
                b'[' => TokenKind::LBracket,
                b']' => TokenKind::RBracket,
                b'(' => TokenKind::LParen,
                b')' => TokenKind::RParen,
                b'=' => TokenKind::Equals,
                b',' => TokenKind::Comma,
                b':' => TokenKind::Colon,
                b'*' => TokenKind::Star,
                b';' => TokenKind::Semicolon,
                b'"' => return self.string_literal(start),
                b'0'..=b'9' => return self.number_literal(start),
                b'-' if self.peek_ahead(1).is_some_and(|b| b.is_ascii_digit()) => {
                    return self.number_literal(start)
                }
                b if is_ident_start(b) => {
                    self.position += 1;
                    while self.peek().is_some_and(is_ident_continue) {
                        self.position += 1;
                    }
                    return Ok(self.token(TokenKind::Ident, start));
                }
                _ => {
                    self.position += 1;
                    continue;
                }
            };

            self.position += 1;
            return Ok(self.token(kind, start));
        }
    }

    /// Skip ahead to the next occurrence of the identifier `word`.
    ///
    /// Runs over arbitrary C text, so only comments, string and character
    /// literals are recognized on the way. Returns `None` at end of input.
    pub fn scan_until(&mut self, word: &str) -> Result<Option<Token>, LexError> {
        while let Some(byte) = self.peek() {
            let start = self.position;
            match byte {
                b'/' if matches!(self.peek_ahead(1), Some(b'/' | b'*')) => {
                    self.skip_whitespace_and_comments()?;
                }
                b'"' | b'\'' => self.skip_quoted(byte),
                b if b.is_ascii_alphanumeric() || b == b'_' => {
                    while self
                        .peek()
                        .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
                    {
                        self.position += 1;
                    }
                    if &self.input[start..self.position] == word.as_bytes() {
                        return Ok(Some(self.token(TokenKind::Ident, start)));
                    }
                }
                _ => self.position += 1,
            }
        }
        Ok(None)
    }

    /// String literal. A `"` directly after a backslash does not terminate.
    fn string_literal(&mut self, start: usize) -> Result<Token, LexError> {
        self.position += 1; // opening quote
        while let Some(byte) = self.peek() {
            self.position += 1;
            if byte == b'"' && self.input[self.position - 2] != b'\\' {
                return Ok(self.token(TokenKind::Str, start));
            }
        }
        Err(self.error("Missing closing quote on string literal", start))
    }

    /// Integer (decimal or `0x` hex, optional leading `-`) or float (decimal
    /// with a fraction, optional trailing `f`).
    fn number_literal(&mut self, start: usize) -> Result<Token, LexError> {
        let negative = self.peek() == Some(b'-');
        if negative {
            self.position += 1;
        }

        if self.peek() == Some(b'0')
            && matches!(self.peek_ahead(1), Some(b'x' | b'X'))
        {
            self.position += 2;
            let digits_start = self.position;
            while self.peek().is_some_and(|b| b.is_ascii_hexdigit()) {
                self.position += 1;
            }
            let digits = self.text(digits_start, self.position);
            if digits.is_empty() {
                return Err(self.error("Expected hex digits after '0x'", start));
            }
            let magnitude = u64::from_str_radix(digits, 16)
                .map_err(|_| self.error("Integer literal is too large", start))?;
            let value = if negative {
                0i64.checked_sub_unsigned(magnitude)
            } else {
                i64::try_from(magnitude).ok()
            }
            .ok_or_else(|| self.error("Integer literal is too large", start))?;
            return Ok(self.token(TokenKind::Int(value), start));
        }

        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.position += 1;
        }

        let mut is_float = false;
        if self.peek() == Some(b'.')
            && self.peek_ahead(1).is_some_and(|b| b.is_ascii_digit())
        {
            is_float = true;
            self.position += 1;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.position += 1;
            }
        }
        if let Some(len) = self.exponent_len() {
            is_float = true;
            self.position += len;
        }

        if is_float {
            let value = self
                .text(start, self.position)
                .parse::<f64>()
                .map_err(|_| self.error("Invalid float literal", start))?;
            if self.peek() == Some(b'f') {
                self.position += 1;
            }
            return Ok(self.token(TokenKind::Float(value), start));
        }

        let value = self
            .text(start, self.position)
            .parse::<i64>()
            .map_err(|_| self.error("Integer literal is too large", start))?;
        Ok(self.token(TokenKind::Int(value), start))
    }

    /// Length of an `e[+-]digits` exponent at the scan position, if any.
    fn exponent_len(&self) -> Option<usize> {
        if !matches!(self.peek(), Some(b'e' | b'E')) {
            return None;
        }
        let sign = usize::from(matches!(self.peek_ahead(1), Some(b'+' | b'-')));
        let digits = self.input[self.position + 1 + sign..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        (digits > 0).then_some(1 + sign + digits)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match (self.syntax, self.peek()) {
                (_, Some(b)) if b.is_ascii_whitespace() => self.position += 1,
                (Syntax::C, Some(b'/')) if self.peek_ahead(1) == Some(b'/') => {
                    self.skip_line();
                }
                (Syntax::C, Some(b'/')) if self.peek_ahead(1) == Some(b'*') => {
                    self.skip_block_comment()?;
                }
                (Syntax::Ini, Some(b'#' | b';')) => self.skip_line(),
                _ => return Ok(()),
            }
        }
    }

    /// Skip to the end of the line. The newline itself is left for the
    /// whitespace loop.
    fn skip_line(&mut self) {
        while self.peek().is_some_and(|b| b != b'\n') {
            self.position += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.position;
        self.position += 2;
        while self.position < self.input.len() {
            if self.peek() == Some(b'*') && self.peek_ahead(1) == Some(b'/') {
                self.position += 2;
                return Ok(());
            }
            self.position += 1;
        }
        Err(self.error("Missing closing comment", start))
    }

    /// Skip a quoted run in free C text, stopping at the closing quote or
    /// the end of the line.
    fn skip_quoted(&mut self, quote: u8) {
        self.position += 1;
        while let Some(byte) = self.peek() {
            self.position += 1;
            match byte {
                b'\\' => {
                    if self.peek().is_some_and(|b| b != b'\n') {
                        self.position += 1;
                    }
                }
                b'\n' => return,
                b if b == quote => return,
                _ => {}
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<u8> {
        self.input.get(self.position + n).copied()
    }

    fn text(&self, start: usize, end: usize) -> &'a str {
        // Callers only slice ASCII runs
        std::str::from_utf8(&self.input[start..end]).unwrap_or_default()
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            span: Span::new(self.source, start, self.position - start),
        }
    }

    fn error(&self, message: &str, start: usize) -> LexError {
        LexError {
            message: message.to_string(),
            span: Span::new(self.source, start, self.position - start),
        }
    }
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'-'
}

fn is_ident_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}
