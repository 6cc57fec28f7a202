//! Values of one section instance
//!
//! A [`Record`] is the Rust counterpart of one `struct T` driven through the
//! generated functions. Every assignment is read and checked in full before
//! the stored value changes, so a failed parse leaves the field as it was.

use super::reader::{parse_all, IniReader};
use super::IniError;
use crate::parser::lexer::{Token, TokenKind};
use crate::schema::{value, Key, Range, Section, SemanticType, Value};
use crate::source::{SourceMap, Span};
use log::debug;
use rustc_hash::FxHashMap;
use std::fmt;
use std::io;

/// Current value of one key.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    /// Fixed lists always hold their full slot count, unused slots empty
    StrList(Vec<String>),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::StrList(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

pub struct Record<'s> {
    section: &'s Section,
    sources: &'s SourceMap,
    index: FxHashMap<&'s str, usize>,
    values: Vec<FieldValue>,
}

impl<'s> Record<'s> {
    /// A record holding every key's default.
    pub fn init(section: &'s Section, sources: &'s SourceMap) -> Self {
        let index = section
            .keys
            .iter()
            .enumerate()
            .map(|(slot, key)| (sources.text(key.name), slot))
            .collect();
        let values = section
            .keys
            .iter()
            .map(|key| default_value(key, sources))
            .collect();
        Self {
            section,
            sources,
            index,
            values,
        }
    }

    /// `[name]` of the section
    pub fn name(&self) -> &'s str {
        self.sources.text(self.section.name)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.index.get(key).map(|&slot| &self.values[slot])
    }

    /// Keys and values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&'s str, &FieldValue)> + '_ {
        self.section
            .keys
            .iter()
            .map(|key| self.sources.text(key.name))
            .zip(&self.values)
    }

    /// Read `key = value` lines until a token that doesn't start one, and
    /// return that token.
    pub fn parse_section(
        &mut self,
        reader: &mut IniReader<'_>,
    ) -> Result<Token, IniError> {
        loop {
            let token = reader.next_token()?;
            if token.kind != TokenKind::Ident {
                return Ok(token);
            }
            let name = reader.text(token.span);
            let Some(&slot) = self.index.get(name) else {
                return Err(reader.error(
                    format!("Unknown key \"{}\" in section \"{}\"", name, self.name()),
                    token.span,
                ));
            };

            let equals = reader.next_token()?;
            if equals.kind != TokenKind::Equals {
                return Err(reader.error("Expected \"=\" after key", equals.span));
            }

            let key = &self.section.keys[slot];
            let value = read_value(reader, key, name)?;
            debug!("[{}] {} = {:?}", self.name(), name, value);
            self.values[slot] = value;
        }
    }

    /// Parse the first `[name]` section of the buffer, ignoring later ones.
    pub fn parse(&mut self, reader: &mut IniReader<'_>) -> Result<(), IniError> {
        let name = self.name();
        parse_all(reader, name, |reader| {
            let token = self.parse_section(reader)?;
            Ok(Token {
                kind: TokenKind::End,
                span: token.span,
            })
        })
    }

    /// Write the section the way `T_fwrite` does.
    pub fn write<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self)
    }
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.name())?;
        for (name, value) in self.values() {
            write!(f, "{} = ", name)?;
            match value {
                FieldValue::Str(text) => write_string(f, text)?,
                FieldValue::StrList(items) => {
                    let used = items
                        .iter()
                        .rposition(|item| !item.is_empty())
                        .map_or(0, |last| last + 1);
                    for (i, item) in items[..used].iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write_string(f, item)?;
                    }
                }
                FieldValue::Bool(b) => write!(f, "{}", b)?,
                FieldValue::Int(n) => write!(f, "{}", n)?,
                FieldValue::Float(n) => write!(f, "{:?}", n)?,
            }
            writeln!(f)?;
        }
        writeln!(f)
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "\"{}\"", value::escape(text))
}

fn default_value(key: &Key, sources: &SourceMap) -> FieldValue {
    let default = &key.attributes.default;
    let text = |span: Span| value::unescape(sources.text(span));
    match key.ty {
        SemanticType::FixedStr { .. }
        | SemanticType::DynStr
        | SemanticType::CustomStr(_) => {
            FieldValue::Str(default.as_str().map(text).unwrap_or_default())
        }
        SemanticType::FixedStrList { count, .. } => {
            let items = default.as_str_list().unwrap_or_default();
            let mut list: Vec<String> = items.iter().map(|&span| text(span)).collect();
            list.resize(count as usize, String::new());
            FieldValue::StrList(list)
        }
        SemanticType::DynStrList | SemanticType::CustomStrList(_) => {
            let items = default.as_str_list().unwrap_or_default();
            FieldValue::StrList(items.iter().map(|&span| text(span)).collect())
        }
        SemanticType::Bool => FieldValue::Bool(default.as_int().unwrap_or(0) != 0),
        SemanticType::Int(_) => FieldValue::Int(default.as_int().unwrap_or(0)),
        SemanticType::Float => FieldValue::Float(default.as_float().unwrap_or(0.0)),
    }
}

/// Read the value after `key =` without touching the record.
fn read_value(
    reader: &mut IniReader<'_>,
    key: &Key,
    name: &str,
) -> Result<FieldValue, IniError> {
    match key.ty {
        SemanticType::FixedStr { len } => {
            let (text, span) = read_string(reader, name)?;
            let max = len.saturating_sub(1) as usize;
            if text.len() > max {
                return Err(reader.error(
                    format!("\"{}\" can't be longer than {} characters", name, max),
                    span,
                ));
            }
            Ok(FieldValue::Str(text))
        }
        SemanticType::DynStr | SemanticType::CustomStr(_) => {
            Ok(FieldValue::Str(read_string(reader, name)?.0))
        }
        SemanticType::FixedStrList { count, len } => {
            let max = len.saturating_sub(1) as usize;
            let (mut items, span) = read_list(reader, Some(max))?;
            if items.len() > count as usize {
                return Err(reader.error(
                    format!("\"{}\" holds at most {} strings", name, count),
                    span,
                ));
            }
            items.resize(count as usize, String::new());
            Ok(FieldValue::StrList(items))
        }
        SemanticType::DynStrList | SemanticType::CustomStrList(_) => {
            Ok(FieldValue::StrList(read_list(reader, None)?.0))
        }
        SemanticType::Bool => {
            let token = reader.next_token()?;
            let value = match token.kind {
                TokenKind::Ident => match reader.text(token.span) {
                    "true" => Some(true),
                    "false" => Some(false),
                    _ => None,
                },
                TokenKind::Int(0) => Some(false),
                TokenKind::Int(1) => Some(true),
                _ => None,
            };
            value.map(FieldValue::Bool).ok_or_else(|| {
                reader.error(
                    format!("Expected true or false for \"{}\"", name),
                    token.span,
                )
            })
        }
        SemanticType::Int(int) => {
            let token = reader.next_token()?;
            let TokenKind::Int(n) = token.kind else {
                return Err(reader.error(
                    format!("Expected an integer literal for \"{}\"", name),
                    token.span,
                ));
            };
            let (min, max) = int.range();
            let range = key.attributes.range.unwrap_or(Range::Int { min, max });
            check_range(reader, range, &Value::Int(n), name, token.span)?;
            Ok(FieldValue::Int(n))
        }
        SemanticType::Float => {
            let token = reader.next_token()?;
            let n = match token.kind {
                TokenKind::Float(n) => n,
                TokenKind::Int(n) => n as f64,
                _ => {
                    return Err(reader.error(
                        format!("Expected a floating point literal for \"{}\"", name),
                        token.span,
                    ))
                }
            };
            let range = key.attributes.range.unwrap_or(Range::Float {
                min: -f64::MAX,
                max: f64::MAX,
            });
            check_range(reader, range, &Value::Float(n), name, token.span)?;
            Ok(FieldValue::Float(n))
        }
    }
}

fn check_range(
    reader: &IniReader<'_>,
    range: Range,
    value: &Value,
    name: &str,
    span: Span,
) -> Result<(), IniError> {
    if range.contains(value) {
        Ok(())
    } else {
        Err(reader.error(
            format!("\"{}\" must be in range {}", name, range),
            span,
        ))
    }
}

fn read_string(
    reader: &mut IniReader<'_>,
    name: &str,
) -> Result<(String, Span), IniError> {
    let token = reader.next_token()?;
    if token.kind != TokenKind::Str {
        return Err(reader.error(
            format!("Expected a string literal for \"{}\"", name),
            token.span,
        ));
    }
    let contents = token.string_contents();
    Ok((value::unescape(reader.text(contents)), token.span))
}

/// `"a", "b", ...`, possibly empty. Returns the items and the span of the
/// whole list.
fn read_list(
    reader: &mut IniReader<'_>,
    max_len: Option<usize>,
) -> Result<(Vec<String>, Span), IniError> {
    let mut items = Vec::new();
    let first = reader.peek_token()?;
    if first.kind != TokenKind::Str {
        return Ok((items, first.span));
    }

    let mut span = first.span;
    loop {
        let token = reader.next_token()?;
        if token.kind != TokenKind::Str {
            return Err(reader.error("Expected a string literal after \",\"", token.span));
        }
        let text = value::unescape(reader.text(token.string_contents()));
        if let Some(max) = max_len.filter(|&max| text.len() > max) {
            return Err(reader.error(
                format!("String can't be longer than {} characters", max),
                token.span,
            ));
        }
        items.push(text);
        span = span.to(token.span);

        if reader.peek_token()?.kind != TokenKind::Comma {
            return Ok((items, span));
        }
        reader.next_token()?;
    }
}
