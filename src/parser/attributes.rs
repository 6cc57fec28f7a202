//! Attribute calls
//!
//! ```text
//! attribute ::= "DEFAULT" "(" literal ")"
//!             | "CONSTRAIN" "(" number "," number ")"
//!             | "IGNORE" "(" ")"
//!             | "STRING" "(" ident "," ident "," ident "," ident "," ident ")"
//!             | "STRINGLIST" "(" ident ")"
//! ```
//!
//! Attributes run against a key whose defaults are already seeded from its
//! type. Every DEFAULT() literal is checked against the representable range
//! of the type, and once all calls are read the final default must also lie
//! inside the CONSTRAIN() range.

use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::{ParseError, Parser};
use crate::schema::resolve::representable_range;
use crate::schema::value::unescape;
use crate::schema::{Key, Name, Range, SemanticType, StrApi, Value};
use crate::source::Span;

impl<'a> Parser<'a> {
    /// Parse attribute calls starting at `token`. Returns the first token
    /// that isn't an attribute and whether `IGNORE()` was seen.
    pub(crate) fn parse_attributes(
        &mut self,
        key: &mut Key,
        mut token: Token,
    ) -> Result<(Token, bool), ParseError> {
        let mut ignored = false;
        let mut default_span = None;
        let mut constrain_span = None;

        while token.kind == TokenKind::Ident {
            match self.text(token.span) {
                "DEFAULT" => {
                    let literal = self.parse_default(key)?;
                    default_span = Some(literal);
                }
                "CONSTRAIN" => {
                    let end = self.parse_constrain(key, token)?;
                    constrain_span = Some(token.span.to(end));
                }
                "IGNORE" => {
                    self.parse_ignore()?;
                    ignored = true;
                }
                "STRING" => {
                    if !matches!(key.ty, SemanticType::CustomStr(_)) {
                        return Err(self.type_error(
                            "STRING() can only be used on 'struct str*' fields \
                             and unsupported types",
                            token.span,
                        ));
                    }
                    key.ty = SemanticType::CustomStr(self.parse_string_api()?);
                }
                "STRINGLIST" => {
                    return Err(self.type_error(
                        "STRINGLIST() can only be used on unsupported types",
                        token.span,
                    ))
                }
                other => {
                    return Err(self.syntax_error(
                        &format!("Unknown attribute \"{}\"", other),
                        token.span,
                    ))
                }
            }
            token = self.advance()?;
        }

        if let Some(range) = key.attributes.range {
            if !range.contains(&key.attributes.default) {
                let message = match default_span {
                    Some(_) => format!(
                        "Value in DEFAULT() must be in range {} set by CONSTRAIN()",
                        range
                    ),
                    None => format!(
                        "The implicit default of 0 is outside the range set by \
                         CONSTRAIN(). Add a DEFAULT() in range {}, e.g. DEFAULT({})",
                        range,
                        range.nearest_to_zero()
                    ),
                };
                let span = default_span.or(constrain_span).unwrap_or(key.name);
                return Err(self.type_error(message, span));
            }
        }

        Ok((token, ignored))
    }

    /// `DEFAULT(<literal>)`. Returns the span of the literal.
    fn parse_default(&mut self, key: &mut Key) -> Result<Span, ParseError> {
        self.expect_next(TokenKind::LParen, "Expected '(' after 'DEFAULT'")?;
        let literal = self.advance()?;
        let mismatch = |expected: &str| {
            format!(
                "Type in DEFAULT() does not match declared type in struct. \
                 Expected {}.",
                expected
            )
        };

        match key.ty {
            SemanticType::FixedStr { .. }
            | SemanticType::DynStr
            | SemanticType::CustomStr(_) => {
                if literal.kind != TokenKind::Str {
                    return Err(self.type_error(mismatch("a string"), literal.span));
                }
                let contents = literal.string_contents();
                if let SemanticType::FixedStr { len } = key.ty {
                    self.check_fixed_len(key, contents, len, literal.span)?;
                }
                key.attributes.default = Value::Str(contents);
            }
            SemanticType::FixedStrList { .. }
            | SemanticType::DynStrList
            | SemanticType::CustomStrList(_) => {
                if literal.kind != TokenKind::Str {
                    return Err(self.type_error(mismatch("a string"), literal.span));
                }
                let contents = literal.string_contents();
                let held = key
                    .attributes
                    .default
                    .as_str_list()
                    .map_or(0, |items| items.len());
                if let SemanticType::FixedStrList { count, len } = key.ty {
                    if held >= count as usize {
                        return Err(self.type_error(
                            format!(
                                "Too many DEFAULT() values. \"{}\" holds at most \
                                 {} strings",
                                self.text(key.name),
                                count
                            ),
                            literal.span,
                        ));
                    }
                    self.check_fixed_len(key, contents, len, literal.span)?;
                }
                if let Value::StrList(items) = &mut key.attributes.default {
                    items.push(contents);
                } else {
                    key.attributes.default = Value::StrList(vec![contents]);
                }
            }
            SemanticType::Bool => {
                let value = match literal.kind {
                    TokenKind::Int(n @ (0 | 1)) => n,
                    TokenKind::Int(n) => {
                        return Err(self.type_error(
                            format!(
                                "Boolean value in DEFAULT() must be either 0 or \
                                 1, not {}",
                                n
                            ),
                            literal.span,
                        ))
                    }
                    TokenKind::Ident => match self.text(literal.span) {
                        "true" => 1,
                        "false" => 0,
                        other => {
                            return Err(self.type_error(
                                format!(
                                    "Boolean value in DEFAULT() must be either \
                                     'true' or 'false', not \"{}\"",
                                    other
                                ),
                                literal.span,
                            ))
                        }
                    },
                    _ => {
                        return Err(
                            self.type_error(mismatch("a boolean"), literal.span)
                        )
                    }
                };
                key.attributes.default = Value::Int(value);
            }
            SemanticType::Int(_) => {
                let TokenKind::Int(n) = literal.kind else {
                    return Err(self.type_error(mismatch("an integer"), literal.span));
                };
                let value = Value::Int(n);
                self.check_representable(key, &value, "DEFAULT", literal.span)?;
                key.attributes.default = value;
            }
            SemanticType::Float => {
                let value = match literal.kind {
                    TokenKind::Float(n) => Value::Float(n),
                    TokenKind::Int(n) => Value::Float(n as f64),
                    _ => {
                        return Err(self.type_error(mismatch("a float"), literal.span))
                    }
                };
                self.check_representable(key, &value, "DEFAULT", literal.span)?;
                key.attributes.default = value;
            }
        }

        self.expect_next(TokenKind::RParen, "Missing closing ')' after 'DEFAULT'")?;
        Ok(literal.span)
    }

    /// `CONSTRAIN(<min>, <max>)`. Returns the span of the closing `)`.
    fn parse_constrain(
        &mut self,
        key: &mut Key,
        call: Token,
    ) -> Result<Span, ParseError> {
        match key.ty {
            SemanticType::FixedStr { .. }
            | SemanticType::DynStr
            | SemanticType::CustomStr(_)
            | SemanticType::FixedStrList { .. }
            | SemanticType::DynStrList
            | SemanticType::CustomStrList(_) => {
                return Err(self.type_error(
                    "CONSTRAIN() doesn't make sense for string types",
                    call.span,
                ))
            }
            SemanticType::Bool => {
                return Err(self.type_error(
                    "CONSTRAIN() doesn't make sense for boolean types",
                    call.span,
                ))
            }
            SemanticType::Int(_) | SemanticType::Float => {}
        }

        self.expect_next(TokenKind::LParen, "Expected '(' after 'CONSTRAIN'")?;
        let (min, _) = self.parse_bound(key)?;
        self.expect_next(TokenKind::Comma, "Missing ',' after value in CONSTRAIN")?;
        let (max, max_span) = self.parse_bound(key)?;

        let range = match (min, max) {
            (Value::Int(min), Value::Int(max)) if min <= max => Range::Int { min, max },
            (Value::Float(min), Value::Float(max)) if min <= max => {
                Range::Float { min, max }
            }
            _ => {
                return Err(self.type_error(
                    "Maximum value in CONSTRAIN() must be greater than or equal \
                     to minimum value",
                    max_span,
                ))
            }
        };
        key.attributes.range = Some(range);

        let close = self.expect_next(
            TokenKind::RParen,
            "Missing closing ')' after 'CONSTRAIN'",
        )?;
        Ok(close.span)
    }

    /// One CONSTRAIN() bound, typed after the key and within its
    /// representable range.
    fn parse_bound(&mut self, key: &Key) -> Result<(Value, Span), ParseError> {
        let literal = self.advance()?;
        let value = match (key.ty, literal.kind) {
            (SemanticType::Int(_), TokenKind::Int(n)) => Value::Int(n),
            (SemanticType::Float, TokenKind::Int(n)) => Value::Float(n as f64),
            (SemanticType::Float, TokenKind::Float(n)) => Value::Float(n),
            (SemanticType::Float, _) => {
                return Err(self.type_error(
                    "Type in CONSTRAIN() does not match declared type in \
                     struct. Expected a float.",
                    literal.span,
                ))
            }
            _ => {
                return Err(self.type_error(
                    "Type in CONSTRAIN() does not match declared type in \
                     struct. Expected an integer.",
                    literal.span,
                ))
            }
        };
        self.check_representable(key, &value, "CONSTRAIN", literal.span)?;
        Ok((value, literal.span))
    }

    /// `IGNORE()`, with the identifier already consumed
    pub(crate) fn parse_ignore(&mut self) -> Result<(), ParseError> {
        self.expect_next(TokenKind::LParen, "Expected opening '(' after IGNORE")?;
        self.expect_next(
            TokenKind::RParen,
            "Missing closing ')' for IGNORE attribute",
        )?;
        Ok(())
    }

    /// `STRING(init, deinit, set, data, len)`, with the identifier already
    /// consumed
    pub(crate) fn parse_string_api(&mut self) -> Result<StrApi, ParseError> {
        const USAGE: &str =
            "STRING() expects five function names: init, deinit, set, data, len";

        self.expect_next(TokenKind::LParen, "Expected '(' after 'STRING'")?;
        let mut names = [Span::empty(); 5];
        for (index, name) in names.iter_mut().enumerate() {
            if index > 0 {
                self.expect_next(TokenKind::Comma, USAGE)?;
            }
            *name = self.expect_next(TokenKind::Ident, USAGE)?.span;
        }
        self.expect_next(TokenKind::RParen, USAGE)?;

        let [init, deinit, set, data, len] = names.map(Name::Source);
        Ok(StrApi {
            init,
            deinit,
            set,
            data,
            len,
        })
    }

    /// `STRINGLIST(prefix)`, with the identifier already consumed
    pub(crate) fn parse_stringlist_prefix(&mut self) -> Result<Span, ParseError> {
        self.expect_next(TokenKind::LParen, "Expected '(' after 'STRINGLIST'")?;
        let prefix = self.expect_next(
            TokenKind::Ident,
            "Expected an API prefix. Example: STRINGLIST(strlist)",
        )?;
        self.expect_next(TokenKind::RParen, "Missing closing ')' after 'STRINGLIST'")?;
        Ok(prefix.span)
    }

    fn check_representable(
        &self,
        key: &Key,
        value: &Value,
        attribute: &str,
        span: Span,
    ) -> Result<(), ParseError> {
        match representable_range(&key.ty) {
            Some(range) if !range.contains(value) => Err(self.type_error(
                format!(
                    "Value in {}() must be in range {}",
                    attribute,
                    range
                ),
                span,
            )),
            _ => Ok(()),
        }
    }

    /// A fixed buffer of `len` bytes holds `len - 1` characters.
    fn check_fixed_len(
        &self,
        key: &Key,
        contents: Span,
        len: u32,
        span: Span,
    ) -> Result<(), ParseError> {
        let chars = unescape(self.text(contents)).len();
        if chars >= len as usize {
            return Err(self.type_error(
                format!(
                    "Default string is too long. \"{}\" can't be longer than {} \
                     characters",
                    self.text(key.name),
                    len.saturating_sub(1)
                ),
                span,
            ));
        }
        Ok(())
    }
}
