//! Struct body parsing
//!
//! This module handles the fields between the braces of a `SECTION` struct:
//!
//! - Base types: `bool`, `char`, `int`, `uintN_t`/`uN`, `float`, `struct str`
//! - `unsigned`, pointers, `[n]`/`[n][m]` arrays and `:width` bitfields
//! - `,`-chained declarators sharing one base type
//! - The recovery path for types that can't be classified
//!
//! # Grammar
//!
//! ```text
//! field      ::= type declarator ("," declarator)* ";"
//! type       ::= "unsigned"? (keyword | "struct" ident)
//! declarator ::= "*"* ident ("[" int "]")* (":" int)? attribute*
//! ```
//!
//! A bare `unsigned` followed by a name is read as `unsigned int`. An
//! `unsigned` in front of any other non-integer type is an error.

use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::{ErrorKind, ParseError, Parser};
use crate::schema::{
    resolve, BaseType, Key, ListApi, Name, Section, SemanticType, TypeSpec,
};
use crate::source::Span;
use log::debug;

/// Type part of a field declaration.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Declared {
    Known(TypeSpec),
    Unknown,
}

impl<'a> Parser<'a> {
    /// Parse fields until a token that can't start one, and return that
    /// token (normally the closing `}`).
    pub(crate) fn parse_struct_body(
        &mut self,
        section: &mut Section,
    ) -> Result<Token, ParseError> {
        loop {
            let first = self.advance()?;
            if first.kind != TokenKind::Ident {
                return Ok(first);
            }

            let (declared, mut token) = self.parse_type(first)?;
            let mut start = first;
            loop {
                let end = match declared {
                    Declared::Known(spec) => {
                        self.parse_declarator(section, spec, start, token)?
                    }
                    Declared::Unknown => {
                        self.parse_unknown_field(section, start, token)?
                    }
                };
                match end.kind {
                    TokenKind::Semicolon => break,
                    TokenKind::Comma => {
                        token = self.advance()?;
                        start = token;
                    }
                    _ => return Err(self.syntax_error("Missing ';'", end.span)),
                }
            }
        }
    }

    /// Parse the base type starting at `first`. Returns the type and the
    /// first token of the declarator.
    pub(crate) fn parse_type(
        &mut self,
        first: Token,
    ) -> Result<(Declared, Token), ParseError> {
        let word = self.text(first.span);

        if word == "unsigned" {
            let token = self.advance()?;
            let unsigned_int = TypeSpec {
                base: BaseType::I32,
                unsigned: true,
                pointers: 0,
            };
            if token.kind != TokenKind::Ident {
                return Ok((Declared::Known(unsigned_int), token));
            }
            let next = self.text(token.span);
            if let Some(base) = BaseType::from_keyword(next) {
                let spec = TypeSpec {
                    base,
                    unsigned: true,
                    pointers: 0,
                };
                return Ok((Declared::Known(spec), self.advance()?));
            }
            if next == "struct" {
                return Err(self.type_error(
                    "Unsigned modifier not allowed for type struct",
                    first.span.to(token.span),
                ));
            }
            // `unsigned name`: the identifier is the field name
            return Ok((Declared::Known(unsigned_int), token));
        }

        if let Some(base) = BaseType::from_keyword(word) {
            return Ok((Declared::Known(TypeSpec::new(base)), self.advance()?));
        }

        if word == "struct" {
            let name = self.expect_next(
                TokenKind::Ident,
                "Expected struct name after 'struct'",
            )?;
            let declared = if self.text(name.span) == "str" {
                Declared::Known(TypeSpec::new(BaseType::Str))
            } else {
                Declared::Unknown
            };
            return Ok((declared, self.advance()?));
        }

        Ok((Declared::Unknown, self.advance()?))
    }

    /// Parse one declarator of a classified type and add its key to the
    /// section. Returns the terminating token.
    fn parse_declarator(
        &mut self,
        section: &mut Section,
        base: TypeSpec,
        start: Token,
        mut token: Token,
    ) -> Result<Token, ParseError> {
        let mut spec = base;
        while token.kind == TokenKind::Star {
            spec.pointers = spec.pointers.saturating_add(1);
            token = self.advance()?;
        }
        if !spec.is_classifiable() {
            return self.parse_unknown_field(section, start, token);
        }

        if token.kind != TokenKind::Ident {
            return Err(self.syntax_error("Expected an identifier", token.span));
        }
        let name = token.span;
        let mut last = token.span;
        token = self.advance()?;

        let mut dims = Vec::new();
        while token.kind == TokenKind::LBracket {
            let (n, size) = self
                .expect_int("Expected integer after '[' in struct definition")?;
            let n = u32::try_from(n).map_err(|_| {
                self.type_error("Array size out of range", size.span)
            })?;
            dims.push(n);
            last = self
                .expect_next(TokenKind::RBracket, "Missing closing ']' in struct")?
                .span;
            token = self.advance()?;
        }

        let mut bitfield = None;
        if token.kind == TokenKind::Colon {
            let (n, width) =
                self.expect_int("Expected bitfield width after ':'")?;
            bitfield = Some(n);
            last = width.span;
            token = self.advance()?;
        }

        let ty = resolve(spec, &dims, bitfield)
            .map_err(|err| self.resolve_error(err, start.span.to(last)))?;
        debug!("key {} resolved to {:?}", self.text(name), ty);

        self.finish_key(section, Key::new(name, ty), token, false)
    }

    /// Unknown-type recovery: walk to the end of the declarator looking for
    /// `IGNORE()`, `STRING(...)` or `STRINGLIST(...)`.
    ///
    /// The key name of a custom type is the last identifier before the
    /// binding call.
    fn parse_unknown_field(
        &mut self,
        section: &mut Section,
        start: Token,
        mut token: Token,
    ) -> Result<Token, ParseError> {
        let mut ignored = false;
        let mut last_ident = None;

        loop {
            match token.kind {
                TokenKind::End => break,
                TokenKind::Semicolon | TokenKind::Comma if ignored => {
                    return Ok(token)
                }
                TokenKind::Semicolon | TokenKind::Comma => break,
                TokenKind::Ident => match self.text(token.span) {
                    "IGNORE" => {
                        self.parse_ignore()?;
                        ignored = true;
                    }
                    "STRING" => {
                        let name = self.binding_target(last_ident, token)?;
                        let api = self.parse_string_api()?;
                        let key = Key::new(name, SemanticType::CustomStr(api));
                        let next = self.advance()?;
                        return self.finish_key(section, key, next, ignored);
                    }
                    "STRINGLIST" => {
                        let name = self.binding_target(last_ident, token)?;
                        let prefix = self.parse_stringlist_prefix()?;
                        let ty = SemanticType::CustomStrList(ListApi {
                            prefix: Name::Source(prefix),
                        });
                        let next = self.advance()?;
                        return self.finish_key(section, Key::new(name, ty), next, ignored);
                    }
                    _ => last_ident = Some(token),
                },
                _ => {}
            }
            token = self.advance()?;
        }

        Err(ParseError::new(
            ErrorKind::Unsupported,
            "Unsupported data type. You can add the IGNORE() attribute to \
             ignore this field.",
            start.span,
        ))
    }

    fn binding_target(
        &self,
        last_ident: Option<Token>,
        call: Token,
    ) -> Result<Span, ParseError> {
        last_ident.map(|token| token.span).ok_or_else(|| {
            self.syntax_error(
                "Expected a field name before the binding attribute",
                call.span,
            )
        })
    }

    /// Run the attribute calls following a key and add it to the section
    /// unless it was ignored.
    fn finish_key(
        &mut self,
        section: &mut Section,
        mut key: Key,
        token: Token,
        ignored: bool,
    ) -> Result<Token, ParseError> {
        let (token, ignore_attr) = self.parse_attributes(&mut key, token)?;
        if ignored || ignore_attr {
            debug!("key {} ignored", self.text(key.name));
        } else {
            section.keys.push(key);
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse::{ErrorKind, ParseError, Parser};
    use crate::schema::{
        IntType, IntWidth, Name, Schema, SemanticType, StrApi,
    };
    use crate::source::SourceMap;

    fn parse_body(body: &str) -> (SourceMap, Result<Schema, ParseError>) {
        let mut sources = SourceMap::new();
        let text = format!("SECTION(\"s\") struct s {{\n{}\n}};", body);
        let id = sources.add("t.h", text);
        let mut schema = Schema::new();
        let result = Parser::new(&sources, id)
            .parse_into(&mut schema)
            .map(|_| schema);
        (sources, result)
    }

    fn types(body: &str) -> Vec<(String, SemanticType)> {
        let (sources, result) = parse_body(body);
        let schema = result.expect("Parsing failed");
        schema.sections[0]
            .keys
            .iter()
            .map(|key| (sources.text(key.name).to_string(), key.ty))
            .collect()
    }

    fn int(width: IntWidth, signed: bool) -> SemanticType {
        SemanticType::Int(IntType::new(width, signed))
    }

    #[test]
    fn test_base_types() {
        let keys = types(
            "bool a; char b; u8 c; int16_t d; uint16_t e; i32 f; \
             uint32_t g; int h; float i; double j;",
        );
        let expected = [
            SemanticType::Bool,
            int(IntWidth::W8, true),
            int(IntWidth::W8, false),
            int(IntWidth::W16, true),
            int(IntWidth::W16, false),
            int(IntWidth::W32, true),
            int(IntWidth::W32, false),
            int(IntWidth::W32, true),
            SemanticType::Float,
            SemanticType::Float,
        ];
        assert_eq!(keys.len(), expected.len());
        for ((_, ty), expected) in keys.iter().zip(expected) {
            assert_eq!(*ty, expected);
        }
    }

    #[test]
    fn test_strings_and_lists() {
        let keys = types(
            "char name[32]; char* path; char** tags; char slots[4][16]; \
             struct str* title;",
        );
        assert_eq!(keys[0].1, SemanticType::FixedStr { len: 32 });
        assert_eq!(keys[1].1, SemanticType::DynStr);
        assert_eq!(keys[2].1, SemanticType::DynStrList);
        assert_eq!(keys[3].1, SemanticType::FixedStrList { count: 4, len: 16 });
        assert_eq!(keys[4].1, SemanticType::CustomStr(StrApi::BUILTIN));
    }

    #[test]
    fn test_comma_chained_declarators() {
        let keys = types("int a, b DEFAULT(3), c; char *d, e;");
        let names: Vec<_> = keys.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
        assert_eq!(keys[3].1, SemanticType::DynStr);
        assert_eq!(keys[4].1, int(IntWidth::W8, true));
    }

    #[test]
    fn test_unsigned() {
        let keys = types("unsigned char a; unsigned short_name; unsigned flags : 9;");
        assert_eq!(keys[0].1, int(IntWidth::W8, false));
        // bare `unsigned` followed by a name is `unsigned int`
        assert_eq!(keys[1].0, "short_name");
        assert_eq!(keys[1].1, int(IntWidth::W32, false));
        assert_eq!(
            keys[2].1,
            SemanticType::Int(IntType {
                width: IntWidth::W16,
                signed: false,
                bitfield: Some(9),
            })
        );
    }

    #[test]
    fn test_unsigned_errors() {
        for body in ["unsigned char* s;", "unsigned bool b;", "unsigned struct str* s;"] {
            let (_, result) = parse_body(body);
            let err = result.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Type, "{}", body);
            assert!(err.message.starts_with("Unsigned modifier not allowed"));
        }
    }

    #[test]
    fn test_unknown_type_requires_ignore() {
        let (sources, result) = parse_body("int a;\n    struct vec3 pos;");
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert_eq!(sources.text(err.span), "struct");
        assert!(err.message.contains("IGNORE()"));

        let keys = types("struct vec3 pos IGNORE(); int* p IGNORE(); int a;");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].0, "a");
    }

    #[test]
    fn test_custom_bindings() {
        let (sources, result) = parse_body(
            "struct my_string* title STRING(ms_init, ms_free, ms_set, ms_data, ms_len) \
             DEFAULT(\"hello\");\n\
             struct my_list* names STRINGLIST(ml);",
        );
        let schema = result.expect("Parsing failed");
        let keys = &schema.sections[0].keys;
        assert_eq!(sources.text(keys[0].name), "title");
        match keys[0].ty {
            SemanticType::CustomStr(api) => {
                assert_eq!(api.init.text(&sources), "ms_init");
                assert_eq!(api.len.text(&sources), "ms_len");
            }
            other => panic!("Expected custom string, got {:?}", other),
        }
        assert_eq!(sources.text(keys[1].name), "names");
        match keys[1].ty {
            SemanticType::CustomStrList(api) => {
                assert!(matches!(api.prefix, Name::Source(_)));
                assert_eq!(api.function(&sources, "add"), "ml_add");
            }
            other => panic!("Expected custom string list, got {:?}", other),
        }
    }

    #[test]
    fn test_declarator_errors() {
        let cases = [
            ("int;", ErrorKind::Syntax, "Expected an identifier"),
            ("int a", ErrorKind::Syntax, "Missing ';'"),
            ("int a[4];", ErrorKind::Type, "Arrays are not supported for this data type."),
            ("char a[x];", ErrorKind::Syntax, "Expected integer after '[' in struct definition"),
            ("char a[4;", ErrorKind::Syntax, "Missing closing ']' in struct"),
            ("char a[0];", ErrorKind::Type, "Array size must be greater than zero"),
            ("float a : 3;", ErrorKind::Type, "Bitfields are only supported on integer types"),
            ("int a : 0;", ErrorKind::Type, "Bitfield width must be in range 1 to 32, not 0"),
            ("struct str title;", ErrorKind::Type, "Built-in string type 'str' must be of type 'struct str*'"),
            ("struct { int x; } y;", ErrorKind::Syntax, "Expected struct name after 'struct'"),
        ];
        for (body, kind, message) in cases {
            let (_, result) = parse_body(body);
            let err = result.unwrap_err();
            assert_eq!(err.kind, kind, "{}", body);
            assert_eq!(err.message, message, "{}", body);
        }
    }
}
