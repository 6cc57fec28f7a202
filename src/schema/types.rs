//! Semantic field types
//!
//! Every key in a section has exactly one [`SemanticType`]. Declarations the
//! parser can't classify never get one; they either take the recovery path
//! (IGNORE/STRING/STRINGLIST) or fail.

use crate::source::{SourceMap, Span};
use std::fmt;

/// Base type keyword of a declaration, before modifiers are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    Float,
    /// `struct str`
    Str,
}

impl BaseType {
    /// Recognize a single-identifier type spelling. `struct str` is handled
    /// by the parser since it spans two tokens.
    pub fn from_keyword(word: &str) -> Option<Self> {
        let base = match word {
            "bool" => BaseType::Bool,
            "char" | "i8" | "int8_t" => BaseType::I8,
            "u8" | "uint8_t" => BaseType::U8,
            "i16" | "int16_t" => BaseType::I16,
            "u16" | "uint16_t" => BaseType::U16,
            "int" | "i32" | "int32_t" => BaseType::I32,
            "u32" | "uint32_t" => BaseType::U32,
            "float" | "double" => BaseType::Float,
            _ => return None,
        };
        Some(base)
    }

    pub fn is_signed_int(self) -> bool {
        matches!(self, BaseType::I8 | BaseType::I16 | BaseType::I32)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BaseType::Bool => "bool",
            BaseType::I8 => "char",
            BaseType::U8 => "uint8_t",
            BaseType::I16 => "int16_t",
            BaseType::U16 => "uint16_t",
            BaseType::I32 => "int",
            BaseType::U32 => "uint32_t",
            BaseType::Float => "float",
            BaseType::Str => "struct str",
        };
        f.write_str(name)
    }
}

/// A declaration's type as written: base, `unsigned` and pointer depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    pub base: BaseType,
    pub unsigned: bool,
    pub pointers: u8,
}

impl TypeSpec {
    pub fn new(base: BaseType) -> Self {
        Self {
            base,
            unsigned: false,
            pointers: 0,
        }
    }

    /// Pointers only mean something on `char` (strings and string lists)
    /// and on `struct str`. Anything else goes down the recovery path.
    pub fn is_classifiable(&self) -> bool {
        match self.base {
            BaseType::Str => true,
            BaseType::I8 => self.pointers <= 2,
            _ => self.pointers == 0,
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for _ in 0..self.pointers {
            f.write_str("*")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntWidth {
    W8,
    W16,
    W32,
}

impl IntWidth {
    pub const ALL: [IntWidth; 3] = [IntWidth::W8, IntWidth::W16, IntWidth::W32];

    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
        }
    }
}

/// Fixed-width integer, optionally narrowed to a bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntType {
    pub width: IntWidth,
    pub signed: bool,
    /// Declared bitfield width; `width` is the smallest storage that fits it
    pub bitfield: Option<u32>,
}

impl IntType {
    pub fn new(width: IntWidth, signed: bool) -> Self {
        Self {
            width,
            signed,
            bitfield: None,
        }
    }

    /// Inclusive range of values the field can hold.
    pub fn range(&self) -> (i64, i64) {
        let bits = self.bitfield.unwrap_or_else(|| self.width.bits());
        if self.signed {
            (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
        } else {
            (0, (1i64 << bits) - 1)
        }
    }

    /// Storage type in generated C code
    pub fn c_type(&self) -> &'static str {
        match (self.width, self.signed) {
            (IntWidth::W8, true) => "int8_t",
            (IntWidth::W8, false) => "uint8_t",
            (IntWidth::W16, true) => "int16_t",
            (IntWidth::W16, false) => "uint16_t",
            (IntWidth::W32, true) => "int32_t",
            (IntWidth::W32, false) => "uint32_t",
        }
    }
}

/// An identifier bound by an attribute call, or one of the built-in names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Name {
    Source(Span),
    Builtin(&'static str),
}

impl Name {
    pub fn text<'a>(&self, sources: &'a SourceMap) -> &'a str {
        match self {
            Name::Source(span) => sources.text(*span),
            Name::Builtin(name) => name,
        }
    }
}

/// Functions backing a custom string: `init(T**)`, `deinit(T*)`,
/// `set(T**, const char*, int)`, `data(const T*)` and `len(const T*)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrApi {
    pub init: Name,
    pub deinit: Name,
    pub set: Name,
    pub data: Name,
    pub len: Name,
}

impl StrApi {
    /// The API of the built-in `struct str*`.
    pub const BUILTIN: StrApi = StrApi {
        init: Name::Builtin("str_init"),
        deinit: Name::Builtin("str_deinit"),
        set: Name::Builtin("str_set"),
        data: Name::Builtin("str_data"),
        len: Name::Builtin("str_len"),
    };
}

/// Functions backing a custom string list, all derived from one prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListApi {
    pub prefix: Name,
}

impl ListApi {
    pub const SUFFIXES: [&'static str; 6] =
        ["init", "deinit", "add", "clear", "count", "cstr"];

    /// `<prefix>_<suffix>`
    pub fn function(&self, sources: &SourceMap, suffix: &str) -> String {
        format!("{}_{}", self.prefix.text(sources), suffix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    /// `char name[len]`
    FixedStr { len: u32 },
    /// `char* name`
    DynStr,
    CustomStr(StrApi),
    /// `char name[count][len]`
    FixedStrList { count: u32, len: u32 },
    /// `char** name`, NULL-terminated
    DynStrList,
    CustomStrList(ListApi),
    Bool,
    Int(IntType),
    Float,
}

impl SemanticType {
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            SemanticType::FixedStr { .. }
                | SemanticType::DynStr
                | SemanticType::CustomStr(_)
        )
    }

    pub fn is_string_list(&self) -> bool {
        matches!(
            self,
            SemanticType::FixedStrList { .. }
                | SemanticType::DynStrList
                | SemanticType::CustomStrList(_)
        )
    }
}
