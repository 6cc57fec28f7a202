//! Type resolution
//!
//! Maps a declaration as written (base keyword, `unsigned`, pointer depth,
//! array dimensions, bitfield width) to its [`SemanticType`], and seeds the
//! attributes every key starts out with before any attribute call runs.
//!
//! # Resolution Order
//!
//! 1. `unsigned` flips a signed 8/16/32-bit base; anything else is an error
//! 2. Pointers: `char*` is a dynamic string, `char**` a dynamic string list,
//!    `struct str*` the built-in custom string
//! 3. Array dimensions turn `char` into a fixed string or string list
//! 4. A bitfield width picks the smallest of 8/16/32 bits that holds it

use super::types::{
    BaseType, IntType, IntWidth, SemanticType, StrApi, TypeSpec,
};
use super::value::{Attributes, Range, Value};
use crate::source::Span;
use thiserror::Error;

/// A declaration that names a known type but combines it illegally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("Unsigned modifier not allowed for type {0}")]
    UnsignedNotAllowed(String),
    #[error("Built-in string type 'str' must be of type 'struct str*'")]
    StrNeedsPointer,
    #[error("Pointers are not supported for type {0}")]
    PointerNotSupported(String),
    #[error("Arrays are not supported for this data type.")]
    ArrayNotSupported,
    #[error("Array size must be greater than zero")]
    ZeroArraySize,
    #[error("Bitfields are only supported on integer types")]
    BitfieldNotSupported,
    #[error("Bitfield width must be in range 1 to 32, not {0}")]
    BitfieldWidth(i64),
}

/// Resolve a declaration to its semantic type.
pub fn resolve(
    spec: TypeSpec,
    dims: &[u32],
    bitfield: Option<i64>,
) -> Result<SemanticType, TypeError> {
    if spec.unsigned && !(spec.base.is_signed_int() && spec.pointers == 0) {
        return Err(TypeError::UnsignedNotAllowed(spec.to_string()));
    }

    let mut ty = match (spec.base, spec.pointers) {
        (BaseType::Str, 1) => SemanticType::CustomStr(StrApi::BUILTIN),
        (BaseType::Str, _) => return Err(TypeError::StrNeedsPointer),
        (BaseType::I8, 1) => SemanticType::DynStr,
        (BaseType::I8, 2) => SemanticType::DynStrList,
        (base, 0) => scalar(base, spec.unsigned),
        _ => return Err(TypeError::PointerNotSupported(spec.to_string())),
    };

    if !dims.is_empty() {
        let is_char = ty == SemanticType::Int(IntType::new(IntWidth::W8, true));
        if !is_char || dims.len() > 2 {
            return Err(TypeError::ArrayNotSupported);
        }
        if dims.contains(&0) {
            return Err(TypeError::ZeroArraySize);
        }
        ty = match dims {
            &[len] => SemanticType::FixedStr { len },
            &[count, len] => SemanticType::FixedStrList { count, len },
            _ => return Err(TypeError::ArrayNotSupported),
        };
    }

    if let Some(width) = bitfield {
        let SemanticType::Int(int) = ty else {
            return Err(TypeError::BitfieldNotSupported);
        };
        if !(1..=32).contains(&width) {
            return Err(TypeError::BitfieldWidth(width));
        }
        let bits = width as u32;
        let storage = IntWidth::ALL
            .into_iter()
            .find(|w| w.bits() >= bits)
            .unwrap_or(IntWidth::W32);
        ty = SemanticType::Int(IntType {
            width: storage,
            signed: int.signed,
            bitfield: Some(bits),
        });
    }

    Ok(ty)
}

fn scalar(base: BaseType, unsigned: bool) -> SemanticType {
    let int = |width, signed| SemanticType::Int(IntType::new(width, signed));
    match base {
        BaseType::Bool => SemanticType::Bool,
        BaseType::I8 => int(IntWidth::W8, !unsigned),
        BaseType::U8 => int(IntWidth::W8, false),
        BaseType::I16 => int(IntWidth::W16, !unsigned),
        BaseType::U16 => int(IntWidth::W16, false),
        BaseType::I32 => int(IntWidth::W32, !unsigned),
        BaseType::U32 => int(IntWidth::W32, false),
        BaseType::Float => SemanticType::Float,
        BaseType::Str => SemanticType::CustomStr(StrApi::BUILTIN),
    }
}

/// Representable range of a numeric type, `None` for everything else.
pub fn representable_range(ty: &SemanticType) -> Option<Range> {
    match ty {
        SemanticType::Int(int) => {
            let (min, max) = int.range();
            Some(Range::Int { min, max })
        }
        SemanticType::Float => Some(Range::Float {
            min: -f64::MAX,
            max: f64::MAX,
        }),
        SemanticType::FixedStr { .. }
        | SemanticType::DynStr
        | SemanticType::CustomStr(_)
        | SemanticType::FixedStrList { .. }
        | SemanticType::DynStrList
        | SemanticType::CustomStrList(_)
        | SemanticType::Bool => None,
    }
}

/// Attributes a key starts with: empty strings and lists, zero for numbers,
/// and the full representable range.
pub fn default_attributes_for(ty: &SemanticType) -> Attributes {
    let default = match ty {
        SemanticType::FixedStr { .. }
        | SemanticType::DynStr
        | SemanticType::CustomStr(_) => Value::Str(Span::empty()),
        SemanticType::FixedStrList { .. }
        | SemanticType::DynStrList
        | SemanticType::CustomStrList(_) => Value::StrList(Vec::new()),
        SemanticType::Bool | SemanticType::Int(_) => Value::Int(0),
        SemanticType::Float => Value::Float(0.0),
    };
    Attributes {
        default,
        range: representable_range(ty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(base: BaseType, unsigned: bool, pointers: u8) -> TypeSpec {
        TypeSpec {
            base,
            unsigned,
            pointers,
        }
    }

    #[test]
    fn test_scalars() {
        assert_eq!(
            resolve(spec(BaseType::I32, false, 0), &[], None),
            Ok(SemanticType::Int(IntType::new(IntWidth::W32, true)))
        );
        assert_eq!(
            resolve(spec(BaseType::I16, true, 0), &[], None),
            Ok(SemanticType::Int(IntType::new(IntWidth::W16, false)))
        );
        assert_eq!(
            resolve(spec(BaseType::Bool, false, 0), &[], None),
            Ok(SemanticType::Bool)
        );
        assert_eq!(
            resolve(spec(BaseType::Float, false, 0), &[], None),
            Ok(SemanticType::Float)
        );
    }

    #[test]
    fn test_strings() {
        let char_spec = |pointers| spec(BaseType::I8, false, pointers);
        assert_eq!(
            resolve(char_spec(0), &[16], None),
            Ok(SemanticType::FixedStr { len: 16 })
        );
        assert_eq!(
            resolve(char_spec(0), &[4, 16], None),
            Ok(SemanticType::FixedStrList { count: 4, len: 16 })
        );
        assert_eq!(resolve(char_spec(1), &[], None), Ok(SemanticType::DynStr));
        assert_eq!(
            resolve(char_spec(2), &[], None),
            Ok(SemanticType::DynStrList)
        );
        assert_eq!(
            resolve(spec(BaseType::Str, false, 1), &[], None),
            Ok(SemanticType::CustomStr(StrApi::BUILTIN))
        );
    }

    #[test]
    fn test_illegal_combinations() {
        assert!(matches!(
            resolve(spec(BaseType::I8, true, 1), &[], None),
            Err(TypeError::UnsignedNotAllowed(ref s)) if s == "char*"
        ));
        assert!(matches!(
            resolve(spec(BaseType::Bool, true, 0), &[], None),
            Err(TypeError::UnsignedNotAllowed(_))
        ));
        assert_eq!(
            resolve(spec(BaseType::U8, false, 0), &[4], None),
            Err(TypeError::ArrayNotSupported)
        );
        assert_eq!(
            resolve(spec(BaseType::I8, false, 0), &[1, 2, 3], None),
            Err(TypeError::ArrayNotSupported)
        );
        assert_eq!(
            resolve(spec(BaseType::I8, false, 0), &[0], None),
            Err(TypeError::ZeroArraySize)
        );
        assert_eq!(
            resolve(spec(BaseType::Str, false, 0), &[], None),
            Err(TypeError::StrNeedsPointer)
        );
        assert_eq!(
            resolve(spec(BaseType::Float, false, 0), &[], Some(4)),
            Err(TypeError::BitfieldNotSupported)
        );
        assert_eq!(
            resolve(spec(BaseType::I32, false, 0), &[], Some(33)),
            Err(TypeError::BitfieldWidth(33))
        );
    }

    #[test]
    fn test_bitfield_storage_selection() {
        let storage = |width| match resolve(
            spec(BaseType::I32, true, 0),
            &[],
            Some(width),
        ) {
            Ok(SemanticType::Int(int)) => int.width,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(storage(1), IntWidth::W8);
        assert_eq!(storage(8), IntWidth::W8);
        assert_eq!(storage(9), IntWidth::W16);
        assert_eq!(storage(16), IntWidth::W16);
        assert_eq!(storage(17), IntWidth::W32);
        assert_eq!(storage(32), IntWidth::W32);
    }

    #[test]
    fn test_default_attributes() {
        let attrs = default_attributes_for(&SemanticType::Int(IntType::new(
            IntWidth::W32,
            false,
        )));
        assert_eq!(attrs.default, Value::Int(0));
        assert_eq!(
            attrs.range,
            Some(Range::Int {
                min: 0,
                max: 4294967295
            })
        );

        let attrs = default_attributes_for(&SemanticType::DynStrList);
        assert_eq!(attrs.default, Value::StrList(Vec::new()));
        assert_eq!(attrs.range, None);

        let attrs = default_attributes_for(&SemanticType::Float);
        assert_eq!(
            attrs.range,
            Some(Range::Float {
                min: -f64::MAX,
                max: f64::MAX
            })
        );
    }
}
