//! Literal values and per-key attributes
//!
//! Values are what `DEFAULT()` and `CONSTRAIN()` calls produce. Strings are
//! kept as spans of the literal's contents, escapes and all; use
//! [`unescape`] to get the text a reader of the INI file would see.

use crate::source::Span;
use std::fmt;

/// A literal from an attribute call.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(Span),
    StrList(Vec<Span>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Float value, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<Span> {
        match self {
            Value::Str(span) => Some(*span),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[Span]> {
        match self {
            Value::StrList(items) => Some(items),
            _ => None,
        }
    }
}

/// Inclusive bounds for numeric keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Range {
    Int { min: i64, max: i64 },
    Float { min: f64, max: f64 },
}

impl Range {
    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Range::Int { min, max }, Value::Int(n)) => (*min..=*max).contains(n),
            (Range::Float { min, max }, value) => value
                .as_float()
                .is_some_and(|n| *min <= n && n <= *max),
            _ => false,
        }
    }

    /// Value in range nearest to zero, spelled as a `DEFAULT()` argument.
    pub fn nearest_to_zero(&self) -> String {
        match *self {
            Range::Int { min, max } => (if min > 0 { min } else { max.min(0) }).to_string(),
            Range::Float { min, max } => {
                (if min > 0.0 { min } else { max.min(0.0) }).to_string()
            }
        }
    }
}

/// `MIN to MAX`, as used in range messages
impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Range::Int { min, max } => write!(f, "{} to {}", min, max),
            Range::Float { min, max } => write!(f, "{:e} to {:e}", min, max),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    pub default: Value,
    /// Only set for integer and float keys
    pub range: Option<Range>,
}

/// Resolve the one escape string literals support, `\"`.
pub fn unescape(raw: &str) -> String {
    raw.replace("\\\"", "\"")
}

/// Inverse of [`unescape`].
pub fn escape(text: &str) -> String {
    text.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_contains() {
        let range = Range::Int { min: -5, max: 5 };
        assert!(range.contains(&Value::Int(-5)));
        assert!(range.contains(&Value::Int(5)));
        assert!(!range.contains(&Value::Int(6)));
        assert!(!range.contains(&Value::Float(1.0)));

        let range = Range::Float { min: 0.0, max: 1.0 };
        assert!(range.contains(&Value::Float(0.5)));
        assert!(range.contains(&Value::Int(1)));
        assert!(!range.contains(&Value::Float(1.5)));
    }

    #[test]
    fn test_nearest_to_zero() {
        assert_eq!(Range::Int { min: 1, max: 65535 }.nearest_to_zero(), "1");
        assert_eq!(Range::Int { min: -10, max: -3 }.nearest_to_zero(), "-3");
        assert_eq!(Range::Int { min: -5, max: 5 }.nearest_to_zero(), "0");
        assert_eq!(Range::Float { min: 0.25, max: 8.0 }.nearest_to_zero(), "0.25");
    }

    #[test]
    fn test_range_display() {
        assert_eq!(Range::Int { min: -128, max: 127 }.to_string(), "-128 to 127");
        assert_eq!(
            Range::Float { min: 0.5, max: 100.0 }.to_string(),
            "5e-1 to 1e2"
        );
    }

    #[test]
    fn test_escape_round_trip() {
        assert_eq!(unescape(r#"say \"hi\""#), r#"say "hi""#);
        assert_eq!(escape(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(unescape(r"C:\path"), r"C:\path");
    }
}
