//! In-process INI reader and writer
//!
//! Reads and writes INI text for a [`crate::schema::Section`] exactly the way
//! the generated C functions do, without compiling anything:
//! - [`reader`]: INI tokens and the `[name]` scan (`T_parse_all`)
//! - [`record`]: one section's values (`T_init`, `T_parse_section`,
//!   `T_parse`, `T_fwrite`)
//!
//! # Accepted Syntax
//!
//! ```text
//! # comment            ; comment
//! [section]
//! key = "string"       \" is the only escape
//! key = "a", "b"       possibly empty list
//! key = -12            0x1F, -0x10
//! key = 2.5            1e-3, 2.5f
//! key = true           false, 0, 1
//! ```

pub mod reader;
pub mod record;

pub use reader::{parse_all, IniReader};
pub use record::{FieldValue, Record};

use crate::diagnostics::Diagnostic;
use crate::parser::lexer::LexError;
use crate::source::Span;
use thiserror::Error;

/// Error while reading an INI buffer, anchored to the offending token.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct IniError {
    pub message: String,
    pub span: Span,
}

impl IniError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.span, self.message.clone())
    }
}

impl From<LexError> for IniError {
    fn from(err: LexError) -> Self {
        IniError::new(err.message, err.span)
    }
}
