//! Crate-level error type

use crate::diagnostics::Diagnostic;
use crate::ini::IniError;
use crate::parser::ParseError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Reading an input or writing an output; `fs_err` puts the path in
    /// the message.
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Ini(#[from] IniError),
}

impl Error {
    /// Positional diagnostic, for errors that point into an input buffer.
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            Error::Io(_) => None,
            Error::Parse(err) => Some(err.diagnostic()),
            Error::Ini(err) => Some(err.diagnostic()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ErrorKind;
    use crate::source::Span;

    #[test]
    fn test_diagnostic_only_for_buffer_errors() {
        let err = Error::from(io::Error::from(io::ErrorKind::NotFound));
        assert!(err.diagnostic().is_none());

        let parse = ParseError::new(ErrorKind::Syntax, "Missing ';'", Span::empty());
        let err = Error::from(parse);
        assert_eq!(err.to_string(), "Missing ';'");
        assert_eq!(err.diagnostic().unwrap().message, "Missing ';'");
    }
}
