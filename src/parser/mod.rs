//! Schema parser for `SECTION`-annotated C structs
//!
//! This module turns annotated C text into a [`Schema`]:
//! - [`lexer`]: Tokenization (bytes → tokens), shared with the INI reader
//! - [`parse`]: Parser struct, error type, top-level `SECTION` grammar
//! - `declarations`: struct bodies and field declarators
//! - `attributes`: `DEFAULT`, `CONSTRAIN`, `IGNORE`, `STRING`, `STRINGLIST`
//!
//! # Supported Declarations
//!
//! Only what is needed to find a field's name, type, array size, bitfield
//! width and attribute calls:
//! - Types: `bool`, `char`, `int`, `float`, `double`, `[u]int{8,16,32}_t`,
//!   `u8`..`i32`, `unsigned`, `char*`, `char**`, `struct str*`
//! - Suffixes: `[n]`, `[n][m]` on `char`, `:width` on integers
//! - Anything else must be marked `IGNORE()` or bound with `STRING(...)` or
//!   `STRINGLIST(...)`
//!
//! The first error aborts parsing. There is no recovery across sections.

mod attributes;
mod declarations;
pub mod lexer;
pub mod parse;

pub use parse::{ErrorKind, ParseError, Parser};

use crate::schema::Schema;
use crate::source::SourceMap;
use log::info;

/// Parse every buffer of `sources`, in the order they were added, into one
/// schema.
pub fn parse_sources(sources: &SourceMap) -> Result<Schema, ParseError> {
    let mut schema = Schema::new();
    for (id, file) in sources.files() {
        info!("parsing {}", file.name());
        Parser::new(sources, id).parse_into(&mut schema)?;
    }
    info!(
        "found {} sections with {} keys",
        schema.sections.len(),
        schema.key_count()
    );
    Ok(schema)
}
