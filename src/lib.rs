//! # Introduction
//!
//! c-ini reads C structs annotated with `SECTION("name")` and per-field
//! attributes, and generates C functions that initialize those structs with
//! their defaults, parse INI sections into them and write them back out.
//!
//! ```c
//! SECTION("video")
//! struct video_cfg {
//!     int width  DEFAULT(1280) CONSTRAIN(1, 16384);
//!     char* title DEFAULT("demo");
//!     char names[4][16] DEFAULT("One") DEFAULT("Two");
//! };
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Inputs → SourceMap → Lexer → Parser → Schema → Code Emitter → .h + .c
//!                                          └──→ ini::Record (in-process)
//! ```
//!
//! 1. [`source`] owns every input buffer; everything downstream holds
//!    [`source::Span`]s into it.
//! 2. [`parser`] finds `SECTION` structs and builds a [`schema::Schema`],
//!    resolving each field to a [`schema::SemanticType`].
//! 3. [`codegen`] emits the header and the source, INI runtime included.
//! 4. [`ini`] reads and writes INI text the way the generated code does,
//!    for checking files without a C compiler.
//! 5. [`diagnostics`] renders errors as `file:line:col` plus an excerpt.
//!
//! Generated files go through [`output::write_if_different`], which leaves
//! files with identical content untouched.

pub mod codegen;
pub mod diagnostics;
pub mod error;
pub mod ini;
pub mod output;
pub mod parser;
pub mod schema;
pub mod source;

pub use error::{Error, Result};

use codegen::{GeneratedCode, GeneratorConfig};
use source::SourceMap;
use std::path::Path;

/// Read every input, in order, into one [`SourceMap`].
pub fn load_sources<P: AsRef<Path>>(paths: &[P]) -> Result<SourceMap> {
    let mut sources = SourceMap::new();
    for path in paths {
        let path = path.as_ref();
        let bytes = fs_err::read(path)?;
        sources.add_bytes(path.to_string_lossy(), bytes);
    }
    Ok(sources)
}

/// Parse `sources` and generate code for every section found.
pub fn generate(sources: &SourceMap, config: &GeneratorConfig) -> Result<GeneratedCode> {
    let schema = parser::parse_sources(sources)?;
    Ok(codegen::generate(&schema, sources, config))
}
