//! Schema built from `SECTION(...)` declarations
//!
//! # Structure
//!
//! ```text
//! Schema
//!  └─ Section  "[name]" <-> struct T
//!      └─ Key  one field: name, SemanticType, Attributes
//! ```
//!
//! Every name in the tree is a [`Span`] into the [`crate::source::SourceMap`]
//! the schema was parsed from.

pub mod resolve;
pub mod types;
pub mod value;

pub use resolve::{default_attributes_for, resolve, TypeError};
pub use types::{
    BaseType, IntType, IntWidth, ListApi, Name, SemanticType, StrApi, TypeSpec,
};
pub use value::{Attributes, Range, Value};

use crate::source::{SourceMap, Span};

/// One struct field bound to one `key = value` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    pub name: Span,
    pub ty: SemanticType,
    pub attributes: Attributes,
}

impl Key {
    /// New key with the default attributes of its type.
    pub fn new(name: Span, ty: SemanticType) -> Self {
        Self {
            name,
            ty,
            attributes: default_attributes_for(&ty),
        }
    }
}

/// One `[name]` block bound to one struct type.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: Span,
    pub struct_name: Span,
    /// `struct T { ... }` text, captured for C/C++ source inputs only
    pub struct_def: Option<Span>,
    pub keys: Vec<Key>,
}

impl Section {
    pub fn new(name: Span, struct_name: Span) -> Self {
        Self {
            name,
            struct_name,
            struct_def: None,
            keys: Vec::new(),
        }
    }

    pub fn key<'a>(&'a self, sources: &SourceMap, name: &str) -> Option<&'a Key> {
        self.keys.iter().find(|key| sources.text(key.name) == name)
    }
}

/// All sections of one generator run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub sections: Vec<Section>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// First section declared as `[name]`.
    pub fn section<'a>(
        &'a self,
        sources: &SourceMap,
        name: &str,
    ) -> Option<&'a Section> {
        self.sections
            .iter()
            .find(|section| sources.text(section.name) == name)
    }

    pub fn key_count(&self) -> usize {
        self.sections.iter().map(|section| section.keys.len()).sum()
    }
}
