//! C code generation
//!
//! Turns a finished [`Schema`] into two artifacts:
//! - [`header`]: forward declarations and the six functions per section
//! - [`source`]: includes, pasted struct definitions, the INI runtime and
//!   the per-section function bodies
//!
//! # Generated Contract
//!
//! For section `S` bound to `struct T`:
//!
//! ```text
//! int  T_init(struct T* s);                 defaults, all-or-nothing
//! void T_deinit(struct T* s);               frees dynamic fields
//! int  T_parse(struct T* s, file, data, len);      first [S] only
//! int  T_parse_all(file, data, len, on_section, user_ptr);  every [S]
//! int  T_parse_section(struct T* s, struct c_ini_parser* p);
//! int  T_fwrite(const struct T* s, FILE* f);
//! ```
//!
//! Generation itself can't fail: every check happens while parsing.

pub mod header;
mod parse;
mod runtime;
pub mod source;

use crate::schema::{value, Schema, Section};
use crate::source::SourceMap;
use log::info;
use std::fmt::{self, Write};

/// Options that don't come from the annotated inputs.
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    /// Path the generated source uses to `#include` the generated header
    pub header_include: Option<String>,
    /// Header inputs, `#include`d so the source sees their struct definitions
    pub includes: Vec<String>,
}

/// Text of the two generated files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub header: String,
    pub source: String,
}

/// Generate the header and source for every section of `schema`.
pub fn generate(
    schema: &Schema,
    sources: &SourceMap,
    config: &GeneratorConfig,
) -> GeneratedCode {
    info!("generating code for {} sections", schema.sections.len());
    GeneratedCode {
        header: header::generate(schema, sources),
        source: source::generate(schema, sources, config),
    }
}

/// No-op definitions of the annotation macros, so annotated struct
/// definitions compile as plain C.
const ATTRIBUTE_MACROS: [(&str, &str); 6] = [
    ("SECTION", "SECTION(name)"),
    ("DEFAULT", "DEFAULT(value)"),
    ("CONSTRAIN", "CONSTRAIN(min, max)"),
    ("IGNORE", "IGNORE()"),
    ("STRING", "STRING(...)"),
    ("STRINGLIST", "STRINGLIST(prefix)"),
];

pub(crate) fn attribute_macros(w: &mut CodeWriter) {
    for (name, signature) in ATTRIBUTE_MACROS {
        w.line(format_args!("#ifndef {name}"));
        w.line(format_args!("#define {signature}"));
        w.line("#endif");
    }
}

/// Line-oriented C writer with brace-aware indentation.
pub(crate) struct CodeWriter {
    output: String,
    indent: usize,
}

impl CodeWriter {
    pub(crate) fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    /// One indented line. Empty text gives an empty line.
    pub(crate) fn line(&mut self, text: impl fmt::Display) {
        let start = self.output.len();
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        let _ = write!(self.output, "{text}");
        if self.output.len() == start + 4 * self.indent {
            self.output.truncate(start);
        }
        self.output.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.output.push('\n');
    }

    /// `text`, then `{` on its own line, one level deeper.
    pub(crate) fn open(&mut self, text: impl fmt::Display) {
        self.line(text);
        self.line("{");
        self.indent += 1;
    }

    pub(crate) fn close(&mut self) {
        self.close_with("}");
    }

    /// Close a block with a custom line, e.g. `};` or `} while (0);`.
    pub(crate) fn close_with(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    /// Labels sit one level left of the statements they precede.
    pub(crate) fn label(&mut self, name: impl fmt::Display) {
        let indent = self.indent;
        self.indent = indent.saturating_sub(1);
        self.line(format_args!("{name}:"));
        self.indent = indent;
    }

    /// Verbatim text, no indentation applied.
    pub(crate) fn raw(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub(crate) fn finish(self) -> String {
        self.output
    }
}

/// Names shared by every function generated for one section.
pub(crate) struct SectionNames<'a> {
    /// `[name]` in the INI file
    pub section: &'a str,
    /// `T` in `struct T`
    pub ty: &'a str,
}

impl<'a> SectionNames<'a> {
    pub(crate) fn new(section: &Section, sources: &'a SourceMap) -> Self {
        Self {
            section: sources.text(section.name),
            ty: sources.text(section.struct_name),
        }
    }
}

/// C string literal holding `text` after escape resolution. Anything
/// outside printable ASCII becomes an octal escape.
pub(crate) fn c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for byte in text.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'?' => out.push_str("\\?"),
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\{byte:03o}");
            }
        }
    }
    out.push('"');
    out
}

/// C literal of a string default written between quotes in a source file.
pub(crate) fn c_string_from_raw(raw: &str) -> String {
    c_string(&value::unescape(raw))
}

/// `printf` format text: a C literal body with `%` doubled.
pub(crate) fn c_format(text: &str) -> String {
    let literal = c_string(text);
    literal[1..literal.len() - 1].replace('%', "%%")
}

/// C spelling of a float constant that reads back to the same double.
pub(crate) fn c_double(value: f64) -> String {
    let text = format!("{value:?}");
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}

/// C spelling of an integer constant usable in a 64-bit comparison.
pub(crate) fn c_int64(value: i64) -> String {
    format!("{value}LL")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_indents_blocks() {
        let mut w = CodeWriter::new();
        w.open("int main(void)");
        w.line("return 0;");
        w.line("");
        w.label("out");
        w.close();
        assert_eq!(
            w.finish(),
            "int main(void)\n{\n    return 0;\n\nout:\n}\n"
        );
    }

    #[test]
    fn test_attribute_macros_are_guarded() {
        let mut w = CodeWriter::new();
        attribute_macros(&mut w);
        let out = w.finish();
        assert!(out.starts_with("#ifndef SECTION\n#define SECTION(name)\n#endif\n"));
        assert!(out.contains("#ifndef STRING\n#define STRING(...)\n#endif\n"));
        assert_eq!(out.matches("#ifndef").count(), 6);
        assert_eq!(out.matches("#endif").count(), 6);
    }

    #[test]
    fn test_c_string_escapes() {
        assert_eq!(c_string("plain"), "\"plain\"");
        assert_eq!(c_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(c_string("C:\\dir"), "\"C:\\\\dir\"");
        assert_eq!(c_string("??="), "\"\\?\\?=\"");
        assert_eq!(c_string("é"), "\"\\303\\251\"");
        assert_eq!(c_string_from_raw("say \\\"hi\\\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_c_format_doubles_percent() {
        assert_eq!(c_format("100%"), "100%%");
    }

    #[test]
    fn test_c_numbers() {
        assert_eq!(c_double(1.0), "1.0");
        assert_eq!(c_double(0.1), "0.1");
        assert_eq!(c_double(1e300), "1e300");
        assert_eq!(c_double(-f64::MAX), "-1.7976931348623157e308");
        assert_eq!(c_int64(-2147483648), "-2147483648LL");
    }
}
