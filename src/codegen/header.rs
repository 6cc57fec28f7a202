//! Generated header: one forward declaration and six prototypes per section

use super::{CodeWriter, SectionNames};
use crate::schema::Schema;
use crate::source::SourceMap;

pub fn generate(schema: &Schema, sources: &SourceMap) -> String {
    let mut w = CodeWriter::new();
    w.line("/* Generated by c-ini. Do not edit. */");
    w.line("#pragma once");
    w.blank();
    w.line("#include <stdio.h>");
    w.line("#include <stdint.h>");
    w.blank();
    super::attribute_macros(&mut w);
    w.blank();
    w.line("struct c_ini_parser;");

    for section in &schema.sections {
        let names = SectionNames::new(section, sources);
        w.blank();
        prototypes(&mut w, &names);
    }
    w.finish()
}

fn prototypes(w: &mut CodeWriter, names: &SectionNames) {
    let ty = names.ty;
    w.line(format_args!("/* [{}] */", names.section));
    w.line(format_args!("struct {ty};"));
    w.line(format_args!("int {ty}_init(struct {ty}* s);"));
    w.line(format_args!("void {ty}_deinit(struct {ty}* s);"));
    w.line(format_args!(
        "int {ty}_parse(struct {ty}* s, const char* filename, const char* data, int len);"
    ));
    w.line(format_args!("int {ty}_parse_all("));
    w.line("    const char* filename,");
    w.line("    const char* data,");
    w.line("    int len,");
    w.line("    int (*on_section)(struct c_ini_parser* parser, void* user_ptr),");
    w.line("    void* user_ptr);");
    w.line(format_args!(
        "int {ty}_parse_section(struct {ty}* s, struct c_ini_parser* p);"
    ));
    w.line(format_args!("int {ty}_fwrite(const struct {ty}* s, FILE* f);"));
}
