//! Generated source: init, deinit and fwrite per section
//!
//! The parsing half of each section lives in the private `parse` module;
//! this module lays out the file and emits the value-owning functions.
//!
//! `T_init` unwinds on failure. Each dynamic field registers a cleanup once
//! it holds memory, and a failing step jumps to the label that undoes every
//! cleanup registered before it, newest first:
//!
//! ```text
//!     return 0;
//! unwind_2:
//!     str_deinit(s->title);
//! unwind_1:
//!     free(s->path);
//! unwind_0:
//!     return -1;
//! ```

use super::runtime::{self, Features};
use super::{
    c_double, c_string, c_string_from_raw, parse, CodeWriter, GeneratorConfig,
    SectionNames,
};
use crate::schema::{value, Key, Schema, Section, SemanticType, Value};
use crate::source::{SourceMap, Span};
use log::debug;

pub fn generate(
    schema: &Schema,
    sources: &SourceMap,
    config: &GeneratorConfig,
) -> String {
    let mut w = CodeWriter::new();
    w.line("/* Generated by c-ini. Do not edit. */");
    for include in runtime::INCLUDES {
        w.line(include);
    }
    if let Some(header) = &config.header_include {
        w.line(format_args!("#include {}", c_string(header)));
    }
    for include in &config.includes {
        w.line(format_args!("#include {}", c_string(include)));
    }

    if schema.sections.iter().any(|section| section.struct_def.is_some()) {
        w.blank();
        super::attribute_macros(&mut w);
    }
    for def in schema.sections.iter().filter_map(|section| section.struct_def) {
        w.blank();
        w.line(format_args!("{};", sources.text(def)));
    }

    if schema.sections.is_empty() {
        return w.finish();
    }

    w.blank();
    runtime::emit(&mut w, Features::of(schema));

    for section in &schema.sections {
        let names = SectionNames::new(section, sources);
        debug!("emitting [{}] as struct {}", names.section, names.ty);
        list_defaults(&mut w, &names, section, sources);
        init(&mut w, &names, section, sources);
        deinit(&mut w, &names, section, sources);
        fwrite(&mut w, &names, section, sources);
        parse::emit(&mut w, &names, section, sources);
    }
    w.finish()
}

/// Cleanups registered by `T_init`, and which unwind labels were jumped to.
#[derive(Default)]
struct Unwind {
    cleanups: Vec<String>,
    used: Vec<usize>,
}

impl Unwind {
    /// Label undoing every cleanup registered so far.
    fn target(&mut self) -> String {
        let index = self.cleanups.len();
        self.used.push(index);
        format!("unwind_{index}")
    }

    fn push(&mut self, cleanup: String) {
        self.cleanups.push(cleanup);
    }

    fn emit(&self, w: &mut CodeWriter) {
        let Some(&top) = self.used.iter().max() else {
            return;
        };
        for index in (1..=top).rev() {
            if self.used.contains(&index) {
                w.label(format_args!("unwind_{index}"));
            }
            w.line(&self.cleanups[index - 1]);
        }
        if self.used.contains(&0) {
            w.label("unwind_0");
        }
        w.line("return -1;");
    }
}

/// Default arrays for `char**` keys, copied by `string_list_dup`.
fn list_defaults(
    w: &mut CodeWriter,
    names: &SectionNames,
    section: &Section,
    sources: &SourceMap,
) {
    for key in &section.keys {
        if key.ty != SemanticType::DynStrList {
            continue;
        }
        let mut items: Vec<String> = default_list(key)
            .iter()
            .map(|span| c_string_from_raw(sources.text(*span)))
            .collect();
        items.push("NULL".to_string());
        w.blank();
        w.line(format_args!(
            "static const char* const {}__{}_defaults[] = {{ {} }};",
            names.ty,
            sources.text(key.name),
            items.join(", ")
        ));
    }
}

fn init(w: &mut CodeWriter, names: &SectionNames, section: &Section, sources: &SourceMap) {
    let ty = names.ty;
    w.blank();
    w.open(format_args!("int {ty}_init(struct {ty}* s)"));
    w.line("memset(s, 0, sizeof *s);");

    let mut unwind = Unwind::default();
    for key in &section.keys {
        let name = sources.text(key.name);
        let field = format!("s->{name}");
        match key.ty {
            SemanticType::FixedStr { .. } => {
                let default = default_str(key, sources);
                if !default.is_empty() {
                    w.line(format_args!("strcpy({field}, {});", c_string_from_raw(default)));
                }
            }
            SemanticType::DynStr => {
                let default = c_string_from_raw(default_str(key, sources));
                w.line(format_args!("{field} = portable_strdup({default});"));
                goto_if(w, format_args!("{field} == NULL"), unwind.target());
                unwind.push(format!("free({field});"));
            }
            SemanticType::CustomStr(api) => {
                let init = api.init.text(sources);
                goto_if(w, format_args!("{init}(&{field}) != 0"), unwind.target());
                unwind.push(format!("{}({field});", api.deinit.text(sources)));

                let raw = default_str(key, sources);
                if !raw.is_empty() {
                    let set = api.set.text(sources);
                    let len = value::unescape(raw).len();
                    let literal = c_string_from_raw(raw);
                    goto_if(
                        w,
                        format_args!("{set}(&{field}, {literal}, {len}) != 0"),
                        unwind.target(),
                    );
                }
            }
            SemanticType::FixedStrList { .. } => {
                for (slot, span) in default_list(key).iter().enumerate() {
                    let literal = c_string_from_raw(sources.text(*span));
                    w.line(format_args!("strcpy({field}[{slot}], {literal});"));
                }
            }
            SemanticType::DynStrList => {
                w.line(format_args!(
                    "{field} = string_list_dup({ty}__{name}_defaults);"
                ));
                goto_if(w, format_args!("{field} == NULL"), unwind.target());
                unwind.push(format!("free_string_list({field});"));
            }
            SemanticType::CustomStrList(api) => {
                let init = api.function(sources, "init");
                goto_if(w, format_args!("{init}(&{field}) != 0"), unwind.target());
                unwind.push(format!("{}({field});", api.function(sources, "deinit")));

                let add = api.function(sources, "add");
                for span in default_list(key) {
                    let raw = sources.text(*span);
                    let len = value::unescape(raw).len();
                    let literal = c_string_from_raw(raw);
                    goto_if(
                        w,
                        format_args!("{add}(&{field}, {literal}, {len}) != 0"),
                        unwind.target(),
                    );
                }
            }
            SemanticType::Bool => {
                let on = key.attributes.default.as_int().unwrap_or(0) != 0;
                w.line(format_args!("{field} = {};", i32::from(on)));
            }
            SemanticType::Int(_) => {
                let default = key.attributes.default.as_int().unwrap_or(0);
                w.line(format_args!("{field} = {default};"));
            }
            SemanticType::Float => {
                let default = key.attributes.default.as_float().unwrap_or(0.0);
                w.line(format_args!("{field} = {};", c_double(default)));
            }
        }
    }
    w.line("return 0;");
    unwind.emit(w);
    w.close();
}

fn goto_if(w: &mut CodeWriter, condition: std::fmt::Arguments, label: String) {
    w.line(format_args!("if ({condition})"));
    w.line(format_args!("    goto {label};"));
}

fn deinit(w: &mut CodeWriter, names: &SectionNames, section: &Section, sources: &SourceMap) {
    let ty = names.ty;
    w.blank();
    w.open(format_args!("void {ty}_deinit(struct {ty}* s)"));
    let mut owns_memory = false;
    for key in &section.keys {
        let field = format!("s->{}", sources.text(key.name));
        let statement = match key.ty {
            SemanticType::DynStr => format!("free({field});"),
            SemanticType::CustomStr(api) => {
                format!("{}({field});", api.deinit.text(sources))
            }
            SemanticType::DynStrList => format!("free_string_list({field});"),
            SemanticType::CustomStrList(api) => {
                format!("{}({field});", api.function(sources, "deinit"))
            }
            SemanticType::FixedStr { .. }
            | SemanticType::FixedStrList { .. }
            | SemanticType::Bool
            | SemanticType::Int(_)
            | SemanticType::Float => continue,
        };
        owns_memory = true;
        w.line(statement);
    }
    if !owns_memory {
        w.line("(void)s;");
    }
    w.close();
}

fn fwrite(w: &mut CodeWriter, names: &SectionNames, section: &Section, sources: &SourceMap) {
    let ty = names.ty;
    w.blank();
    w.open(format_args!("int {ty}_fwrite(const struct {ty}* s, FILE* f)"));
    if section.keys.iter().any(|key| key.ty.is_string_list()) {
        w.line("int i, n;");
    }
    w.line(format_args!("fputs(\"[{}]\\n\", f);", names.section));
    for key in &section.keys {
        let name = sources.text(key.name);
        let field = format!("s->{name}");
        w.line(format_args!("fputs(\"{name} = \", f);"));
        match key.ty {
            SemanticType::FixedStr { .. } | SemanticType::DynStr => {
                w.line(format_args!("write_cstr(f, {field});"));
            }
            SemanticType::CustomStr(api) => {
                w.line(format_args!(
                    "write_string(f, {}({field}), {}({field}));",
                    api.data.text(sources),
                    api.len.text(sources)
                ));
            }
            SemanticType::FixedStrList { count, .. } => {
                w.line(format_args!("n = {count};"));
                w.line(format_args!("while (n > 0 && {field}[n - 1][0] == '\\0')"));
                w.line("    n--;");
                list_items(w, "i != n", &format!("{field}[i]"));
            }
            SemanticType::DynStrList => {
                list_items(
                    w,
                    &format!("{field} != NULL && {field}[i] != NULL"),
                    &format!("{field}[i]"),
                );
            }
            SemanticType::CustomStrList(api) => {
                list_items(
                    w,
                    &format!("i != {}({field})", api.function(sources, "count")),
                    &format!("{}({field}, i)", api.function(sources, "cstr")),
                );
            }
            SemanticType::Bool => {
                w.line(format_args!("fputs({field} ? \"true\" : \"false\", f);"));
            }
            SemanticType::Int(_) => {
                w.line(format_args!("fprintf(f, \"%lld\", (long long){field});"));
            }
            SemanticType::Float => {
                w.line(format_args!("fprintf(f, \"%.17g\", (double){field});"));
            }
        }
        w.line("putc('\\n', f);");
    }
    w.line("putc('\\n', f);");
    w.line("return ferror(f) ? -1 : 0;");
    w.close();
}

/// `"a", "b", ...` for every index where `condition` holds.
fn list_items(w: &mut CodeWriter, condition: &str, item: &str) {
    w.open(format_args!("for (i = 0; {condition}; ++i)"));
    w.line("if (i > 0)");
    w.line("    fputs(\", \", f);");
    w.line(format_args!("write_cstr(f, {item});"));
    w.close();
}

fn default_str<'a>(key: &Key, sources: &'a SourceMap) -> &'a str {
    key.attributes
        .default
        .as_str()
        .map_or("", |span| sources.text(span))
}

fn default_list(key: &Key) -> &[Span] {
    match &key.attributes.default {
        Value::StrList(items) => items,
        _ => &[],
    }
}
