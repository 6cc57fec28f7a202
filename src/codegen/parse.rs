//! Generated parsing functions for one section
//!
//! One `static` parser per key, then the public entry points:
//!
//! ```text
//! T_parse_all   scan for [S], call on_section for each one
//! T_parse       T_parse_all with a callback that stops after the first
//! T_parse_section   key = value lines until any non-key token
//! ```
//!
//! A key parser either assigns the whole value or leaves the field alone.
//! Lists are validated by a counting pass before anything is stored.

use super::{c_double, c_format, c_int64, CodeWriter, SectionNames};
use crate::schema::{Key, Range, Section, SemanticType};
use crate::source::SourceMap;

pub(crate) fn emit(
    w: &mut CodeWriter,
    names: &SectionNames,
    section: &Section,
    sources: &SourceMap,
) {
    for key in &section.keys {
        key_parser(w, names, key, sources);
    }
    parse_section(w, names, section, sources);
    parse(w, names);
    parse_all(w, names);
}

fn key_parser(w: &mut CodeWriter, names: &SectionNames, key: &Key, sources: &SourceMap) {
    let ty = names.ty;
    let name = sources.text(key.name);
    let field = format!("s->{name}");
    w.blank();
    w.open(format_args!(
        "static int parse_{ty}__{name}(struct c_ini_parser* p, struct {ty}* s)"
    ));
    match key.ty {
        SemanticType::FixedStr { len } => {
            expect_string(w, name);
            let max = len.saturating_sub(1);
            w.line(format_args!(
                "if (unescaped_len(p->source, p->value.string) > {max})"
            ));
            w.line(format_args!(
                "    return parser_error(p, \"\\\"{name}\\\" can't be longer than {max} characters\\n\");"
            ));
            w.line(format_args!("unescape_copy({field}, p->source, p->value.string);"));
        }
        SemanticType::DynStr => {
            w.line("char* value;");
            expect_string(w, name);
            w.line("value = unescape_dup(p->source, p->value.string);");
            out_of_memory_if(w, "value == NULL", name);
            w.line(format_args!("free({field});"));
            w.line(format_args!("{field} = value;"));
        }
        SemanticType::CustomStr(api) => {
            w.line("char* value;");
            w.line("int result;");
            expect_string(w, name);
            w.line("value = unescape_dup(p->source, p->value.string);");
            out_of_memory_if(w, "value == NULL", name);
            w.line(format_args!(
                "result = {}(&{field}, value, (int)strlen(value));",
                api.set.text(sources)
            ));
            w.line("free(value);");
            out_of_memory_if(w, "result != 0", name);
        }
        SemanticType::FixedStrList { count, len } => {
            w.line("int head = p->head, count, i;");
            count_items(w, &(len.saturating_sub(1)).to_string());
            w.line(format_args!("if (count > {count})"));
            w.line(format_args!(
                "    return parser_error(p, \"\\\"{name}\\\" holds at most {count} strings\\n\");"
            ));
            w.line("p->head = head;");
            w.line("for (i = 0; i != count; ++i)");
            w.line(format_args!(
                "    unescape_copy({field}[i], p->source, next_list_item(p, i));"
            ));
            w.line(format_args!("for (; i != {count}; ++i)"));
            w.line(format_args!("    {field}[i][0] = '\\0';"));
        }
        SemanticType::DynStrList => {
            w.line("int head = p->head, count, i;");
            w.line("char** list;");
            count_items(w, "-1");
            w.line("list = malloc(sizeof(char*) * (size_t)(count + 1));");
            out_of_memory_if(w, "list == NULL", name);
            w.line("p->head = head;");
            w.open("for (i = 0; i != count; ++i)");
            w.line("list[i] = unescape_dup(p->source, next_list_item(p, i));");
            w.open("if (list[i] == NULL)");
            w.line("free_string_list(list);");
            w.line(format_args!(
                "return parser_error(p, \"Failed to allocate memory for \\\"{name}\\\"\\n\");"
            ));
            w.close();
            w.close();
            w.line("list[count] = NULL;");
            w.line(format_args!("free_string_list({field});"));
            w.line(format_args!("{field} = list;"));
        }
        SemanticType::CustomStrList(api) => {
            w.line("int head = p->head, count, i;");
            count_items(w, "-1");
            w.line("p->head = head;");
            w.line(format_args!("{}({field});", api.function(sources, "clear")));
            w.open("for (i = 0; i != count; ++i)");
            w.line("char* value = unescape_dup(p->source, next_list_item(p, i));");
            w.line("int result;");
            out_of_memory_if(w, "value == NULL", name);
            w.line(format_args!(
                "result = {}(&{field}, value, (int)strlen(value));",
                api.function(sources, "add")
            ));
            w.line("free(value);");
            out_of_memory_if(w, "result != 0", name);
            w.close();
        }
        SemanticType::Bool => {
            w.line("int value;");
            w.line("int result = scan_bool(p, &value);");
            w.line("if (result < 0)");
            w.line("    return -1;");
            w.line("if (result > 0)");
            w.line(format_args!(
                "    return parser_error(p, \"Expected true or false for \\\"{name}\\\"\\n\");"
            ));
            w.line(format_args!("{field} = value;"));
        }
        SemanticType::Int(int) => {
            let (min, max) = match key.attributes.range {
                Some(Range::Int { min, max }) => (min, max),
                _ => int.range(),
            };
            scan_literal(w, "TOK_INTEGER", &format!("an integer literal for \\\"{name}\\\""));
            w.line(format_args!(
                "if (p->value.integer_literal < {} || p->value.integer_literal > {})",
                c_int64(min),
                c_int64(max)
            ));
            w.line(format_args!(
                "    return parser_error(p, \"\\\"{name}\\\" must be in range {}\\n\");",
                c_format(&Range::Int { min, max }.to_string())
            ));
            w.line(format_args!(
                "{field} = ({})p->value.integer_literal;",
                int.c_type()
            ));
        }
        SemanticType::Float => {
            let (min, max) = match key.attributes.range {
                Some(Range::Float { min, max }) => (min, max),
                _ => (-f64::MAX, f64::MAX),
            };
            w.line("double value;");
            w.line("enum token tok = scan_next(p);");
            w.line("if (tok == TOK_ERROR)");
            w.line("    return -1;");
            w.line("if (tok == TOK_FLOAT)");
            w.line("    value = p->value.float_literal;");
            w.line("else if (tok == TOK_INTEGER)");
            w.line("    value = (double)p->value.integer_literal;");
            w.line("else");
            w.line(format_args!(
                "    return parser_error(p, \"Expected a floating point literal for \\\"{name}\\\"\\n\");"
            ));
            w.line(format_args!(
                "if (value < {} || value > {})",
                c_double(min),
                c_double(max)
            ));
            w.line(format_args!(
                "    return parser_error(p, \"\\\"{name}\\\" must be in range {}\\n\");",
                c_format(&Range::Float { min, max }.to_string())
            ));
            w.line(format_args!("{field} = value;"));
        }
    }
    w.line("return 0;");
    w.close();
}

fn expect_string(w: &mut CodeWriter, name: &str) {
    scan_literal(w, "TOK_STRING", &format!("a string literal for \\\"{name}\\\""));
}

/// Scan one token, failing unless it is `token`.
fn scan_literal(w: &mut CodeWriter, token: &str, what: &str) {
    w.line("enum token tok = scan_next(p);");
    w.line("if (tok == TOK_ERROR)");
    w.line("    return -1;");
    w.line(format_args!("if (tok != {token})"));
    w.line(format_args!("    return parser_error(p, \"Expected {what}\\n\");"));
}

fn count_items(w: &mut CodeWriter, max_len: &str) {
    w.line(format_args!("if (count_string_list(p, {max_len}, &count) != 0)"));
    w.line("    return -1;");
}

fn out_of_memory_if(w: &mut CodeWriter, condition: &str, name: &str) {
    w.line(format_args!("if ({condition})"));
    w.line(format_args!(
        "    return parser_error(p, \"Failed to allocate memory for \\\"{name}\\\"\\n\");"
    ));
}

fn parse_section(
    w: &mut CodeWriter,
    names: &SectionNames,
    section: &Section,
    sources: &SourceMap,
) {
    let ty = names.ty;
    w.blank();
    w.open(format_args!(
        "int {ty}_parse_section(struct {ty}* s, struct c_ini_parser* p)"
    ));
    if section.keys.is_empty() {
        w.line("(void)s;");
    }
    w.open("while (1)");
    w.line("enum token tok = scan_next(p);");
    w.line("if (tok != TOK_KEY)");
    w.line("    return tok;");
    for (index, key) in section.keys.iter().enumerate() {
        let name = sources.text(key.name);
        let keyword = if index == 0 { "if" } else { "else if" };
        w.line(format_args!(
            "{keyword} (str_view_equal(p->source, p->value.string, \"{name}\"))"
        ));
        w.line("{");
        w.line(format_args!(
            "    if (expect_equals(p) != 0 || parse_{ty}__{name}(p, s) != 0)"
        ));
        w.line("        return TOK_ERROR;");
        w.line("}");
    }
    if !section.keys.is_empty() {
        w.line("else");
    }
    w.line(format_args!(
        "{}return parser_error(p, \"Unknown key \\\"%.*s\\\" in section \\\"{}\\\"\\n\",",
        if section.keys.is_empty() { "" } else { "    " },
        names.section
    ));
    w.line(format_args!(
        "{}    p->value.string.len, p->source + p->value.string.off);",
        if section.keys.is_empty() { "" } else { "    " }
    ));
    w.close();
    w.close();
}

fn parse(w: &mut CodeWriter, names: &SectionNames) {
    let ty = names.ty;
    w.blank();
    w.open(format_args!(
        "static int {ty}_on_section(struct c_ini_parser* p, void* user_ptr)"
    ));
    w.line(format_args!("int tok = {ty}_parse_section(user_ptr, p);"));
    w.line("return tok == TOK_ERROR ? TOK_ERROR : TOK_END;");
    w.close();

    w.blank();
    w.open(format_args!(
        "int {ty}_parse(struct {ty}* s, const char* filename, const char* data, int len)"
    ));
    w.line(format_args!(
        "return {ty}_parse_all(filename, data, len, {ty}_on_section, s);"
    ));
    w.close();
}

fn parse_all(w: &mut CodeWriter, names: &SectionNames) {
    let ty = names.ty;
    let section = names.section;
    w.blank();
    w.line(format_args!("int {ty}_parse_all("));
    w.line("    const char* filename,");
    w.line("    const char* data,");
    w.line("    int len,");
    w.line("    int (*on_section)(struct c_ini_parser* parser, void* user_ptr),");
    w.line("    void* user_ptr)");
    w.line("{");
    w.raw(&format!(
        r#"    struct c_ini_parser p;
    int tok;
    parser_init(&p, filename, data, len);
    tok = scan_next(&p);
    while (1)
    {{
        if (tok == TOK_ERROR)
            return -1;
        if (tok == TOK_END)
            return 0;
        if (tok != TOK_LBRACKET)
        {{
            tok = scan_next(&p);
            continue;
        }}
        tok = scan_next(&p);
        if (tok == TOK_ERROR)
            return -1;
        if (tok != TOK_KEY)
            return parser_error(&p, "Expected a section name within the brackets. Example: [mysection]\n");
        if (!str_view_equal(data, p.value.string, "{section}"))
        {{
            tok = scan_next(&p);
            continue;
        }}
        tok = scan_next(&p);
        if (tok == TOK_ERROR)
            return -1;
        if (tok != TOK_RBRACKET)
            return parser_error(&p, "Missing closing bracket \"]\"\n");
        tok = on_section(&p, user_ptr);
    }}
}}
"#
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_sources;

    fn emit_for(body: &str) -> String {
        let mut sources = SourceMap::new();
        sources.add("cfg.h", format!("SECTION(\"sprite\") struct sprite {{ {body} }};"));
        let schema = parse_sources(&sources).unwrap();
        let section = &schema.sections[0];
        let mut w = CodeWriter::new();
        emit(&mut w, &SectionNames::new(section, &sources), section, &sources);
        w.finish()
    }

    #[test]
    fn test_int_parser_checks_range() {
        let out = emit_for("int8_t x CONSTRAIN(-5, 5);");
        assert!(out.contains(
            "static int parse_sprite__x(struct c_ini_parser* p, struct sprite* s)"
        ));
        assert!(out.contains(
            "if (p->value.integer_literal < -5LL || p->value.integer_literal > 5LL)"
        ));
        assert!(out.contains("\"\\\"x\\\" must be in range -5 to 5\\n\""));
        assert!(out.contains("s->x = (int8_t)p->value.integer_literal;"));
    }

    #[test]
    fn test_bitfield_uses_storage_type() {
        let out = emit_for("unsigned flags : 9;");
        assert!(out.contains("p->value.integer_literal > 511LL"));
        assert!(out.contains("s->flags = (uint16_t)p->value.integer_literal;"));
    }

    #[test]
    fn test_fixed_list_pads_after_assignment() {
        let out = emit_for("char names[4][16];");
        assert!(out.contains("if (count_string_list(p, 15, &count) != 0)"));
        assert!(out.contains("if (count > 4)"));
        assert!(out.contains("for (; i != 4; ++i)\n        s->names[i][0] = '\\0';"));
    }

    #[test]
    fn test_section_dispatch() {
        let out = emit_for("int a; float b;");
        assert!(out.contains(
            "        if (str_view_equal(p->source, p->value.string, \"a\"))\n"
        ));
        assert!(out.contains(
            "        else if (str_view_equal(p->source, p->value.string, \"b\"))\n"
        ));
        assert!(out.contains(
            "            if (expect_equals(p) != 0 || parse_sprite__b(p, s) != 0)\n"
        ));
        assert!(out.contains("Unknown key \\\"%.*s\\\" in section \\\"sprite\\\""));
    }

    #[test]
    fn test_parse_stops_after_first_section() {
        let out = emit_for("int a;");
        assert!(out.contains("return tok == TOK_ERROR ? TOK_ERROR : TOK_END;"));
        assert!(out.contains(
            "return sprite_parse_all(filename, data, len, sprite_on_section, s);"
        ));
        assert!(out.contains("if (!str_view_equal(data, p.value.string, \"sprite\"))"));
    }

    #[test]
    fn test_empty_section_rejects_every_key() {
        let out = emit_for("");
        assert!(out.contains("        return parser_error(p, \"Unknown key"));
        assert!(out.contains("    (void)s;\n    while (1)\n"));
    }
}
