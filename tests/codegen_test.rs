// Generated C code and the file pipeline around it

use c_ini::codegen::GeneratorConfig;
use c_ini::diagnostics::{Renderer, Style};
use c_ini::ini::{FieldValue, IniReader, Record};
use c_ini::output::write_if_different;
use c_ini::parser::{parse_sources, ErrorKind};
use c_ini::source::SourceMap;
use std::process::Command;

const SPRITE: &str = r#"
#include <stdbool.h>

SECTION("sprite")
struct sprite {
    char name[32] DEFAULT("player");
    char* texture DEFAULT("player.png");
    char** frames DEFAULT("idle") DEFAULT("walk");
    int x CONSTRAIN(-1000, 1000);
    uint8_t layer DEFAULT(2);
    float scale DEFAULT(1.5) CONSTRAIN(0.25, 8);
    bool visible DEFAULT(true);
    void* user_data IGNORE();
};
"#;

#[test]
fn test_generate_header_and_source() {
    let mut sources = SourceMap::new();
    sources.add("sprite.c", SPRITE);
    let config = GeneratorConfig {
        header_include: Some("sprite.gen.h".to_string()),
        includes: Vec::new(),
    };
    let code = c_ini::generate(&sources, &config).expect("Generation failed");

    for prototype in [
        "int sprite_init(struct sprite* s);",
        "void sprite_deinit(struct sprite* s);",
        "int sprite_parse(struct sprite* s, const char* filename, const char* data, int len);",
        "int sprite_parse_section(struct sprite* s, struct c_ini_parser* p);",
        "int sprite_fwrite(const struct sprite* s, FILE* f);",
    ] {
        assert!(code.header.contains(prototype), "missing {}", prototype);
    }

    let source = &code.source;
    assert!(source.contains("#include \"sprite.gen.h\"\n"));
    assert!(source.contains("struct sprite {\n    char name[32] DEFAULT(\"player\");"));
    assert!(source.contains("static enum token scan_next(struct c_ini_parser* p)"));
    assert!(source.contains("static char** string_list_dup(const char* const* items)"));
    assert!(source.contains("strcpy(s->name, \"player\");"));
    assert!(source.contains("s->layer = 2;"));
    assert!(source.contains("s->scale = 1.5;"));
    assert!(source.contains("if (value < 0.25 || value > 8.0)"));
    assert!(source.contains("p->value.integer_literal < -1000LL"));
    assert!(source.contains("free_string_list(s->frames);"));
    assert!(!source.contains("user_data ="));

    let parsers = source.matches("static int parse_sprite__").count();
    assert_eq!(parsers, 7);
}

#[test]
fn test_pasted_struct_follows_attribute_macros() {
    let mut sources = SourceMap::new();
    sources.add("sprite.c", SPRITE);
    let code = c_ini::generate(&sources, &GeneratorConfig::default())
        .expect("Generation failed");

    let pasted = code
        .source
        .find("struct sprite {")
        .expect("struct definition not pasted");
    for shim in [
        "#define SECTION(name)",
        "#define DEFAULT(value)",
        "#define CONSTRAIN(min, max)",
        "#define IGNORE()",
        "#define STRING(...)",
        "#define STRINGLIST(prefix)",
    ] {
        let at = code.source.find(shim).unwrap_or_else(|| panic!("missing {}", shim));
        assert!(at < pasted, "{} defined after the struct", shim);
    }
}

/// Syntax-check the generated files with the system C compiler, if any.
#[test]
fn test_generated_c_compiles() {
    let has_cc = Command::new("cc")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success());
    if !has_cc {
        eprintln!("cc not found, skipping");
        return;
    }

    let dir = tempfile::tempdir().expect("tempdir failed");
    let mut sources = SourceMap::new();
    sources.add("sprite.c", SPRITE);
    let config = GeneratorConfig {
        header_include: Some("sprite.gen.h".to_string()),
        includes: Vec::new(),
    };
    let code = c_ini::generate(&sources, &config).expect("Generation failed");
    fs_err::write(dir.path().join("sprite.gen.h"), &code.header).expect("write failed");
    let source = dir.path().join("sprite.gen.c");
    fs_err::write(&source, &code.source).expect("write failed");

    let output = Command::new("cc")
        .arg("-fsyntax-only")
        .arg(&source)
        .output()
        .expect("running cc failed");
    assert!(
        output.status.success(),
        "cc rejected the generated source:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_headers_are_included_not_pasted() {
    let mut sources = SourceMap::new();
    sources.add("sprite.h", SPRITE);
    let config = GeneratorConfig {
        header_include: None,
        includes: vec!["sprite.h".to_string()],
    };
    let code = c_ini::generate(&sources, &config).expect("Generation failed");
    assert!(code.source.contains("#include \"sprite.h\"\n"));
    assert!(!code.source.contains("DEFAULT("));
}

#[test]
fn test_parse_error_renders_location() {
    let mut sources = SourceMap::new();
    sources.add(
        "bad.h",
        "SECTION(\"s\")\nstruct s {\n    int8_t level DEFAULT(300);\n};\n",
    );
    let err = parse_sources(&sources).expect_err("Out of range default accepted");
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(err.message, "Value in DEFAULT() must be in range -128 to 127");

    let rendered = Renderer::new(&sources, Style::PLAIN).render(&err.diagnostic());
    assert!(
        rendered.starts_with("bad.h:3:26: error: Value in DEFAULT() must be in range"),
        "{}",
        rendered
    );
    assert!(rendered.contains("int8_t level DEFAULT(300);"));
    assert!(rendered.contains("^~~"));
}

#[test]
fn test_files_in_files_out() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let input = dir.path().join("sprite.h");
    fs_err::write(&input, SPRITE).expect("write failed");

    let sources = c_ini::load_sources(&[&input]).expect("Loading failed");
    let code = c_ini::generate(&sources, &GeneratorConfig::default())
        .expect("Generation failed");

    let header = dir.path().join("sprite.gen.h");
    assert!(write_if_different(&header, code.header.as_bytes()).expect("write failed"));
    assert!(!write_if_different(&header, code.header.as_bytes()).expect("write failed"));
    assert_eq!(fs_err::read_to_string(&header).expect("read failed"), code.header);

    let missing = dir.path().join("missing.h");
    assert!(c_ini::load_sources(&[&missing]).is_err());
}

#[test]
fn test_latin1_comments_are_accepted() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let input = dir.path().join("net.h");
    fs_err::write(
        &input,
        b"/* Copyright \xa9 2024 */\nSECTION(\"net\") struct net { int port DEFAULT(80); };\n",
    )
    .expect("write failed");

    let mut sources = c_ini::load_sources(&[&input]).expect("Loading failed");
    let schema = parse_sources(&sources).expect("Parsing failed");
    assert_eq!(schema.sections.len(), 1);

    let id = sources.add_bytes("net.ini", b"; caf\xe9\n[net]\nport = 8080\n".to_vec());
    let mut record = Record::init(&schema.sections[0], &sources);
    record
        .parse(&mut IniReader::new(&sources, id))
        .expect("INI parsing failed");
    assert_eq!(record.get("port"), Some(&FieldValue::Int(8080)));
}
