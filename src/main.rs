// c-ini: INI parser generator for annotated C structs

mod cli;

use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::info;

use c_ini::codegen::{self, GeneratorConfig};
use c_ini::diagnostics::{Renderer, Style};
use c_ini::ini::{parse_all, IniReader, Record};
use c_ini::output::write_if_different;
use c_ini::parser::parse_sources;
use c_ini::schema::Schema;
use c_ini::source::{FileKind, SourceMap};
use cli::{CheckArgs, Cli, Command, GenerateArgs, InputArgs};

/// An error whose diagnostic has already been printed.
#[derive(Debug, thiserror::Error)]
#[error("aborting due to previous error")]
struct Reported;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let style = cli.color.style();

    let result = match &cli.command {
        Command::Generate(args) => generate(args, style),
        Command::Defaults(args) => defaults(args, style),
        Command::Check(args) => check(args, style),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.downcast_ref::<Reported>().is_none() {
                eprintln!("{} {:#}", style.error("error:"), err);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .init();
}

/// Print the diagnostic of `err` if it has one.
fn report(sources: &SourceMap, style: Style, err: c_ini::Error) -> anyhow::Error {
    match err.diagnostic() {
        Some(diagnostic) => {
            Renderer::new(sources, style).emit(&diagnostic);
            Reported.into()
        }
        None => err.into(),
    }
}

/// Inputs in command line order, or stdin as `<stdin>`.
fn load(args: &InputArgs) -> anyhow::Result<SourceMap> {
    if !args.input.is_empty() {
        return Ok(c_ini::load_sources(&args.input)?);
    }
    let mut bytes = Vec::new();
    io::stdin()
        .read_to_end(&mut bytes)
        .context("failed to read stdin")?;
    let mut sources = SourceMap::new();
    sources.add_bytes("<stdin>", bytes);
    Ok(sources)
}

fn load_schema(
    args: &InputArgs,
    style: Style,
) -> anyhow::Result<(SourceMap, Schema)> {
    let sources = load(args)?;
    let schema = parse_sources(&sources)
        .map_err(|err| report(&sources, style, err.into()))?;
    Ok((sources, schema))
}

fn generate(args: &GenerateArgs, style: Style) -> anyhow::Result<()> {
    let (sources, schema) = load_schema(&args.inputs, style)?;

    let source_dir = args.source.as_deref().and_then(Path::parent);
    let config = GeneratorConfig {
        header_include: args
            .header
            .as_deref()
            .map(|header| include_path(header, source_dir)),
        includes: sources
            .files()
            .filter(|(_, file)| file.kind() == FileKind::Header)
            .filter(|(_, file)| file.name() != "<stdin>")
            .map(|(_, file)| include_path(Path::new(file.name()), source_dir))
            .collect(),
    };
    let code = codegen::generate(&schema, &sources, &config);

    emit(args.header.as_deref(), &code.header)?;
    emit(args.source.as_deref(), &code.source)?;
    Ok(())
}

/// `path` as seen from the directory of the generated source, climbing out
/// with `..` where needed. Paths that can't be related (one absolute and one
/// relative, or a directory reached through `..`) are kept as given.
fn include_path(path: &Path, source_dir: Option<&Path>) -> String {
    let Some(dir) = source_dir else {
        return slashes(path);
    };
    let target: Vec<Component> = path
        .components()
        .filter(|part| *part != Component::CurDir)
        .collect();
    let base: Vec<Component> = dir
        .components()
        .filter(|part| *part != Component::CurDir)
        .collect();

    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();
    let unrelated = path.has_root() != dir.has_root()
        || base[common..]
            .iter()
            .any(|part| !matches!(part, Component::Normal(_)));
    if unrelated {
        return slashes(path);
    }

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    relative.extend(&target[common..]);
    slashes(&relative)
}

fn slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn emit(path: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            write_if_different(path, text.as_bytes())?;
        }
        None => io::stdout().write_all(text.as_bytes())?,
    }
    Ok(())
}

fn defaults(args: &InputArgs, style: Style) -> anyhow::Result<()> {
    let (sources, schema) = load_schema(args, style)?;
    let mut out = io::stdout().lock();
    for section in &schema.sections {
        Record::init(section, &sources).write(&mut out)?;
    }
    Ok(())
}

fn check(args: &CheckArgs, style: Style) -> anyhow::Result<()> {
    let (mut sources, schema) = load_schema(&args.inputs, style)?;

    let mut files = Vec::new();
    for path in &args.ini {
        let bytes = fs_err::read(path)?;
        files.push((path.clone(), sources.add_bytes(path.to_string_lossy(), bytes)));
    }

    for (path, id) in files {
        let mut count = 0;
        for section in &schema.sections {
            let mut reader = IniReader::new(&sources, id);
            parse_all(&mut reader, sources.text(section.name), |reader| {
                count += 1;
                Record::init(section, &sources).parse_section(reader)
            })
            .map_err(|err| report(&sources, style, err.into()))?;
        }
        info!("{}: {} sections", path.display(), count);
        println!("{}: ok", path.display());
    }
    Ok(())
}
