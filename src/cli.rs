//! Command line: generate | defaults | check
use c_ini::diagnostics::Style;
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::tty::IsTty;
use std::path::PathBuf;

/// Generate INI parsers, writers and initializers from annotated C structs
#[derive(Parser, Debug)]
#[command(name = "c-ini", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// when to color diagnostics
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, global = true)]
    pub color: ColorChoice,

    /// log more (-v: info, -vv: debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// emit the C header and source for every SECTION
    Generate(GenerateArgs),
    /// print the INI document every section's defaults produce
    Defaults(InputArgs),
    /// parse INI files against the sections and report the first error
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// annotated C headers (.h) and sources (.c, .cc, .cpp, .cxx); stdin if
    /// omitted
    #[arg(long, short, num_args = 1..)]
    pub input: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// output header (stdout if omitted)
    #[arg(long)]
    pub header: Option<PathBuf>,

    /// output source (stdout if omitted)
    #[arg(long)]
    pub source: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// INI files to check
    #[arg(long, num_args = 1.., required = true)]
    pub ini: Vec<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Decided once at startup and handed to every renderer.
    pub fn style(self) -> Style {
        let colored = match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::io::stderr().is_tty() && std::env::var_os("NO_COLOR").is_none()
            }
        };
        Style::new(colored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_args() {
        let cli = Cli::try_parse_from([
            "c-ini", "generate", "-i", "a.h", "b.c", "--header", "out.h", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Auto);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.inputs.input, [PathBuf::from("a.h"), PathBuf::from("b.c")]);
        assert_eq!(args.header, Some(PathBuf::from("out.h")));
        assert_eq!(args.source, None);
    }

    #[test]
    fn test_check_requires_ini() {
        assert!(Cli::try_parse_from(["c-ini", "check", "-i", "a.h"]).is_err());
    }

    #[test]
    fn test_color_choice() {
        assert!(ColorChoice::Always.style().is_colored());
        assert!(!ColorChoice::Never.style().is_colored());
    }
}
