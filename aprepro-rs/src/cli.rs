//! Command-line argument parsing.
//!
//! Usage:
//!   aprepro [options] [var=val ...] [infile [outfile]]
//!
//! Options are listed in [`crate::config`].  `var=val` defines a variable
//! before the input is read: a quoted value becomes a string, anything that
//! parses as a number becomes a scalar, and everything else a string.
//! `-` as the input name means standard input.

use std::path::PathBuf;

use crate::config::{OptionOutcome, Options};
use crate::script::Value;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    pub options: Options,
    /// `var=val` definitions in command-line order.
    pub defines: Vec<(String, Value)>,
    /// Input file; `None` reads standard input.
    pub input: Option<PathBuf>,
    /// Output file; `None` writes standard output.
    pub output: Option<PathBuf>,
    /// `--help` was given.
    pub help: bool,
    /// `--version` was given.
    pub version: bool,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends option processing.
        if arg == "--" {
            positional.extend(argv[i + 1..].iter().cloned());
            break;
        }

        if !arg.starts_with('-') || arg == "-" {
            match arg.split_once('=') {
                Some((name, value)) if positional.is_empty() => {
                    args.defines.push((name.to_owned(), define_value(value)));
                }
                _ => positional.push(arg.to_owned()),
            }
            i += 1;
            continue;
        }

        let next = argv.get(i + 1).map(String::as_str);
        match args.options.set_option(arg, next).map_err(|e| e.to_string())? {
            OptionOutcome::Applied(consumed) => i += consumed,
            OptionOutcome::Help => args.help = true,
            OptionOutcome::Version => args.version = true,
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    args.input = positional.next().filter(|p| p != "-").map(PathBuf::from);
    args.output = positional.next().filter(|p| p != "-").map(PathBuf::from);
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument: {extra}"));
    }
    Ok(args)
}

/// Value of a `var=val` definition.
fn define_value(raw: &str) -> Value {
    for q in ['"', '\''] {
        if let Some(inner) = raw.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return Value::Text(inner.to_owned());
        }
    }
    match raw.trim().parse::<f64>() {
        Ok(x) => Value::Scalar(x),
        Err(_) => Value::Text(raw.to_owned()),
    }
}

/// One-paragraph usage text for `--help`.
pub fn usage() -> String {
    format!(
        "Usage: aprepro [options] [var=val ...] [infile [outfile]]\n\
         \n\
         {}\n",
        crate::config::OPTION_HELP
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
