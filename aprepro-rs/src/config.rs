//! Engine options.
//!
//! [`Options`] is an immutable snapshot handed to the engine at construction.
//! [`Options::set_option`] understands the preprocessor's option strings so
//! that hosts (and the bundled binary) can build the snapshot from text:
//!
//! | Option | Short | Effect |
//! |--------|-------|--------|
//! | `--immutable` | `-X` | variables created by assignment are immutable |
//! | `--errors_fatal` | `-f` | host should fail when errors were reported |
//! | `--errors_and_warnings_fatal` | `-F` | … or when warnings were reported |
//! | `--require_defined` | `-R` | undefined variables are fatal |
//! | `--one_based_index` | `-1` | array indices start at 1 |
//! | `--interactive` | `-i` | include failures are not fatal |
//! | `--keep_history` | `-k` | record substitution history |
//! | `--message` | `-M` | print INFO messages |
//! | `--nowarning` | `-W` | suppress WARNING messages |
//! | `--include=P` | `-I P` | include directory, or a file processed first |
//! | `--comment=C` | `-cC` | comment prefix used by variable listings |
//! | `--dumpvars` | `-D` | dump variables after the run |
//! | `--dumpvars_json` | `-J` | … as JSON |
//! | `--debug` | `-d` | dump variables and trace directives |
//! | `--exit_on` | `-e` | stop at a line reading `exit`/`EXIT`/`Exit` |
//! | `--quiet` | `-q` | no header line |

use std::path::{Path, PathBuf};

/// Option summary printed by `--help`.
pub const OPTION_HELP: &str = "\
  --debug or -d: Dump all variables, trace loops/if/endif
  --dumpvars or -D: Dump all variables at end of run
  --dumpvars_json or -J: Dump all variables at end of run as JSON
  --version or -v: Print version number to stderr
  --immutable or -X: All variables are immutable and cannot be modified
  --errors_fatal or -f: Exit with nonzero status if errors are encountered
  --errors_and_warnings_fatal or -F: Exit with nonzero status if warnings are encountered
  --require_defined or -R: Treat undefined variable warnings as fatal
  --one_based_index or -1: Array indexing is one-based (default zero-based)
  --interactive or -i: Interactive use; include failures are not fatal
  --include=P or -I P: Include path, or a file processed before the input
                       (its variables are immutable)
  --exit_on or -e: End when a line reads exit, EXIT or Exit
  --help or -h: Print this list
  --message or -M: Print INFO messages
  --nowarning or -W: Do not print WARNING messages
  --comment=C or -cC: Comment prefix for variable listings (default $)
  --keep_history or -k: Keep a history of substitutions
  --quiet or -q: Do not print the header line
  var=val: Assign value 'val' to variable 'var'; use var='sval' for a string";

// ── Public API ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown option: {0}")]
    Unknown(String),

    #[error("option {0} requires a value")]
    MissingValue(String),
}

/// What [`Options::set_option`] did with its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionOutcome {
    /// Applied; the number of extra arguments consumed (0 or 1).
    Applied(usize),
    /// `--help` / `-h`: the host should print usage and stop.
    Help,
    /// `--version` / `-v`: the host should print the version and stop.
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub include_path: Option<PathBuf>,
    /// File evaluated (silently, with immutable variables) before the input.
    pub include_file: Option<PathBuf>,
    pub end_on_exit: bool,
    pub errors_fatal: bool,
    pub errors_and_warnings_fatal: bool,
    pub require_defined: bool,
    pub warning_msg: bool,
    pub info_msg: bool,
    pub debugging: bool,
    pub dumpvars: bool,
    pub dumpvars_json: bool,
    pub interactive: bool,
    pub immutable: bool,
    pub one_based_index: bool,
    pub keep_history: bool,
    pub quiet: bool,
    /// Prefix written before each line of a variable listing.
    pub comment: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            include_path: None,
            include_file: None,
            end_on_exit: false,
            errors_fatal: false,
            errors_and_warnings_fatal: false,
            require_defined: false,
            warning_msg: true,
            info_msg: false,
            debugging: false,
            dumpvars: false,
            dumpvars_json: false,
            interactive: false,
            immutable: false,
            one_based_index: false,
            keep_history: false,
            quiet: false,
            comment: "$".to_owned(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one option string.
    ///
    /// Values are taken from `--name=value` when present, otherwise from
    /// `next`; the return value says whether `next` was consumed.
    pub fn set_option(&mut self, option: &str, next: Option<&str>) -> Result<OptionOutcome, ConfigError> {
        let (name, inline) = match option.split_once('=') {
            Some((n, v)) => (n, Some(v)),
            None => (option, None),
        };

        match name {
            "--debug" | "-d" => self.debugging = true,
            "--dumpvars" | "-D" => self.dumpvars = true,
            "--dumpvars_json" | "-J" => self.dumpvars_json = true,
            "--nowarning" | "-W" => self.warning_msg = false,
            "--message" | "-M" => self.info_msg = true,
            "--immutable" | "-X" => self.immutable = true,
            "--errors_fatal" | "-f" => self.errors_fatal = true,
            "--errors_and_warnings_fatal" | "-F" => {
                self.errors_and_warnings_fatal = true;
                self.errors_fatal = true;
            }
            "--require_defined" | "-R" => self.require_defined = true,
            "--interactive" | "-i" => self.interactive = true,
            "--one_based_index" | "-1" => self.one_based_index = true,
            "--exit_on" | "-e" => self.end_on_exit = true,
            "--keep_history" | "-k" => self.keep_history = true,
            "--quiet" | "-q" => self.quiet = true,
            "--version" | "-v" => return Ok(OptionOutcome::Version),
            "--help" | "-h" => return Ok(OptionOutcome::Help),
            "--include" | "-I" => {
                let (value, consumed) = take_value(option, inline, next)?;
                self.set_include(Path::new(value));
                return Ok(OptionOutcome::Applied(consumed));
            }
            "--comment" | "-c" => {
                let (value, consumed) = take_value(option, inline, next)?;
                self.comment = value.to_owned();
                return Ok(OptionOutcome::Applied(consumed));
            }
            // -c# and -I<path> carry their value glued on.
            _ if name.starts_with("-c") && name.len() > 2 => {
                self.comment = name[2..].to_owned();
            }
            _ if name.starts_with("-I") && name.len() > 2 => {
                self.set_include(Path::new(&name[2..]));
            }
            _ => return Err(ConfigError::Unknown(option.to_owned())),
        }
        Ok(OptionOutcome::Applied(0))
    }

    fn set_include(&mut self, value: &Path) {
        if value.is_dir() {
            self.include_path = Some(value.to_path_buf());
        } else {
            self.include_file = Some(value.to_path_buf());
        }
    }
}

fn take_value<'a>(
    option: &str,
    inline: Option<&'a str>,
    next: Option<&'a str>,
) -> Result<(&'a str, usize), ConfigError> {
    match (inline, next) {
        (Some(v), _) => Ok((v, 0)),
        (None, Some(v)) => Ok((v, 1)),
        (None, None) => Err(ConfigError::MissingValue(option.to_owned())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = Options::default();
        assert!(o.warning_msg);
        assert!(!o.info_msg);
        assert!(!o.one_based_index);
        assert_eq!(o.comment, "$");
    }

    #[test]
    fn long_and_short_flags() {
        let mut o = Options::new();
        assert_eq!(o.set_option("--immutable", None), Ok(OptionOutcome::Applied(0)));
        assert_eq!(o.set_option("-1", None), Ok(OptionOutcome::Applied(0)));
        assert_eq!(o.set_option("-W", None), Ok(OptionOutcome::Applied(0)));
        assert!(o.immutable && o.one_based_index && !o.warning_msg);
    }

    #[test]
    fn errors_and_warnings_fatal_implies_errors_fatal() {
        let mut o = Options::new();
        o.set_option("-F", None).unwrap();
        assert!(o.errors_fatal && o.errors_and_warnings_fatal);
    }

    #[test]
    fn comment_value_forms() {
        let mut o = Options::new();
        assert_eq!(o.set_option("--comment=#", None), Ok(OptionOutcome::Applied(0)));
        assert_eq!(o.comment, "#");
        assert_eq!(o.set_option("--comment", Some("//")), Ok(OptionOutcome::Applied(1)));
        assert_eq!(o.comment, "//");
        assert_eq!(o.set_option("-c%", None), Ok(OptionOutcome::Applied(0)));
        assert_eq!(o.comment, "%");
    }

    #[test]
    fn include_directory_vs_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut o = Options::new();
        let d = dir.path().to_str().unwrap().to_owned();
        o.set_option(&format!("--include={d}"), None).unwrap();
        assert_eq!(o.include_path.as_deref(), Some(dir.path()));
        assert_eq!(o.set_option("-I", Some("defs.i")), Ok(OptionOutcome::Applied(1)));
        assert_eq!(o.include_file.as_deref(), Some(Path::new("defs.i")));
    }

    #[test]
    fn missing_value_and_unknown() {
        let mut o = Options::new();
        assert_eq!(
            o.set_option("--include", None),
            Err(ConfigError::MissingValue("--include".into()))
        );
        assert!(matches!(o.set_option("--bogus", None), Err(ConfigError::Unknown(_))));
        assert_eq!(o.set_option("-h", None), Ok(OptionOutcome::Help));
    }
}
