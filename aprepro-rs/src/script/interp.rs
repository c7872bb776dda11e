//! The preprocessing engine.
//!
//! An [`Engine`] owns everything one preprocessing session needs: the symbol
//! table, the array registry, the position stack, diagnostics and the output
//! buffer.  Symbols and arrays persist across `evaluate_*` calls, so a host
//! can define variables, evaluate several inputs, and inspect the results.
//!
//! ```rust
//! use aprepro::{Engine, Options};
//!
//! let mut engine = Engine::new(Options::default());
//! engine.add_variable("width", 6.0, false, false);
//! engine.evaluate_string("area = {width * 7}\n", "example").unwrap();
//! assert_eq!(engine.output(), "area = 42\n");
//! ```

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use super::builtins;
use super::eval::{fetch, own};
use super::scan;
use super::value::Value;
use crate::array::{Array, ArrayHandle, ArrayRegistry};
use crate::config::Options;
use crate::diag::{Diagnostics, Sink};
use crate::error::{Category, EvalError, SymbolError};
use crate::format::{format_number, DEFAULT_FORMAT};
use crate::history::{HistoryEntry, SubstitutionHistory};
use crate::position::PositionStack;
use crate::symbol::{Builtin, Symbol, SymbolKind, SymbolTable};

/// Pseudo-source name for [`Engine::evaluate_interactive`].
pub const INTERACTIVE_SOURCE: &str = "interactive_input";

/// Includes nested deeper than this abort the stream.
const MAX_INCLUDE_DEPTH: usize = 64;

const DEFAULT_SEED: u64 = 0x853C_49E6_748F_EA9B;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap_or_else(|e| panic!("identifier regex: {e}"))
});

// ── Engine ────────────────────────────────────────────────────────────────────

pub struct Engine {
    pub(crate) arrays: ArrayRegistry,
    pub(crate) symbols: SymbolTable,
    pub(crate) history: SubstitutionHistory,
    pub(crate) options: Options,
    pub(crate) position: PositionStack,
    pub(crate) diag: Diagnostics,
    /// Substituted text produced so far.
    pub(crate) output: String,
    /// Bytes ever emitted; unaffected by `take_output`.
    emitted: usize,
    /// Cleared by `{ECHO(OFF)}`.
    pub(crate) echo: bool,
    /// Variables created by assignment are immutable while set.
    pub(crate) state_immutable: bool,
    pub(crate) in_interactive: bool,
    rng: StdRng,
    include_file_done: bool,
    interactive_line: usize,
}

impl Engine {
    /// A fresh engine with the function library and predefined constants
    /// registered.
    pub fn new(options: Options) -> Self {
        let mut symbols = SymbolTable::new();
        if let Err(e) = builtins::register(&mut symbols) {
            tracing::error!(error = %e, "function library registration failed");
        }
        if let Err(e) = builtins::define_constants(&mut symbols, &options.comment) {
            tracing::error!(error = %e, "constant registration failed");
        }
        tracing::debug!(symbols = symbols.len(), "engine created");

        Engine {
            arrays: ArrayRegistry::new(),
            symbols,
            history: SubstitutionHistory::new(options.keep_history),
            diag: Diagnostics::new(&options),
            position: PositionStack::new(),
            output: String::new(),
            emitted: 0,
            echo: true,
            state_immutable: options.immutable,
            in_interactive: false,
            rng: StdRng::seed_from_u64(DEFAULT_SEED),
            include_file_done: false,
            interactive_line: 1,
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Header line written at the top of the binary's output.
    pub fn long_version(&self) -> String {
        format!("{} Algebraic Preprocessor (Aprepro) version {}", self.comment(), builtins::VERSION)
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    /// Read `input` to the end and evaluate it under `source_name`.
    pub fn evaluate_stream<R: Read>(&mut self, mut input: R, source_name: &str) -> Result<(), EvalError> {
        let mut text = String::new();
        input.read_to_string(&mut text).map_err(|source| EvalError::Read {
            name: source_name.to_owned(),
            source,
        })?;
        self.evaluate_string(&text, source_name)
    }

    /// Open `path` and evaluate it under its own name.
    pub fn evaluate_file(&mut self, path: impl AsRef<Path>) -> Result<(), EvalError> {
        let path = path.as_ref();
        let name = path.to_string_lossy();
        let file = fs::File::open(path).map_err(|source| EvalError::Read {
            name: name.to_string(),
            source,
        })?;
        self.evaluate_stream(io::BufReader::new(file), &name)
    }

    /// Evaluate `lines` as one source, each followed by a newline.
    pub fn evaluate_lines<S: AsRef<str>>(&mut self, lines: &[S], source_name: &str) -> Result<(), EvalError> {
        let mut text = String::new();
        for line in lines {
            text.push_str(line.as_ref());
            text.push('\n');
        }
        self.evaluate_string(&text, source_name)
    }

    /// Evaluate an in-memory buffer under a pseudo-source name.
    pub fn evaluate_string(&mut self, text: &str, source_name: &str) -> Result<(), EvalError> {
        self.process_include_file()?;
        self.evaluate_source(text, source_name)
    }

    /// Evaluate one line typed by a user.  Line numbers continue across calls
    /// and a missing include file is reported without failing.
    pub fn evaluate_interactive(&mut self, line: &str) -> Result<(), EvalError> {
        self.process_include_file()?;
        if !self.position.is_empty() {
            return scan::scan(self, line);
        }

        let start = self.interactive_line;
        self.in_interactive = true;
        self.position.push_at(INTERACTIVE_SOURCE, start);
        let result = scan::scan(self, line);
        let end = self.position.pop().map_or(start, |p| p.line);
        if result.is_err() {
            self.sweep_temporaries();
        }
        self.in_interactive = false;
        self.interactive_line = if line.ends_with('\n') { end } else { end + 1 };
        self.diag.flush();
        result
    }

    /// Push `source_name`, scan `text`, pop.  The stack stays balanced on
    /// failure.
    fn evaluate_source(&mut self, text: &str, source_name: &str) -> Result<(), EvalError> {
        if self.position.depth() >= MAX_INCLUDE_DEPTH {
            let e = EvalError::MalformedExpression(format!(
                "include nesting deeper than {MAX_INCLUDE_DEPTH} at '{source_name}'"
            ));
            self.error(e.to_string());
            return Err(e);
        }
        self.position.push(source_name);
        let result = scan::scan(self, text);
        self.position.pop();
        if result.is_err() {
            self.sweep_temporaries();
        }
        self.diag.flush();
        result
    }

    /// Evaluate `Options::include_file` once, before the first input.  Its
    /// variables are immutable and it produces no output.
    fn process_include_file(&mut self) -> Result<(), EvalError> {
        if self.include_file_done {
            return Ok(());
        }
        self.include_file_done = true;
        let Some(path) = self.options.include_file.clone() else {
            return Ok(());
        };

        tracing::debug!(path = %path.display(), "processing include file");
        let saved = (self.state_immutable, self.echo);
        self.state_immutable = true;
        self.echo = false;
        let result = self.include(&path.to_string_lossy(), true);
        (self.state_immutable, self.echo) = saved;
        result
    }

    /// `{include(file)}` / `{cinclude(file)}`.
    pub(crate) fn include(&mut self, file: &str, required: bool) -> Result<(), EvalError> {
        let text = match self.read_include(file) {
            Ok(text) => text,
            Err(_) if !required => {
                tracing::debug!(file, "conditional include skipped");
                return Ok(());
            }
            Err(source) => {
                self.error(format!("Can't open '{file}': {source}"));
                if self.options.interactive || self.in_interactive {
                    return Ok(());
                }
                return Err(EvalError::IncludeOpenFailure {
                    file: file.to_owned(),
                    source,
                });
            }
        };
        tracing::debug!(file, bytes = text.len(), "include");
        self.info(format!("Included File: '{file}'"));
        let result = self.evaluate_source(&text, file);
        if result.is_ok() {
            self.info(format!("Finished including '{file}'"));
        }
        result
    }

    fn read_include(&self, file: &str) -> io::Result<String> {
        match fs::read_to_string(file) {
            Ok(text) => Ok(text),
            Err(e) => match &self.options.include_path {
                Some(dir) if Path::new(file).is_relative() => fs::read_to_string(dir.join(file)),
                _ => Err(e),
            },
        }
    }

    // ── Variables ─────────────────────────────────────────────────────────────

    /// Define or update a variable from the host side.
    ///
    /// An invalid name or a name already bound to a function is reported as
    /// a warning and leaves the table untouched.
    pub fn add_variable(&mut self, name: &str, value: impl Into<Value>, immutable: bool, internal: bool) {
        if !self.check_variable_name(name) {
            return;
        }
        match own(self, value.into()) {
            Ok(stored) => self.bind(name, stored, immutable, internal),
            Err(e) => self.warning(e.to_string()),
        }
    }

    /// Define or update an array variable, taking ownership of `array`.
    pub fn add_array_variable(&mut self, name: &str, array: Array, internal: bool) {
        if !self.check_variable_name(name) {
            return;
        }
        let h = self.arrays.insert(array);
        self.bind(name, Value::Array(h), false, internal);
    }

    fn check_variable_name(&mut self, name: &str) -> bool {
        if !IDENTIFIER_RE.is_match(name) {
            self.warning(EvalError::InvalidIdentifier(name.to_owned()).to_string());
            return false;
        }
        if self.symbols.get(name).is_some_and(|s| s.kind.is_function()) {
            self.warning(format!("'{name}' is a function and cannot be redefined as a variable."));
            return false;
        }
        true
    }

    /// Store an already-owned value under `name`.
    fn bind(&mut self, name: &str, stored: Value, immutable: bool, internal: bool) {
        let kind = SymbolKind::variable_for(stored.category(), immutable);
        let old = match self.symbols.get_mut(name) {
            Some(sym) => {
                sym.is_internal = internal;
                Some(std::mem::replace(&mut sym.value, stored))
            }
            None => {
                match self.symbols.put(name, kind, internal) {
                    Ok(sym) => sym.value = stored,
                    Err(e) => self.warning(e.to_string()),
                }
                None
            }
        };
        if old.is_some() {
            if let Err(e) = self.symbols.rename_type(name, kind) {
                self.warning(e.to_string());
            }
        }
        if let Some(Value::Array(h)) = old {
            self.arrays.redefine_array(h);
        }
        tracing::trace!(name, %kind, "host variable bound");
    }

    /// Delete a user variable.  Functions, internal symbols and unknown
    /// names are reported as warnings and left alone.
    pub fn remove_variable(&mut self, name: &str) {
        match self.symbols.get(name) {
            None => self.warning(format!("Variable '{name}' not defined.")),
            Some(s) if !s.kind.is_removable() || s.is_internal => {
                let kind = s.kind;
                self.warning(format!("Cannot remove {kind} '{name}'."));
            }
            Some(_) => {
                if let Err(e) = self.symbols.erase(name, &mut self.arrays) {
                    self.warning(e.to_string());
                }
            }
        }
    }

    pub fn get_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Contents of the array behind `handle`, if it is still live.
    pub fn array(&self, handle: ArrayHandle) -> Option<&Array> {
        self.arrays.get(handle)
    }

    /// Sorted names of scalar, string and array variables whose internal
    /// flag equals `internal`.
    pub fn variable_names(&self, internal: bool) -> Vec<String> {
        let mut names: Vec<String> = self
            .symbols
            .iter()
            .filter(|s| s.kind.is_listed_variable() && s.is_internal == internal)
            .map(|s| s.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Register a host function returning `returns`.  Registering the same
    /// name again with the same return category replaces the body and docs.
    pub fn define_function(
        &mut self,
        name: &str,
        returns: Category,
        func: Builtin,
        syntax: &str,
        info: &str,
    ) -> Result<(), SymbolError> {
        if self.symbols.get(name).is_some_and(|s| !s.kind.is_function()) {
            return Err(SymbolError::DuplicateDefinition(name.to_owned()));
        }
        self.symbols
            .define_function(name, SymbolKind::function_for(returns), func, syntax, info)?;
        Ok(())
    }

    // ── Listings ──────────────────────────────────────────────────────────────

    fn comment(&self) -> String {
        match self.symbols.get("_C_").map(|s| &s.value) {
            Some(Value::Text(c)) => c.clone(),
            _ => self.options.comment.clone(),
        }
    }

    /// `{name = value}` listing of the variables whose name starts with
    /// `prefix` and whose internal flag equals `internal`.
    pub fn dump_variables(&self, prefix: &str, internal: bool) -> String {
        let c = self.comment();
        let mut syms: Vec<&Symbol> = self
            .symbols
            .iter()
            .filter(|s| s.kind.is_listed_variable() && s.is_internal == internal && s.name.starts_with(prefix))
            .collect();
        syms.sort_by(|a, b| a.name.cmp(&b.name));

        let mut out = format!("\n{c}   Variable    = Value\n");
        for s in syms {
            let marker = if s.kind.is_immutable() { "\t(immutable)" } else { "" };
            let _ = match &s.value {
                Value::Scalar(x) => writeln!(out, "{c}  {{{:<10}\t= {}}}{marker}", s.name, format_number(*x, "%.10g")),
                Value::Text(t) => writeln!(out, "{c}  {{{:<10}\t= \"{}\"}}{marker}", s.name, t),
                Value::Array(h) => match self.arrays.get(*h) {
                    Some(a) => writeln!(out, "{c}  {{{:<10}\t (array) rows = {}, cols = {}}}", s.name, a.rows, a.cols),
                    None => Ok(()),
                },
            };
        }
        out
    }

    /// Function listing grouped by return category.
    pub fn dump_functions(&self) -> String {
        let c = self.comment();
        let mut out = String::new();
        for (kind, title) in [
            (SymbolKind::Function, "Functions returning double"),
            (SymbolKind::StringFunction, "Functions returning string"),
            (SymbolKind::ArrayFunction, "Functions returning array"),
        ] {
            let mut funcs: Vec<&Symbol> = self.symbols.iter().filter(|s| s.kind == kind).collect();
            if funcs.is_empty() {
                continue;
            }
            funcs.sort_by(|a, b| a.name.cmp(&b.name));
            let width = funcs.iter().map(|s| s.syntax.len()).max().unwrap_or(0);
            let _ = writeln!(out, "\n{c}   {title}:");
            for s in funcs {
                let _ = writeln!(out, "{c}  {:<width$}:  {}", s.syntax, s.info);
            }
        }
        out
    }

    /// Non-internal scalars, strings and undefined placeholders as a JSON
    /// object with sorted keys.  Arrays are left out.
    pub fn dump_variables_json(&self) -> String {
        let mut map = serde_json::Map::new();
        for s in self.symbols.iter().filter(|s| !s.is_internal) {
            let value = match (&s.value, s.kind) {
                (_, SymbolKind::UndefinedVariable) => serde_json::Value::Null,
                (_, k) if k.is_function() => continue,
                (Value::Scalar(x), _) => serde_json::Number::from_f64(*x)
                    .map_or(serde_json::Value::Null, serde_json::Value::Number),
                (Value::Text(t), _) => serde_json::Value::String(t.clone()),
                (Value::Array(_), _) => continue,
            };
            map.insert(s.name.clone(), value);
        }
        format!("{:#}", serde_json::Value::Object(map))
    }

    // ── Output & history ──────────────────────────────────────────────────────

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.snapshot()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn set_history_enabled(&mut self, enabled: bool) {
        self.history.set_enabled(enabled);
    }

    // ── Diagnostics ───────────────────────────────────────────────────────────

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    /// Attach writers for errors/warnings and for info/listings.
    pub fn set_diagnostic_sinks(&mut self, errors: Option<Sink>, info: Option<Sink>) {
        self.diag.set_sinks(errors, info);
    }

    /// Cap how many diagnostics stay in memory.
    pub fn set_message_retention(&mut self, limit: usize) {
        self.diag.set_retain_limit(limit);
    }

    pub fn error_count(&self) -> usize {
        self.diag.error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.diag.warning_count()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn arrays(&self) -> &ArrayRegistry {
        &self.arrays
    }

    pub fn position(&self) -> &PositionStack {
        &self.position
    }

    pub(crate) fn error(&mut self, msg: impl Into<String>) {
        self.diag.report_error(msg, self.position.current());
    }

    pub(crate) fn warning(&mut self, msg: impl Into<String>) {
        self.diag.report_warning(msg, self.position.current());
    }

    /// INFO line, shown only under `--message`.
    pub(crate) fn info(&mut self, msg: impl Into<String>) {
        self.diag.report_info(msg, self.position.current());
    }

    pub(crate) fn write_info(&mut self, text: &str) {
        self.diag.write_info(text);
    }

    /// `--debug` trace line for a directive.
    pub(crate) fn trace(&mut self, what: &str) {
        let line = match self.position.current() {
            Some(p) => format!("{} DEBUG: {what} ({}, line {})\n", self.comment(), p.source_name, p.line),
            None => format!("{} DEBUG: {what}\n", self.comment()),
        };
        self.diag.write_info(&line);
    }

    // ── Internals used by the scanner and builtins ────────────────────────────

    /// Text a value substitutes as.
    pub(crate) fn render(&self, value: &Value) -> String {
        match value {
            Value::Scalar(x) => format_number(*x, &self.number_format()),
            Value::Text(s) => s.clone(),
            Value::Array(h) => match fetch(self, *h) {
                Ok(a) => self.render_array(a),
                Err(_) => String::new(),
            },
        }
    }

    fn number_format(&self) -> String {
        match self.symbols.get("_FORMAT").map(|s| &s.value) {
            Some(Value::Text(f)) => f.clone(),
            _ => DEFAULT_FORMAT.to_owned(),
        }
    }

    fn render_array(&self, a: &Array) -> String {
        let spec = self.number_format();
        let mut out = String::new();
        if a.cols == 0 {
            return out;
        }
        for row in a.data.chunks(a.cols) {
            let cells: Vec<String> = row.iter().map(|x| format_number(*x, &spec)).collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
        out
    }

    pub(crate) fn emit(&mut self, text: &str) {
        if self.echo {
            self.output.push_str(text);
            self.emitted += text.len();
        }
    }

    /// Write position of the output sink, counted from the first byte ever
    /// emitted.
    pub(crate) fn emitted_bytes(&self) -> usize {
        self.emitted
    }

    /// Release arrays created during the last expression that no symbol
    /// took ownership of.
    pub(crate) fn sweep_temporaries(&mut self) {
        let owned = self.symbols.owned_arrays();
        let swept = self.arrays.sweep(&owned);
        if swept > 0 {
            tracing::trace!(swept, "temporary arrays released");
        }
    }

    /// Uniform in `[0, 1)`.
    pub(crate) fn next_random(&mut self) -> f64 {
        self.rng.gen()
    }

    pub(crate) fn seed_random(&mut self, seed: f64) {
        self.rng = StdRng::seed_from_u64(seed as i64 as u64);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.position.clear();
        self.arrays.clear();
        self.symbols.clear();
        self.history.clear();
        self.diag.flush();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
