//! Text scanner.
//!
//! Splits input into literal text, which is copied to the output unchanged,
//! and `{…}` regions, which are evaluated and replaced by their result:
//!
//! | Sequence | Meaning |
//! |----------|---------|
//! | `{expr}` | evaluate `expr`, substitute the formatted result |
//! | `\{` / `\}` | literal brace |
//! | `{include(file)}` | evaluate `file` in place (`cinclude`: skip if missing) |
//! | `{Ifdef(name)}` / `{Ifndef(name)}` | open a block kept when `name` is (not) defined and nonzero |
//! | `{If(expr)}` / `{Elseif(expr)}` / `{Else}` / `{Endif}` | conditional blocks |
//! | `{Loop(n)}` … `{EndLoop}` | repeat the enclosed text `n` times |
//! | `{ECHO(OFF)}` / `{ECHO(ON)}` / `{NOECHO}` / `{ECHO}` | suppress or restore output |
//!
//! Directive keywords are case-insensitive.  A directive alone on its line
//! consumes the whole line, newline included.

use std::sync::LazyLock;

use regex::Regex;

use super::eval::eval;
use super::expr::parse_expr;
use super::interp::Engine;
use super::value::Value;
use crate::error::EvalError;
use crate::symbol::SymbolKind;

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*(ifdef|ifndef|if|elseif|else|endif|loop|endloop|echo|noecho|include|cinclude)\s*(?:\((.*)\))?\s*$",
    )
    .unwrap_or_else(|e| panic!("directive regex: {e}"))
});

// ── Directives ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive<'a> {
    Ifdef(&'a str),
    Ifndef(&'a str),
    If(&'a str),
    Elseif(&'a str),
    Else,
    Endif,
    Loop(&'a str),
    EndLoop,
    Echo(bool),
    Include { file: &'a str, required: bool },
}

impl Directive<'_> {
    fn is_conditional(self) -> bool {
        matches!(
            self,
            Directive::Ifdef(_)
                | Directive::Ifndef(_)
                | Directive::If(_)
                | Directive::Elseif(_)
                | Directive::Else
                | Directive::Endif
        )
    }
}

/// Recognise the inside of a `{…}` region as a directive.
fn directive(inner: &str) -> Option<Directive<'_>> {
    let caps = DIRECTIVE_RE.captures(inner)?;
    let keyword = caps.get(1)?.as_str().to_ascii_lowercase();
    let arg = caps.get(2).map(|m| m.as_str());
    let bare = arg.is_none_or(|a| a.trim().is_empty());
    Some(match (keyword.as_str(), arg) {
        ("ifdef", Some(a)) => Directive::Ifdef(a.trim()),
        ("ifndef", Some(a)) => Directive::Ifndef(a.trim()),
        ("if", Some(a)) => Directive::If(a),
        ("elseif", Some(a)) => Directive::Elseif(a),
        ("loop", Some(a)) => Directive::Loop(a),
        ("include", Some(a)) => Directive::Include { file: a.trim(), required: true },
        ("cinclude", Some(a)) => Directive::Include { file: a.trim(), required: false },
        ("else", _) if bare => Directive::Else,
        ("endif", _) if bare => Directive::Endif,
        ("endloop", _) if bare => Directive::EndLoop,
        ("noecho", _) if bare => Directive::Echo(false),
        ("echo", None) => Directive::Echo(true),
        ("echo", Some(a)) => match a.trim().to_ascii_uppercase().as_str() {
            "ON" | "" => Directive::Echo(true),
            "OFF" => Directive::Echo(false),
            _ => return None,
        },
        _ => return None,
    })
}

/// Strip one pair of matching quotes.
fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

// ── Region matching ───────────────────────────────────────────────────────────

/// Byte index of the `}` closing the region opened at `open`.  Braces
/// inside quoted strings do not count.
fn find_close(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = open + 1;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'}' => return Some(i),
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// `true` when only blanks separate `at` from the end of its line.
fn rest_of_line_blank(src: &str, at: usize) -> bool {
    let rest = &src[at..];
    let line = rest.find('\n').map_or(rest, |i| &rest[..i]);
    line.trim().is_empty()
}

// ── Scanner ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Cond {
    parent_active: bool,
    /// Some branch of this block has already been taken.
    taken: bool,
    active: bool,
}

struct Scanner<'s> {
    src: &'s str,
    pos: usize,
    conds: Vec<Cond>,
    /// Leading blanks of the current line, held back until the line turns
    /// out not to be a lone directive.
    pending: String,
    line_has_content: bool,
    at_line_start: bool,
}

/// Scan `src` to completion, writing substitutions to the engine's output.
///
/// The caller owns the position entry for `src`.
pub(crate) fn scan(engine: &mut Engine, src: &str) -> Result<(), EvalError> {
    Scanner::new(src).run(engine)
}

impl<'s> Scanner<'s> {
    fn new(src: &'s str) -> Self {
        Scanner {
            src,
            pos: 0,
            conds: Vec::new(),
            pending: String::new(),
            line_has_content: false,
            at_line_start: true,
        }
    }

    fn active(&self) -> bool {
        self.conds.last().is_none_or(|c| c.active)
    }

    fn run(&mut self, engine: &mut Engine) -> Result<(), EvalError> {
        let src = self.src;
        while self.pos < src.len() {
            if self.at_line_start && engine.options.end_on_exit && self.active() && self.exit_line() {
                tracing::debug!("exit line reached");
                self.pos = src.len();
                break;
            }
            self.at_line_start = false;

            let next = src[self.pos..]
                .find(['{', '\\', '\n'])
                .map_or(src.len(), |i| self.pos + i);
            self.literal(engine, &src[self.pos..next]);
            self.pos = next;

            match src.as_bytes().get(self.pos) {
                None => break,
                Some(b'\n') => {
                    self.pos += 1;
                    self.end_line(engine);
                }
                Some(b'\\') => match src.as_bytes().get(self.pos + 1) {
                    Some(&c @ (b'{' | b'}')) => {
                        self.literal(engine, if c == b'{' { "{" } else { "}" });
                        self.pos += 2;
                    }
                    _ => {
                        self.literal(engine, "\\");
                        self.pos += 1;
                    }
                },
                Some(_) => self.region(engine)?,
            }
        }

        self.flush_pending(engine);
        if !self.conds.is_empty() {
            engine.warning("If block not terminated by Endif");
        }
        Ok(())
    }

    fn exit_line(&self) -> bool {
        let rest = &self.src[self.pos..];
        let line = rest.find('\n').map_or(rest, |i| &rest[..i]);
        matches!(line.trim(), "exit" | "EXIT" | "Exit")
    }

    // ── Output ────────────────────────────────────────────────────────────────

    fn literal(&mut self, engine: &mut Engine, text: &str) {
        if text.is_empty() || !self.active() {
            return;
        }
        if self.line_has_content {
            engine.emit(text);
            return;
        }
        let body = text.trim_start_matches([' ', '\t', '\r']);
        self.pending.push_str(&text[..text.len() - body.len()]);
        if !body.is_empty() {
            self.flush_pending(engine);
            engine.emit(body);
            self.line_has_content = true;
        }
    }

    fn flush_pending(&mut self, engine: &mut Engine) {
        if !self.pending.is_empty() {
            engine.emit(&self.pending);
            self.pending.clear();
        }
    }

    fn end_line(&mut self, engine: &mut Engine) {
        if self.active() {
            self.flush_pending(engine);
            engine.emit("\n");
        }
        self.pending.clear();
        self.line_has_content = false;
        self.at_line_start = true;
        engine.position.advance_line();
    }

    /// Drop the remainder of the current line, newline included.
    fn consume_line(&mut self, engine: &mut Engine) {
        let rest = &self.src[self.pos..];
        match rest.find('\n') {
            Some(i) => {
                self.pos += i + 1;
                engine.position.advance_line();
            }
            None => self.pos = self.src.len(),
        }
        self.pending.clear();
        self.line_has_content = false;
        self.at_line_start = true;
    }

    // ── Regions ───────────────────────────────────────────────────────────────

    fn region(&mut self, engine: &mut Engine) -> Result<(), EvalError> {
        let src = self.src;
        let open = self.pos;
        let close = match find_close(src, open) {
            Some(c) => c,
            None => return Err(fail(engine, EvalError::MalformedExpression("Unterminated '{'".into()))),
        };
        let inner = &src[open + 1..close];
        let original = &src[open..=close];
        let newlines = inner.matches('\n').count();
        self.pos = close + 1;

        if let Some(d) = directive(inner) {
            let alone = !self.line_has_content && rest_of_line_blank(src, self.pos);
            advance_lines(engine, newlines);
            if alone {
                self.consume_line(engine);
            }
            if self.active() || d.is_conditional() {
                tracing::debug!(directive = ?d, "directive");
                if engine.options.debugging {
                    engine.trace(&format!("{d:?}"));
                }
                self.directive(engine, d, alone)?;
            }
            return Ok(());
        }

        if self.active() && !inner.trim().is_empty() {
            let result = parse_expr(inner).and_then(|e| eval(engine, &e));
            let outcome = match result {
                Ok(v) => {
                    let text = engine.render(&v);
                    self.flush_pending(engine);
                    self.line_has_content = true;
                    let offset = engine.emitted_bytes();
                    engine.emit(&text);
                    engine.history.record(original, &text, offset);
                    Ok(())
                }
                Err(e) => {
                    let e = fail(engine, e);
                    if e.is_fatal() { Err(e) } else { Ok(()) }
                }
            };
            engine.sweep_temporaries();
            outcome?;
        }
        advance_lines(engine, newlines);
        Ok(())
    }

    fn directive(&mut self, engine: &mut Engine, d: Directive<'_>, alone: bool) -> Result<(), EvalError> {
        match d {
            Directive::Ifdef(name) | Directive::Ifndef(name) => {
                let active = self.active();
                let defined = active && is_defined(engine, name);
                let cond = active && (defined == matches!(d, Directive::Ifdef(_)));
                self.conds.push(Cond { parent_active: active, taken: cond, active: cond });
            }
            Directive::If(expr) => {
                let active = self.active();
                let cond = active && condition(engine, expr)?;
                self.conds.push(Cond { parent_active: active, taken: cond, active: cond });
            }
            Directive::Elseif(expr) => match self.conds.last().copied() {
                Some(top) if top.parent_active && !top.taken => {
                    let cond = condition(engine, expr)?;
                    if let Some(top) = self.conds.last_mut() {
                        top.active = cond;
                        top.taken = cond;
                    }
                }
                Some(_) => {
                    if let Some(top) = self.conds.last_mut() {
                        top.active = false;
                    }
                }
                None => engine.error("Elseif without matching If"),
            },
            Directive::Else => match self.conds.last_mut() {
                Some(top) => {
                    top.active = top.parent_active && !top.taken;
                    top.taken = true;
                }
                None => engine.error("Else without matching If"),
            },
            Directive::Endif => {
                if self.conds.pop().is_none() {
                    engine.error("Endif without matching If");
                }
            }
            Directive::Loop(count) => self.run_loop(engine, count, alone)?,
            Directive::EndLoop => engine.error("EndLoop without matching Loop"),
            Directive::Echo(on) => engine.echo = on,
            Directive::Include { file, required } => {
                self.flush_pending(engine);
                engine.include(unquote(file), required)?;
            }
        }
        Ok(())
    }

    // ── Loops ─────────────────────────────────────────────────────────────────

    fn run_loop(&mut self, engine: &mut Engine, count: &str, alone: bool) -> Result<(), EvalError> {
        let n = parse_expr(count)
            .and_then(|e| eval(engine, &e))
            .and_then(|v| v.scalar("Loop count"));
        engine.sweep_temporaries();
        let n = n.map_err(|e| fail(engine, e))?;
        let n = if n > 0.0 { n as usize } else { 0 };

        let body_start = self.pos;
        let (end_open, end_close) = match self.find_end_loop() {
            Ok(span) => span,
            Err(e) => return Err(fail(engine, e)),
        };
        self.pos = end_close + 1;
        let src = self.src;
        // An EndLoop alone on its line leaves that line out of the body.
        let end_line_start = src[..end_open].rfind('\n').map_or(0, |i| i + 1).max(body_start);
        let end_alone = src[end_line_start..end_open].trim().is_empty() && rest_of_line_blank(src, self.pos);
        let body = &src[body_start..if end_alone { end_line_start } else { end_open }];

        let (source, line) = match engine.position.current() {
            Some(p) => (p.source_name.clone(), p.line),
            None => (String::new(), 1),
        };
        tracing::debug!(count = n, line, "loop");
        for _ in 0..n {
            engine.position.push_at(source.clone(), line);
            let result = Scanner::new(body).run(engine);
            engine.position.pop();
            result?;
        }

        advance_lines(engine, src[body_start..end_open].matches('\n').count());
        if end_alone {
            self.consume_line(engine);
        } else if !alone {
            self.line_has_content = true;
        }
        Ok(())
    }

    /// Span (`{` and `}` indices) of the `EndLoop` matching the loop whose
    /// body starts at `self.pos`.
    fn find_end_loop(&self) -> Result<(usize, usize), EvalError> {
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some(off) = self.src[i..].find('{') {
            let open = i + off;
            if open > 0 && self.src.as_bytes()[open - 1] == b'\\' {
                i = open + 1;
                continue;
            }
            let close = find_close(self.src, open)
                .ok_or_else(|| EvalError::MalformedExpression("Unterminated '{'".into()))?;
            match directive(&self.src[open + 1..close]) {
                Some(Directive::Loop(_)) => depth += 1,
                Some(Directive::EndLoop) if depth == 0 => return Ok((open, close)),
                Some(Directive::EndLoop) => depth -= 1,
                _ => {}
            }
            i = close + 1;
        }
        Err(EvalError::MalformedExpression("Loop without matching EndLoop".into()))
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Report `e` at the current position and hand it back.
fn fail(engine: &mut Engine, e: EvalError) -> EvalError {
    engine.error(e.to_string());
    e
}

fn advance_lines(engine: &mut Engine, n: usize) {
    for _ in 0..n {
        engine.position.advance_line();
    }
}

/// Truth of an `If`/`Elseif` condition.  Non-fatal failures count as false.
fn condition(engine: &mut Engine, expr: &str) -> Result<bool, EvalError> {
    let result = parse_expr(expr).and_then(|e| eval(engine, &e));
    engine.sweep_temporaries();
    match result {
        Ok(v) => Ok(v.as_bool()),
        Err(e) => {
            let e = fail(engine, e);
            if e.is_fatal() { Err(e) } else { Ok(false) }
        }
    }
}

/// `Ifdef` test: the variable exists and is a string or a nonzero number.
fn is_defined(engine: &Engine, name: &str) -> bool {
    match engine.symbols.get(name) {
        None => false,
        Some(s) if s.kind == SymbolKind::UndefinedVariable || s.kind.is_function() => false,
        Some(s) => match &s.value {
            Value::Scalar(x) => *x != 0.0,
            Value::Text(_) | Value::Array(_) => true,
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
