//! User-facing error, warning and info messages.
//!
//! The most recent messages are kept in [`Diagnostics::messages`] (up to
//! [`DEFAULT_RETAINED`], see [`Diagnostics::set_retain_limit`]) and, when a
//! sink is attached, written to it immediately as one line:
//!
//! ```text
//! Aprepro: WARNING: Undefined variable 'x' (input.i, line 4)
//! ```
//!
//! Reporting never touches parse state.  Developer tracing goes through
//! `tracing`; this module is only what the user of the preprocessor sees.

use std::fmt;
use std::io::Write;

use crate::config::Options;
use crate::position::FilePosition;

// ── Message ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
    pub position: Option<FilePosition>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aprepro: {}: {}", self.severity.label(), self.text.trim_end())?;
        if let Some(p) = &self.position {
            write!(f, " ({}, line {})", p.source_name, p.line)?;
        }
        Ok(())
    }
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

pub type Sink = Box<dyn Write>;

/// Messages kept in memory before the oldest are dropped.
pub const DEFAULT_RETAINED: usize = 1024;

pub struct Diagnostics {
    warnings_enabled: bool,
    info_enabled: bool,
    error_count: usize,
    warning_count: usize,
    /// The most recent messages, oldest first.
    pub messages: Vec<Message>,
    retain_limit: usize,
    /// Destination for errors and warnings.
    error_sink: Option<Sink>,
    /// Destination for info messages and `DUMP()` listings.
    info_sink: Option<Sink>,
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("error_count", &self.error_count)
            .field("warning_count", &self.warning_count)
            .field("messages", &self.messages.len())
            .finish()
    }
}

impl Diagnostics {
    /// A diagnostics collector gated by `options`, with no sinks attached.
    pub fn new(options: &Options) -> Self {
        Diagnostics {
            warnings_enabled: options.warning_msg,
            info_enabled: options.info_msg,
            error_count: 0,
            warning_count: 0,
            messages: Vec::new(),
            retain_limit: DEFAULT_RETAINED,
            error_sink: None,
            info_sink: None,
        }
    }

    /// Attach sinks; `None` leaves the current one in place.
    pub fn set_sinks(&mut self, errors: Option<Sink>, info: Option<Sink>) {
        if errors.is_some() {
            self.error_sink = errors;
        }
        if info.is_some() {
            self.info_sink = info;
        }
    }

    pub fn report_error(&mut self, text: impl Into<String>, position: Option<&FilePosition>) {
        self.error_count += 1;
        self.emit(Severity::Error, text.into(), position);
    }

    /// Dropped entirely (not counted) when warnings are disabled.
    pub fn report_warning(&mut self, text: impl Into<String>, position: Option<&FilePosition>) {
        if !self.warnings_enabled {
            return;
        }
        self.warning_count += 1;
        self.emit(Severity::Warning, text.into(), position);
    }

    pub fn report_info(&mut self, text: impl Into<String>, position: Option<&FilePosition>) {
        if !self.info_enabled {
            return;
        }
        self.emit(Severity::Info, text.into(), position);
    }

    /// Write `text` verbatim to the info sink, ungated (variable listings).
    pub fn write_info(&mut self, text: &str) {
        if let Some(sink) = self.info_sink.as_mut() {
            if let Err(e) = sink.write_all(text.as_bytes()) {
                tracing::warn!(error = %e, "info sink write failed");
            }
        }
    }

    fn emit(&mut self, severity: Severity, text: String, position: Option<&FilePosition>) {
        let msg = Message {
            severity,
            text,
            position: position.cloned(),
        };
        let sink = match severity {
            Severity::Info => self.info_sink.as_mut(),
            Severity::Error | Severity::Warning => self.error_sink.as_mut(),
        };
        if let Some(sink) = sink {
            if let Err(e) = writeln!(sink, "{msg}") {
                tracing::warn!(error = %e, "diagnostic sink write failed");
            }
        }
        if self.retain_limit == 0 {
            return;
        }
        if self.messages.len() >= self.retain_limit {
            let excess = self.messages.len() + 1 - self.retain_limit;
            self.messages.drain(..excess);
        }
        self.messages.push(msg);
    }

    /// Keep at most `limit` messages; 0 keeps none.  Counters are unaffected.
    pub fn set_retain_limit(&mut self, limit: usize) {
        self.retain_limit = limit;
        if self.messages.len() > limit {
            let excess = self.messages.len() - limit;
            self.messages.drain(..excess);
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Drain retained messages (counters are kept).
    pub fn take_messages(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    pub fn flush(&mut self) {
        for sink in [self.error_sink.as_mut(), self.info_sink.as_mut()].into_iter().flatten() {
            let _ = sink.flush();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
