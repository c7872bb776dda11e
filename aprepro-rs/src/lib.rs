//! Algebraic preprocessor.
//!
//! Copies text through, replacing every `{expression}` with its value.
//! Variables, string and array values, a function library, conditionals,
//! loops and file inclusion are all available inside the braces.  The
//! [`Engine`] is the embedding entry point; the `aprepro` binary wraps it.

pub mod array;
pub mod cli;
pub mod config;
pub mod diag;
pub mod error;
pub mod format;
pub mod history;
pub mod position;
pub mod script;
pub mod symbol;

use std::sync::Once;

pub use array::{Array, ArrayHandle, ArrayRegistry};
pub use config::{ConfigError, OptionOutcome, Options};
pub use diag::{Diagnostics, Message, Severity};
pub use error::{Category, EvalError, SymbolError};
pub use history::HistoryEntry;
pub use position::FilePosition;
pub use script::{Engine, Value};
pub use symbol::{Builtin, Symbol, SymbolKind, SymbolTable};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber for developer output.
///
/// Does nothing unless `RUST_LOG` is set, e.g. `RUST_LOG=aprepro=debug`.
/// Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
