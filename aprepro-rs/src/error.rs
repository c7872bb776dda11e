//! Error taxonomy for the symbol table and the evaluator.
//!
//! Only the conditions that abort something surface as `Err`.  Soft
//! conditions (an invalid name passed to `add_variable`, an undefined
//! variable without `require_defined`, a zero divisor) are reported through
//! [`Diagnostics`](crate::diag::Diagnostics) and evaluation carries on.

use std::io;

use crate::symbol::SymbolKind;

/// Failures raised by [`SymbolTable`](crate::symbol::SymbolTable) mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("variable '{0}' is already defined")]
    DuplicateDefinition(String),

    #[error("overloaded function '{0}' does not return same type")]
    OverloadTypeMismatch(String),

    #[error("symbol '{0}' not defined")]
    NotFound(String),
}

/// Value category a call site or operator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Scalar,
    Text,
    Array,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Category::Scalar => "number",
            Category::Text => "string",
            Category::Array => "array",
        })
    }
}

/// Failures raised while evaluating input.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("invalid variable name syntax '{0}'")]
    InvalidIdentifier(String),

    #[error("undefined variable '{0}'")]
    UndefinedReference(String),

    #[error("type mismatch: {context} expects {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: Category,
        found: Category,
    },

    #[error("'{name}' is a {kind}, not a function")]
    NotCallable { name: String, kind: SymbolKind },

    #[error("{name}: {message}")]
    BadArguments { name: String, message: String },

    #[error("index [{row}, {col}] out of range for '{name}' ({rows} x {cols})")]
    IndexOutOfRange {
        name: String,
        row: i64,
        col: i64,
        rows: usize,
        cols: usize,
    },

    #[error("{0}")]
    MalformedExpression(String),

    #[error("can't open '{file}': {source}")]
    IncludeOpenFailure {
        file: String,
        #[source]
        source: io::Error,
    },

    #[error("error reading '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl EvalError {
    /// `true` when the error aborts the stream being evaluated.
    ///
    /// Definition-level errors stay local to the statement that caused them;
    /// everything touching syntax, typing or indexing is fatal.  An
    /// `UndefinedReference` only surfaces under `require_defined`, where it is
    /// fatal too.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            EvalError::Symbol(SymbolError::NotFound(_)) | EvalError::InvalidIdentifier(_)
        )
    }

    pub(crate) fn mismatch(context: impl Into<String>, expected: Category, found: Category) -> Self {
        EvalError::TypeMismatch {
            context: context.into(),
            expected,
            found,
        }
    }

    pub(crate) fn args(name: &str, message: impl Into<String>) -> Self {
        EvalError::BadArguments {
            name: name.to_owned(),
            message: message.into(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
