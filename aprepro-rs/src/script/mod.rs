//! The algebraic expression language and the text scanner that drives it.
//!
//! Text outside `{…}` is copied through unchanged; each region is parsed
//! ([`expr`]), evaluated against the engine ([`eval`]) and replaced by its
//! formatted value.  [`scan`] handles the region boundaries and the
//! `Ifdef`/`Loop`/`include` family of directives.
//!
//! # Quick start
//!
//! ```rust
//! use aprepro::{Engine, Options};
//!
//! let mut engine = Engine::new(Options::default());
//! engine.evaluate_string("{r = 2} {PI * r^2}\n", "quick").unwrap();
//! assert_eq!(engine.output(), "2 12.56637061\n");
//! ```

pub mod builtins;
pub mod eval;
pub mod expr;
pub mod interp;
pub mod scan;
pub mod value;

pub use interp::Engine;
pub use value::Value;
