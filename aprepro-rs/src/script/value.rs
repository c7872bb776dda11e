//! Runtime value type for the expression language.
//!
//! Every value is one of three storage kinds.  Arrays are not held inline:
//! [`Value::Array`] is an ownership token into the engine's
//! [`ArrayRegistry`](crate::array::ArrayRegistry).

use crate::array::ArrayHandle;
use crate::error::{Category, EvalError};

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Text(String),
    Array(ArrayHandle),
}

impl Default for Value {
    fn default() -> Self {
        Value::Scalar(0.0)
    }
}

impl Value {
    pub fn category(&self) -> Category {
        match self {
            Value::Scalar(_) => Category::Scalar,
            Value::Text(_) => Category::Text,
            Value::Array(_) => Category::Array,
        }
    }

    /// The scalar payload, or a `TypeMismatch` naming `context`.
    pub fn scalar(&self, context: &str) -> Result<f64, EvalError> {
        match self {
            Value::Scalar(x) => Ok(*x),
            other => Err(EvalError::mismatch(context, Category::Scalar, other.category())),
        }
    }

    /// The string payload, or a `TypeMismatch` naming `context`.
    pub fn text(&self, context: &str) -> Result<&str, EvalError> {
        match self {
            Value::Text(s) => Ok(s),
            other => Err(EvalError::mismatch(context, Category::Text, other.category())),
        }
    }

    /// The array handle, or a `TypeMismatch` naming `context`.
    pub fn array(&self, context: &str) -> Result<ArrayHandle, EvalError> {
        match self {
            Value::Array(h) => Ok(*h),
            other => Err(EvalError::mismatch(context, Category::Array, other.category())),
        }
    }

    /// Truthiness for `?:`, `&&`, `||`, `!` and `If()`: nonzero numbers and
    /// non-empty strings are true.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Scalar(x) => *x != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Array(_) => true,
        }
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────

    /// `a ^ b` with the usual special cases folded into `powf`.
    pub fn pow(a: f64, b: f64) -> f64 {
        if b == 2.0 {
            a * a
        } else {
            a.powf(b)
        }
    }

    /// Numeric or lexical comparison, depending on the operand kinds.
    pub fn compare(&self, rhs: &Value, context: &str) -> Result<std::cmp::Ordering, EvalError> {
        use std::cmp::Ordering;
        match (self, rhs) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(a.partial_cmp(b).unwrap_or(Ordering::Equal)),
            (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
            (Value::Scalar(_), other) => {
                Err(EvalError::mismatch(context, Category::Scalar, other.category()))
            }
            (Value::Text(_), other) => {
                Err(EvalError::mismatch(context, Category::Text, other.category()))
            }
            (Value::Array(_), _) => {
                Err(EvalError::mismatch(context, Category::Scalar, Category::Array))
            }
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(if b { 1.0 } else { 0.0 })
    }
}

impl From<ArrayHandle> for Value {
    fn from(h: ArrayHandle) -> Self {
        Value::Array(h)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn as_bool() {
        assert!(Value::Scalar(1.0).as_bool());
        assert!(!Value::Scalar(0.0).as_bool());
        assert!(Value::Text("x".into()).as_bool());
        assert!(!Value::Text(String::new()).as_bool());
    }

    #[test]
    fn accessors_report_mismatch() {
        let v = Value::Text("abc".into());
        assert!(v.text("ctx").is_ok());
        let err = v.scalar("operator '*'").unwrap_err();
        assert!(matches!(
            err,
            EvalError::TypeMismatch { expected: Category::Scalar, found: Category::Text, .. }
        ));
    }

    #[test]
    fn comparisons() {
        let a = Value::Scalar(1.0);
        let b = Value::Scalar(2.0);
        assert_eq!(a.compare(&b, "<").unwrap(), Ordering::Less);
        let s = Value::Text("b".into());
        let t = Value::Text("a".into());
        assert_eq!(s.compare(&t, "<").unwrap(), Ordering::Greater);
        assert!(a.compare(&s, "==").is_err());
    }

    #[test]
    fn from_impls() {
        assert_eq!(Value::from(3i64), Value::Scalar(3.0));
        assert_eq!(Value::from("hi"), Value::Text("hi".into()));
        assert_eq!(Value::from(true), Value::Scalar(1.0));
    }

    #[test]
    fn pow_square_is_exact() {
        assert_eq!(Value::pow(3.0, 2.0), 9.0);
        assert_eq!(Value::pow(2.0, 10.0), 1024.0);
    }
}
