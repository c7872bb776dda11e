//! Expression evaluator.
//!
//! Walks an [`Expr`] against an [`Engine`].  Hard failures come back as
//! `Err`; soft ones (a zero divisor, writing an immutable variable, using an
//! undefined variable) are reported through the engine's diagnostics and
//! evaluation carries on with a placeholder value.
//!
//! Arrays produced by operators and functions are temporaries in the
//! engine's registry.  Binding one to a variable stores a deep copy, and the
//! scanner sweeps the temporaries once the enclosing `{…}` region is done.

use crate::array::{Array, ArrayHandle};
use crate::error::{Category, EvalError};
use crate::symbol::SymbolKind;

use super::expr::{AssignOp, BinOp, Expr, Target, UnaryOp};
use super::interp::Engine;
use super::value::Value;

/// Evaluate `expr`.
pub fn eval(engine: &mut Engine, expr: &Expr) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),

        Expr::Var(name) => lookup(engine, name),

        Expr::Index { array, row, col } => {
            let name = match &**array {
                Expr::Var(n) => n.as_str(),
                _ => "array",
            };
            let h = operand(engine, array, Category::Array, "array index")?.array("array index")?;
            let r = operand(engine, row, Category::Scalar, "array index")?.scalar("array index")?;
            let c = operand(engine, col, Category::Scalar, "array index")?.scalar("array index")?;
            let a = fetch(engine, h)?;
            let (ri, ci) = locate(engine.options.one_based_index, name, r, c, a)?;
            a.get(ri, ci).map(Value::Scalar).ok_or_else(|| {
                EvalError::args(name, "array storage does not match its shape")
            })
        }

        Expr::Unary(op, inner) => {
            let v = eval(engine, inner)?;
            match (op, v) {
                (UnaryOp::Not, v) => Ok(Value::from(!v.as_bool())),
                (UnaryOp::Neg, Value::Scalar(x)) => Ok(Value::Scalar(-x)),
                (UnaryOp::Neg, Value::Array(h)) => {
                    let out = map_array(fetch(engine, h)?, |x| -x);
                    Ok(Value::Array(engine.arrays.insert(out)))
                }
                (UnaryOp::Plus, v @ (Value::Scalar(_) | Value::Array(_))) => Ok(v),
                (_, v) => Err(EvalError::mismatch(
                    "unary operator",
                    Category::Scalar,
                    v.category(),
                )),
            }
        }

        Expr::Binary(op, lhs, rhs) => {
            // Short-circuit for && and ||
            match op {
                BinOp::And => {
                    let l = eval(engine, lhs)?;
                    if !l.as_bool() {
                        return Ok(Value::from(false));
                    }
                    return Ok(Value::from(eval(engine, rhs)?.as_bool()));
                }
                BinOp::Or => {
                    let l = eval(engine, lhs)?;
                    if l.as_bool() {
                        return Ok(Value::from(true));
                    }
                    return Ok(Value::from(eval(engine, rhs)?.as_bool()));
                }
                _ => {}
            }
            let context = format!("operator '{}'", op.symbol());
            let (l, r) = match op {
                BinOp::Concat => (
                    operand(engine, lhs, Category::Text, &context)?,
                    operand(engine, rhs, Category::Text, &context)?,
                ),
                BinOp::Pow | BinOp::Rem => (
                    operand(engine, lhs, Category::Scalar, &context)?,
                    operand(engine, rhs, Category::Scalar, &context)?,
                ),
                _ => (eval(engine, lhs)?, eval(engine, rhs)?),
            };
            binary(engine, *op, l, r)
        }

        Expr::Ternary(cond, then, else_) => {
            if eval(engine, cond)?.as_bool() {
                eval(engine, then)
            } else {
                eval(engine, else_)
            }
        }

        Expr::Assign(Target::Var(name), op, rhs) => {
            let rval = eval(engine, rhs)?;
            let new_val = match op.binop() {
                None => rval,
                Some(bin) => {
                    let cur = lookup(engine, name)?;
                    binary(engine, bin, cur, rval)?
                }
            };
            assign(engine, name, new_val)
        }

        Expr::Assign(Target::Element { name, row, col }, op, rhs) => {
            let context = "array element";
            let r = operand(engine, row, Category::Scalar, context)?.scalar(context)?;
            let c = operand(engine, col, Category::Scalar, context)?.scalar(context)?;
            let rval = operand(engine, rhs, Category::Scalar, context)?.scalar(context)?;
            let h = array_variable(engine, name)?;
            let a = fetch(engine, h)?;
            let (ri, ci) = locate(engine.options.one_based_index, name, r, c, a)?;
            let cur = a.get(ri, ci).unwrap_or(0.0);
            let new_val = match op.binop() {
                None => rval,
                Some(bin) => scalar_op(engine, bin, cur, rval),
            };
            if let Some(slot) = engine.arrays.get_mut(h).and_then(|a| a.get_mut(ri, ci)) {
                *slot = new_val;
            }
            Ok(Value::Scalar(new_val))
        }

        Expr::Step { name, delta, prefix } => {
            let context = if *delta > 0.0 { "operator '++'" } else { "operator '--'" };
            let old = lookup(engine, name)?.scalar(context)?;
            let stored = assign(engine, name, Value::Scalar(old + delta))?;
            Ok(if *prefix { stored } else { Value::Scalar(old) })
        }

        Expr::Call(name, args) => call(engine, name, args),
    }
}

// ── Symbols ───────────────────────────────────────────────────────────────────

/// Value of variable `name`.  An unknown name becomes an undefined-variable
/// placeholder holding 0.
fn lookup(engine: &mut Engine, name: &str) -> Result<Value, EvalError> {
    let found = engine.symbols.get(name).map(|s| (s.kind, s.value.clone()));
    match found {
        Some((kind, _)) if kind.is_function() => Err(EvalError::MalformedExpression(format!(
            "function '{name}' used without an argument list"
        ))),
        Some((SymbolKind::UndefinedVariable, value)) => {
            undefined(engine, name)?;
            Ok(value)
        }
        Some((_, value)) => Ok(value),
        None => {
            undefined(engine, name)?;
            engine.symbols.put(name, SymbolKind::UndefinedVariable, false)?;
            Ok(Value::default())
        }
    }
}

fn undefined(engine: &mut Engine, name: &str) -> Result<(), EvalError> {
    if engine.options.require_defined {
        return Err(EvalError::UndefinedReference(name.to_owned()));
    }
    engine.warning(format!("Undefined variable '{name}'"));
    Ok(())
}

/// Bind `value` to variable `name`, creating it when needed.  Returns the
/// value the variable holds afterwards.
pub(crate) fn assign(engine: &mut Engine, name: &str, value: Value) -> Result<Value, EvalError> {
    let found = engine.symbols.get(name).map(|s| (s.kind, s.value.clone()));
    let category = value.category();
    let kind = SymbolKind::variable_for(category, engine.state_immutable);

    match found {
        Some((k, _)) if k.is_function() => Err(EvalError::MalformedExpression(format!(
            "cannot assign to function '{name}'"
        ))),
        Some((k, current)) if k.is_immutable() => {
            engine.error(format!("Variable '{name}' is immutable and cannot be modified"));
            Ok(current)
        }
        Some((k, current)) => {
            if k != SymbolKind::UndefinedVariable && k.category() != category && !name.starts_with('_') {
                engine.warning(format!("Variable '{name}' redefined"));
            }
            let stored = own(engine, value)?;
            if let Value::Array(old) = current {
                engine.arrays.redefine_array(old);
            }
            engine.symbols.rename_type(name, kind)?;
            if let Some(sym) = engine.symbols.get_mut(name) {
                sym.value = stored.clone();
            }
            Ok(stored)
        }
        None => {
            let stored = own(engine, value)?;
            engine.symbols.put(name, kind, false)?.value = stored.clone();
            tracing::trace!(name, %kind, "variable defined");
            Ok(stored)
        }
    }
}

/// A value safe to store in a symbol: arrays are deep-copied so that no two
/// owners ever share one allocation.
pub(crate) fn own(engine: &mut Engine, value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Array(h) => {
            let copy = fetch(engine, h)?.clone();
            Ok(Value::Array(engine.arrays.insert(copy)))
        }
        other => Ok(other),
    }
}

fn array_variable(engine: &Engine, name: &str) -> Result<ArrayHandle, EvalError> {
    match engine.symbols.get(name) {
        Some(s) => match s.value {
            Value::Array(h) if s.kind == SymbolKind::ArrayVariable => Ok(h),
            _ => Err(EvalError::mismatch(
                format!("indexing '{name}'"),
                Category::Array,
                s.kind.category(),
            )),
        },
        None => Err(EvalError::UndefinedReference(name.to_owned())),
    }
}

// ── Calls ─────────────────────────────────────────────────────────────────────

fn call(engine: &mut Engine, name: &str, args: &[Expr]) -> Result<Value, EvalError> {
    let (kind, func) = match engine.symbols.get(name) {
        None => {
            return Err(EvalError::MalformedExpression(format!(
                "undefined function '{name}'"
            )));
        }
        Some(s) => (s.kind, s.func),
    };
    let func = match func {
        Some(f) if kind.is_function() => f,
        _ => {
            return Err(EvalError::NotCallable {
                name: name.to_owned(),
                kind,
            });
        }
    };

    let mut values = Vec::with_capacity(args.len());
    for a in args {
        values.push(eval(engine, a)?);
    }
    tracing::trace!(name, argc = values.len(), "call");
    let result = func(engine, name, &values)?;
    if result.category() != kind.category() {
        return Err(EvalError::mismatch(
            format!("result of '{name}'"),
            kind.category(),
            result.category(),
        ));
    }
    Ok(result)
}

/// Evaluate an operand that must be of `expected` category.  A call to a
/// function declared to return something else is rejected before the call
/// is made.
fn operand(
    engine: &mut Engine,
    expr: &Expr,
    expected: Category,
    context: &str,
) -> Result<Value, EvalError> {
    if let Expr::Call(name, _) = expr {
        if let Some(sym) = engine.symbols.get(name) {
            let declared = sym.kind.category();
            if sym.kind.is_function() && declared != expected {
                return Err(EvalError::mismatch(context, expected, declared));
            }
        }
    }
    let v = eval(engine, expr)?;
    if v.category() != expected {
        return Err(EvalError::mismatch(context, expected, v.category()));
    }
    Ok(v)
}

// ── Operators ─────────────────────────────────────────────────────────────────

fn binary(engine: &mut Engine, op: BinOp, l: Value, r: Value) -> Result<Value, EvalError> {
    let context = format!("operator '{}'", op.symbol());
    match op {
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            use std::cmp::Ordering;
            let ord = l.compare(&r, &context)?;
            let b = match op {
                BinOp::Eq => ord == Ordering::Equal,
                BinOp::Ne => ord != Ordering::Equal,
                BinOp::Lt => ord == Ordering::Less,
                BinOp::Le => ord != Ordering::Greater,
                BinOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            };
            return Ok(Value::from(b));
        }
        BinOp::Concat => {
            let mut s = l.text(&context)?.to_owned();
            s.push_str(r.text(&context)?);
            return Ok(Value::Text(s));
        }
        BinOp::And => return Ok(Value::from(l.as_bool() && r.as_bool())),
        BinOp::Or => return Ok(Value::from(l.as_bool() || r.as_bool())),
        _ => {}
    }

    match (l, r) {
        (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(scalar_op(engine, op, a, b))),
        (Value::Array(a), Value::Array(b)) => {
            let (a, b) = (fetch(engine, a)?, fetch(engine, b)?);
            let out = match op {
                BinOp::Add | BinOp::Sub => {
                    if !a.same_shape(b) {
                        return Err(EvalError::args(
                            op.symbol(),
                            format!(
                                "array dimensions differ ({}x{} vs {}x{})",
                                a.rows, a.cols, b.rows, b.cols
                            ),
                        ));
                    }
                    let sign = if op == BinOp::Add { 1.0 } else { -1.0 };
                    Array {
                        rows: a.rows,
                        cols: a.cols,
                        data: a.data.iter().zip(&b.data).map(|(x, y)| x + sign * y).collect(),
                    }
                }
                BinOp::Mul => matmul(a, b)?,
                _ => return Err(EvalError::mismatch(context, Category::Scalar, Category::Array)),
            };
            Ok(Value::Array(engine.arrays.insert(out)))
        }
        (Value::Scalar(s), Value::Array(h)) if op == BinOp::Mul => {
            let out = map_array(fetch(engine, h)?, |x| s * x);
            Ok(Value::Array(engine.arrays.insert(out)))
        }
        (Value::Array(h), Value::Scalar(s)) if matches!(op, BinOp::Mul | BinOp::Div) => {
            let out = if op == BinOp::Mul {
                map_array(fetch(engine, h)?, |x| x * s)
            } else if s == 0.0 {
                engine.error("Zero divisor");
                let a = fetch(engine, h)?;
                Array::zeros(a.rows, a.cols)
            } else {
                map_array(fetch(engine, h)?, |x| x / s)
            };
            Ok(Value::Array(engine.arrays.insert(out)))
        }
        (Value::Scalar(_), other) | (other, _) => {
            Err(EvalError::mismatch(context, Category::Scalar, other.category()))
        }
    }
}

/// Scalar arithmetic.  A zero divisor is reported and yields 0.
fn scalar_op(engine: &mut Engine, op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                engine.error("Zero divisor");
                0.0
            } else {
                a / b
            }
        }
        // Integer remainder, truncating both operands.
        BinOp::Rem => {
            let (a, b) = (a.trunc() as i64, b.trunc() as i64);
            if b == 0 {
                engine.error("Zero divisor");
                0.0
            } else {
                (a % b) as f64
            }
        }
        BinOp::Pow => Value::pow(a, b),
        _ => 0.0,
    }
}

fn matmul(a: &Array, b: &Array) -> Result<Array, EvalError> {
    if a.cols != b.rows {
        return Err(EvalError::args(
            "*",
            format!(
                "cannot multiply {}x{} by {}x{} array",
                a.rows, a.cols, b.rows, b.cols
            ),
        ));
    }
    let mut out = Array::try_zeros(a.rows, b.cols).ok_or_else(|| {
        EvalError::args("*", format!("{}x{} result is too large", a.rows, b.cols))
    })?;
    for i in 0..a.rows {
        for j in 0..b.cols {
            let dot: f64 = (0..a.cols)
                .filter_map(|k| Some(a.get(i, k)? * b.get(k, j)?))
                .sum();
            if let Some(slot) = out.get_mut(i, j) {
                *slot = dot;
            }
        }
    }
    Ok(out)
}

fn map_array(a: &Array, f: impl Fn(f64) -> f64) -> Array {
    Array {
        rows: a.rows,
        cols: a.cols,
        data: a.data.iter().map(|&x| f(x)).collect(),
    }
}

// ── Arrays ────────────────────────────────────────────────────────────────────

pub(crate) fn fetch(engine: &Engine, h: ArrayHandle) -> Result<&Array, EvalError> {
    engine
        .arrays
        .get(h)
        .ok_or_else(|| EvalError::MalformedExpression("reference to a released array".into()))
}

/// Map user indices to a zero-based position inside `a`.
fn locate(
    one_based: bool,
    name: &str,
    row: f64,
    col: f64,
    a: &Array,
) -> Result<(usize, usize), EvalError> {
    let (row, col) = (row.trunc() as i64, col.trunc() as i64);
    let base = i64::from(one_based);
    let (r, c) = (row - base, col - base);
    if r < 0 || c < 0 || r as usize >= a.rows || c as usize >= a.cols {
        return Err(EvalError::IndexOutOfRange {
            name: name.to_owned(),
            row,
            col,
            rows: a.rows,
            cols: a.cols,
        });
    }
    Ok((r as usize, c as usize))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::script::expr::parse_expr;

    fn engine() -> Engine {
        Engine::new(Options::default())
    }

    fn ev(e: &mut Engine, src: &str) -> Value {
        eval(e, &parse_expr(src).unwrap()).unwrap()
    }

    fn try_ev(e: &mut Engine, src: &str) -> Result<Value, EvalError> {
        eval(e, &parse_expr(src)?)
    }

    #[test]
    fn arithmetic() {
        let mut e = engine();
        assert_eq!(ev(&mut e, "3 + 4"), Value::Scalar(7.0));
        assert_eq!(ev(&mut e, "2 * (3 + 4) - 1"), Value::Scalar(13.0));
        assert_eq!(ev(&mut e, "-2^2"), Value::Scalar(-4.0));
        assert_eq!(ev(&mut e, "2**10"), Value::Scalar(1024.0));
        assert_eq!(ev(&mut e, "7 % 3"), Value::Scalar(1.0));
        assert_eq!(ev(&mut e, "7.9 % 3.2"), Value::Scalar(1.0));
    }

    #[test]
    fn zero_divisor_is_reported_not_fatal() {
        let mut e = engine();
        assert_eq!(ev(&mut e, "1 / 0"), Value::Scalar(0.0));
        assert_eq!(ev(&mut e, "5 % 0"), Value::Scalar(0.0));
        assert_eq!(e.error_count(), 2);
    }

    #[test]
    fn logic_and_comparison() {
        let mut e = engine();
        assert_eq!(ev(&mut e, "1 < 2 && 2 <= 2"), Value::Scalar(1.0));
        assert_eq!(ev(&mut e, "!(1 == 1) || 0"), Value::Scalar(0.0));
        assert_eq!(ev(&mut e, "'abc' < 'abd'"), Value::Scalar(1.0));
        assert_eq!(ev(&mut e, "'x' == \"x\""), Value::Scalar(1.0));
        assert!(matches!(try_ev(&mut e, "1 == 'x'"), Err(EvalError::TypeMismatch { .. })));
    }

    #[test]
    fn short_circuit_skips_side_effects() {
        let mut e = engine();
        ev(&mut e, "0 && (a = 1)");
        assert!(e.get_symbol("a").is_none());
        ev(&mut e, "1 || (b = 1)");
        assert!(e.get_symbol("b").is_none());
    }

    #[test]
    fn ternary_and_concat() {
        let mut e = engine();
        assert_eq!(ev(&mut e, "3 > 2 ? 'yes' : 'no'"), Value::from("yes"));
        assert_eq!(ev(&mut e, "'ab' // 'cd' // 'e'"), Value::from("abcde"));
        assert!(matches!(try_ev(&mut e, "'ab' // 1"), Err(EvalError::TypeMismatch { .. })));
    }

    #[test]
    fn assignment_creates_and_updates() {
        let mut e = engine();
        assert_eq!(ev(&mut e, "a = 5"), Value::Scalar(5.0));
        assert_eq!(ev(&mut e, "a += 2"), Value::Scalar(7.0));
        assert_eq!(ev(&mut e, "a ^= 2"), Value::Scalar(49.0));
        assert_eq!(e.get_symbol("a").unwrap().kind, SymbolKind::Variable);
        assert_eq!(ev(&mut e, "s = 'txt'"), Value::from("txt"));
        assert_eq!(e.get_symbol("s").unwrap().kind, SymbolKind::StringVariable);
        assert_eq!(e.warning_count(), 0);
    }

    #[test]
    fn kind_change_warns() {
        let mut e = engine();
        ev(&mut e, "a = 5");
        ev(&mut e, "a = 'five'");
        assert_eq!(e.warning_count(), 1);
        assert_eq!(e.get_symbol("a").unwrap().kind, SymbolKind::StringVariable);
        // Leading underscore names are exempt.
        ev(&mut e, "_q = 1");
        ev(&mut e, "_q = 'one'");
        assert_eq!(e.warning_count(), 1);
    }

    #[test]
    fn immutable_is_not_modified() {
        let mut e = engine();
        assert_eq!(ev(&mut e, "PI = 3"), Value::Scalar(std::f64::consts::PI));
        assert_eq!(e.error_count(), 1);
        assert_eq!(
            e.get_symbol("PI").unwrap().value,
            Value::Scalar(std::f64::consts::PI)
        );
    }

    #[test]
    fn immutable_option_applies_to_new_variables() {
        let mut e = Engine::new(Options {
            immutable: true,
            ..Options::default()
        });
        ev(&mut e, "x = 1");
        assert_eq!(e.get_symbol("x").unwrap().kind, SymbolKind::ImmutableVariable);
        ev(&mut e, "x = 2");
        assert_eq!(e.get_symbol("x").unwrap().value, Value::Scalar(1.0));
        assert_eq!(e.error_count(), 1);
    }

    #[test]
    fn undefined_warns_and_yields_zero() {
        let mut e = engine();
        assert_eq!(ev(&mut e, "nope + 1"), Value::Scalar(1.0));
        assert_eq!(e.warning_count(), 1);
        assert_eq!(e.get_symbol("nope").unwrap().kind, SymbolKind::UndefinedVariable);
        // Assigning defines it without a redefinition warning.
        ev(&mut e, "nope = 'now'");
        assert_eq!(e.warning_count(), 1);
    }

    #[test]
    fn require_defined_is_error() {
        let mut e = Engine::new(Options {
            require_defined: true,
            ..Options::default()
        });
        let err = try_ev(&mut e, "nope").unwrap_err();
        assert!(matches!(err, EvalError::UndefinedReference(ref n) if n == "nope"));
        assert!(err.is_fatal());
    }

    #[test]
    fn increments() {
        let mut e = engine();
        ev(&mut e, "i = 1");
        assert_eq!(ev(&mut e, "i++"), Value::Scalar(1.0));
        assert_eq!(ev(&mut e, "++i"), Value::Scalar(3.0));
        assert_eq!(ev(&mut e, "i--"), Value::Scalar(3.0));
        assert_eq!(e.get_symbol("i").unwrap().value, Value::Scalar(2.0));
    }

    #[test]
    fn call_type_checks() {
        let mut e = engine();
        assert_eq!(ev(&mut e, "sqrt(16)"), Value::Scalar(4.0));
        // toupper returns a string; '+' needs a number.
        let err = try_ev(&mut e, "1 ^ toupper('a')").unwrap_err();
        assert!(matches!(
            err,
            EvalError::TypeMismatch { expected: Category::Scalar, found: Category::Text, .. }
        ));
        ev(&mut e, "v = 2");
        assert!(matches!(
            try_ev(&mut e, "v(1)"),
            Err(EvalError::NotCallable { kind: SymbolKind::Variable, .. })
        ));
        assert!(matches!(
            try_ev(&mut e, "no_such_fn(1)"),
            Err(EvalError::MalformedExpression(_))
        ));
    }

    #[test]
    fn array_element_access() {
        let mut e = engine();
        ev(&mut e, "m = make_array(2, 3)");
        ev(&mut e, "m[1, 2] = 7");
        assert_eq!(ev(&mut e, "m[1,2]"), Value::Scalar(7.0));
        ev(&mut e, "m[1, 2] += 1");
        assert_eq!(ev(&mut e, "m[1,2]"), Value::Scalar(8.0));
        let err = try_ev(&mut e, "m[2, 0]").unwrap_err();
        assert!(matches!(
            err,
            EvalError::IndexOutOfRange { row: 2, col: 0, rows: 2, cols: 3, .. }
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn one_based_indexing() {
        let mut e = Engine::new(Options {
            one_based_index: true,
            ..Options::default()
        });
        ev(&mut e, "m = identity(2)");
        assert_eq!(ev(&mut e, "m[1,1]"), Value::Scalar(1.0));
        assert_eq!(ev(&mut e, "m[2,1]"), Value::Scalar(0.0));
        assert!(try_ev(&mut e, "m[0,1]").is_err());
    }

    #[test]
    fn array_arithmetic() {
        let mut e = engine();
        ev(&mut e, "a = identity(2)");
        ev(&mut e, "b = a * 3 + a");
        assert_eq!(ev(&mut e, "b[0,0]"), Value::Scalar(4.0));
        assert_eq!(ev(&mut e, "b[0,1]"), Value::Scalar(0.0));
        ev(&mut e, "c = -(b / 2)");
        assert_eq!(ev(&mut e, "c[1,1]"), Value::Scalar(-2.0));
        ev(&mut e, "r = make_array(2, 3, 1)");
        ev(&mut e, "p = b * r");
        assert_eq!(ev(&mut e, "rows(p)"), Value::Scalar(2.0));
        assert_eq!(ev(&mut e, "cols(p)"), Value::Scalar(3.0));
        assert_eq!(ev(&mut e, "p[1,2]"), Value::Scalar(4.0));
        assert!(matches!(try_ev(&mut e, "r * r"), Err(EvalError::BadArguments { .. })));
        assert!(matches!(try_ev(&mut e, "a + r"), Err(EvalError::BadArguments { .. })));
    }

    #[test]
    fn array_assignment_copies() {
        let mut e = engine();
        ev(&mut e, "a = make_array(1, 1)");
        ev(&mut e, "b = a");
        ev(&mut e, "b[0,0] = 9");
        assert_eq!(ev(&mut e, "a[0,0]"), Value::Scalar(0.0));
        let ha = e.get_symbol("a").unwrap().value.array("a").unwrap();
        let hb = e.get_symbol("b").unwrap().value.array("b").unwrap();
        assert_ne!(ha, hb);
    }

    #[test]
    fn rebinding_array_releases_old() {
        let mut e = engine();
        ev(&mut e, "a = make_array(2, 2)");
        e.sweep_temporaries();
        let before = e.arrays().release_count();
        ev(&mut e, "a = 5");
        assert_eq!(e.arrays().release_count(), before + 1);
        assert!(e.arrays().is_empty());
    }
}
