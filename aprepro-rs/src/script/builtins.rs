//! Built-in functions and predefined variables.
//!
//! Every library function is registered into the symbol table with its
//! return kind, call syntax and a one-line description (shown by
//! `DUMP_FUNC()`).  All of them share one body, [`call_builtin`], which checks
//! the argument count from [`LIBRARY`] and dispatches on the name.

use std::sync::LazyLock;

use regex::Regex;

use super::eval::fetch;
use super::interp::Engine;
use super::value::Value;
use crate::array::Array;
use crate::error::{Category, EvalError, SymbolError};
use crate::format::DEFAULT_FORMAT;
use crate::symbol::{SymbolKind, SymbolTable};

const NUM: Category = Category::Scalar;
const STR: Category = Category::Text;
const ARR: Category = Category::Array;

/// `(name, returns, min args, max args, syntax, description)`
const LIBRARY: &[(&str, Category, usize, usize, &str, &str)] = &[
    // ── Math ─────────────────────────────────────────────────────────────────
    ("abs", NUM, 1, 1, "abs(x)", "Absolute value of x. |x|."),
    ("sqrt", NUM, 1, 1, "sqrt(x)", "Square root of x."),
    ("exp", NUM, 1, 1, "exp(x)", "Exponential: e^x."),
    ("log", NUM, 1, 1, "log(x)", "Natural (base e) logarithm of x."),
    ("ln", NUM, 1, 1, "ln(x)", "Natural (base e) logarithm of x."),
    ("log10", NUM, 1, 1, "log10(x)", "Base 10 logarithm of x."),
    ("sin", NUM, 1, 1, "sin(x)", "Sine of x, with x in radians."),
    ("cos", NUM, 1, 1, "cos(x)", "Cosine of x, with x in radians."),
    ("tan", NUM, 1, 1, "tan(x)", "Tangent of x, with x in radians."),
    ("asin", NUM, 1, 1, "asin(x)", "Arcsine of x, returns radians."),
    ("acos", NUM, 1, 1, "acos(x)", "Arccosine of x, returns radians."),
    ("atan", NUM, 1, 1, "atan(x)", "Arctangent of x, returns radians."),
    ("atan2", NUM, 2, 2, "atan2(y,x)", "Arctangent of y/x, signs of both used to find the quadrant."),
    ("sinh", NUM, 1, 1, "sinh(x)", "Hyperbolic sine of x."),
    ("cosh", NUM, 1, 1, "cosh(x)", "Hyperbolic cosine of x."),
    ("tanh", NUM, 1, 1, "tanh(x)", "Hyperbolic tangent of x."),
    ("sind", NUM, 1, 1, "sind(x)", "Sine of x, with x in degrees."),
    ("cosd", NUM, 1, 1, "cosd(x)", "Cosine of x, with x in degrees."),
    ("tand", NUM, 1, 1, "tand(x)", "Tangent of x, with x in degrees."),
    ("floor", NUM, 1, 1, "floor(x)", "Largest integer not greater than x."),
    ("ceil", NUM, 1, 1, "ceil(x)", "Smallest integer not less than x."),
    ("int", NUM, 1, 1, "int(x)", "Integer part of x, truncated toward zero."),
    ("nint", NUM, 1, 1, "nint(x)", "Nearest integer to x, halves rounded away from zero."),
    ("max", NUM, 2, 2, "max(x,y)", "Maximum of x and y."),
    ("min", NUM, 2, 2, "min(x,y)", "Minimum of x and y."),
    ("hypot", NUM, 2, 2, "hypot(x,y)", "sqrt(x^2+y^2)."),
    ("pow", NUM, 2, 2, "pow(x,y)", "x raised to the power y."),
    ("fmod", NUM, 2, 2, "fmod(x,y)", "Floating-point remainder of x/y."),
    ("sign", NUM, 2, 2, "sign(x,y)", "|x| with the sign of y."),
    ("dim", NUM, 2, 2, "dim(x,y)", "x - min(x,y)."),
    ("rand", NUM, 2, 2, "rand(xl,xh)", "Random number between xl and xh."),
    ("srand", NUM, 1, 1, "srand(seed)", "Seed the random number generator."),
    // ── Strings ──────────────────────────────────────────────────────────────
    ("strlen", NUM, 1, 1, "strlen(s)", "Number of characters in s."),
    ("find", NUM, 2, 2, "find(s,t)", "1-based position of t in s, 0 if not found."),
    ("word_count", NUM, 2, 2, "word_count(s,d)", "Number of words in s separated by any character of d."),
    ("get_word", STR, 3, 3, "get_word(n,s,d)", "Word n of s, words separated by any character of d."),
    ("extract", STR, 3, 3, "extract(s,b,e)", "Substring of s starting at b, up to but not including e."),
    ("tostring", STR, 1, 1, "tostring(x)", "x formatted with _FORMAT."),
    ("tolower", STR, 1, 1, "tolower(s)", "s in lower case."),
    ("toupper", STR, 1, 1, "toupper(s)", "s in upper case."),
    ("getenv", STR, 1, 1, "getenv(name)", "Value of environment variable name, empty if unset."),
    ("version", STR, 0, 0, "version()", "Version of the preprocessor."),
    ("DUMP", STR, 0, 0, "DUMP()", "List all user variables."),
    ("DUMP_FUNC", STR, 0, 0, "DUMP_FUNC()", "List all functions with their descriptions."),
    ("DUMP_PREVAR", STR, 1, 1, "DUMP_PREVAR(p)", "List user variables whose names start with p."),
    // ── Conversion ───────────────────────────────────────────────────────────
    ("tonumber", NUM, 1, 1, "tonumber(s)", "The number spelled by s."),
    ("strtod", NUM, 1, 1, "strtod(s)", "The number at the start of s, 0 if none."),
    // ── Arrays ───────────────────────────────────────────────────────────────
    ("make_array", ARR, 2, 3, "make_array(r,c[,v])", "r by c array with every element set to v (default 0)."),
    ("identity", ARR, 1, 1, "identity(n)", "n by n identity matrix."),
    ("transpose", ARR, 1, 1, "transpose(a)", "Transpose of array a."),
    ("linear_array", ARR, 3, 3, "linear_array(lo,hi,n)", "n by 1 array of values evenly spaced from lo to hi."),
    ("rows", NUM, 1, 1, "rows(a)", "Number of rows in array a."),
    ("cols", NUM, 1, 1, "cols(a)", "Number of columns in array a."),
];

/// Predefined immutable scalars.
const CONSTANTS: &[(&str, f64)] = &[
    ("PI", std::f64::consts::PI),
    ("PI_2", std::f64::consts::FRAC_PI_2),
    ("SQRT2", std::f64::consts::SQRT_2),
    ("DEG", 180.0 / std::f64::consts::PI),
    ("RAD", std::f64::consts::PI / 180.0),
    ("E", std::f64::consts::E),
    ("GAMMA", 0.577_215_664_901_532_9),
    ("PHI", 1.618_033_988_749_895),
    ("TRUE", 1.0),
    ("FALSE", 0.0),
];

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Registration ──────────────────────────────────────────────────────────────

pub(crate) fn register(symbols: &mut SymbolTable) -> Result<(), SymbolError> {
    for &(name, returns, _, _, syntax, info) in LIBRARY {
        symbols.define_function(
            name,
            SymbolKind::function_for(returns),
            call_builtin,
            syntax,
            info,
        )?;
    }
    Ok(())
}

/// Define the internal variables every engine starts with.
pub(crate) fn define_constants(symbols: &mut SymbolTable, comment: &str) -> Result<(), SymbolError> {
    for &(name, x) in CONSTANTS {
        symbols.put(name, SymbolKind::ImmutableVariable, true)?.value = Value::Scalar(x);
    }
    symbols.put("_C_", SymbolKind::StringVariable, true)?.value = Value::from(comment);
    symbols.put("_FORMAT", SymbolKind::StringVariable, true)?.value = Value::from(DEFAULT_FORMAT);
    symbols.put("VERSION", SymbolKind::ImmutableStringVariable, true)?.value = Value::from(VERSION);
    Ok(())
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Body shared by every library function.
pub(crate) fn call_builtin(
    engine: &mut Engine,
    name: &str,
    args: &[Value],
) -> Result<Value, EvalError> {
    let (min, max) = LIBRARY
        .iter()
        .find(|d| d.0 == name)
        .map(|d| (d.2, d.3))
        .ok_or_else(|| EvalError::args(name, "not a library function"))?;
    arity(name, args, min, max)?;

    let v = match name {
        // ── Math ─────────────────────────────────────────────────────────────
        "abs" => Value::Scalar(num(args, 0, name)?.abs()),
        "sqrt" => domain(engine, name, num(args, 0, name)?, f64::sqrt),
        "exp" => Value::Scalar(num(args, 0, name)?.exp()),
        "log" | "ln" => domain(engine, name, num(args, 0, name)?, f64::ln),
        "log10" => domain(engine, name, num(args, 0, name)?, f64::log10),
        "sin" => Value::Scalar(num(args, 0, name)?.sin()),
        "cos" => Value::Scalar(num(args, 0, name)?.cos()),
        "tan" => Value::Scalar(num(args, 0, name)?.tan()),
        "asin" => domain(engine, name, num(args, 0, name)?, f64::asin),
        "acos" => domain(engine, name, num(args, 0, name)?, f64::acos),
        "atan" => Value::Scalar(num(args, 0, name)?.atan()),
        "atan2" => Value::Scalar(num(args, 0, name)?.atan2(num(args, 1, name)?)),
        "sinh" => Value::Scalar(num(args, 0, name)?.sinh()),
        "cosh" => Value::Scalar(num(args, 0, name)?.cosh()),
        "tanh" => Value::Scalar(num(args, 0, name)?.tanh()),
        "sind" => Value::Scalar(num(args, 0, name)?.to_radians().sin()),
        "cosd" => Value::Scalar(num(args, 0, name)?.to_radians().cos()),
        "tand" => Value::Scalar(num(args, 0, name)?.to_radians().tan()),
        "floor" => Value::Scalar(num(args, 0, name)?.floor()),
        "ceil" => Value::Scalar(num(args, 0, name)?.ceil()),
        "int" => Value::Scalar(num(args, 0, name)?.trunc()),
        "nint" => Value::Scalar(num(args, 0, name)?.round()),
        "max" => Value::Scalar(num(args, 0, name)?.max(num(args, 1, name)?)),
        "min" => Value::Scalar(num(args, 0, name)?.min(num(args, 1, name)?)),
        "hypot" => Value::Scalar(num(args, 0, name)?.hypot(num(args, 1, name)?)),
        "pow" => {
            let (x, y) = (num(args, 0, name)?, num(args, 1, name)?);
            domain(engine, name, x, |x| Value::pow(x, y))
        }
        "fmod" => {
            let (x, y) = (num(args, 0, name)?, num(args, 1, name)?);
            if y == 0.0 {
                engine.error("Zero divisor");
                Value::Scalar(0.0)
            } else {
                Value::Scalar(x % y)
            }
        }
        "sign" => {
            let (x, y) = (num(args, 0, name)?, num(args, 1, name)?);
            Value::Scalar(if y >= 0.0 { x.abs() } else { -x.abs() })
        }
        "dim" => {
            let (x, y) = (num(args, 0, name)?, num(args, 1, name)?);
            Value::Scalar(x - x.min(y))
        }
        "rand" => {
            let (lo, hi) = (num(args, 0, name)?, num(args, 1, name)?);
            Value::Scalar(lo + (hi - lo) * engine.next_random())
        }
        "srand" => {
            engine.seed_random(num(args, 0, name)?);
            Value::Scalar(0.0)
        }

        // ── Strings ──────────────────────────────────────────────────────────
        "strlen" => Value::from(text(args, 0, name)?.chars().count() as i64),
        "find" => {
            let (s, t) = (text(args, 0, name)?, text(args, 1, name)?);
            Value::from(s.find(t).map_or(0, |i| s[..i].chars().count() as i64 + 1))
        }
        "word_count" => {
            let (s, d) = (text(args, 0, name)?, text(args, 1, name)?);
            Value::from(words(s, d).count() as i64)
        }
        "get_word" => {
            let n = num(args, 0, name)?;
            let (s, d) = (text(args, 1, name)?, text(args, 2, name)?);
            let word = if n >= 1.0 {
                words(s, d).nth(n as usize - 1).unwrap_or("")
            } else {
                ""
            };
            Value::from(word)
        }
        "extract" => {
            let (s, b, e) = (text(args, 0, name)?, text(args, 1, name)?, text(args, 2, name)?);
            Value::from(extract(s, b, e))
        }
        "tostring" => {
            let x = num(args, 0, name)?;
            Value::Text(engine.render(&Value::Scalar(x)))
        }
        "tolower" => Value::Text(text(args, 0, name)?.to_lowercase()),
        "toupper" => Value::Text(text(args, 0, name)?.to_uppercase()),
        "getenv" => Value::Text(std::env::var(text(args, 0, name)?).unwrap_or_default()),
        "version" => Value::from(VERSION),
        "DUMP" => {
            let listing = engine.dump_variables("", false);
            engine.write_info(&listing);
            Value::from("")
        }
        "DUMP_FUNC" => {
            let listing = engine.dump_functions();
            engine.write_info(&listing);
            Value::from("")
        }
        "DUMP_PREVAR" => {
            let listing = engine.dump_variables(text(args, 0, name)?, false);
            engine.write_info(&listing);
            Value::from("")
        }

        // ── Conversion ───────────────────────────────────────────────────────
        "tonumber" => {
            let s = text(args, 0, name)?;
            match s.trim().parse::<f64>() {
                Ok(x) => Value::Scalar(x),
                Err(_) => {
                    let msg = format!("tonumber: '{s}' is not a number");
                    engine.error(msg);
                    Value::Scalar(0.0)
                }
            }
        }
        "strtod" => Value::Scalar(strtod(text(args, 0, name)?)),

        // ── Arrays ───────────────────────────────────────────────────────────
        "make_array" => {
            let rows = dimension(args, 0, name)?;
            let cols = dimension(args, 1, name)?;
            let fill = if args.len() > 2 { num(args, 2, name)? } else { 0.0 };
            let mut a = sized(rows, cols, name)?;
            a.data.fill(fill);
            Value::Array(engine.arrays.insert(a))
        }
        "identity" => {
            let n = dimension(args, 0, name)?;
            let mut a = sized(n, n, name)?;
            for i in 0..n {
                if let Some(d) = a.get_mut(i, i) {
                    *d = 1.0;
                }
            }
            Value::Array(engine.arrays.insert(a))
        }
        "transpose" => {
            let t = array(engine, args, 0, name)?.transpose();
            Value::Array(engine.arrays.insert(t))
        }
        "linear_array" => {
            let (lo, hi) = (num(args, 0, name)?, num(args, 1, name)?);
            let n = dimension(args, 2, name)?;
            sized(n, 1, name)?;
            let step = if n > 1 { (hi - lo) / (n - 1) as f64 } else { 0.0 };
            let a = Array {
                rows: n,
                cols: 1,
                data: (0..n).map(|i| lo + step * i as f64).collect(),
            };
            Value::Array(engine.arrays.insert(a))
        }
        "rows" => Value::from(array(engine, args, 0, name)?.rows as i64),
        "cols" => Value::from(array(engine, args, 0, name)?.cols as i64),

        _ => return Err(EvalError::args(name, "not a library function")),
    };
    Ok(v)
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let want = if min == max {
        min.to_string()
    } else {
        format!("{min} to {max}")
    };
    Err(EvalError::args(
        name,
        format!("expects {want} argument(s), got {}", args.len()),
    ))
}

fn arg<'a>(args: &'a [Value], idx: usize, name: &str) -> Result<&'a Value, EvalError> {
    args.get(idx)
        .ok_or_else(|| EvalError::args(name, format!("argument {} missing", idx + 1)))
}

fn num(args: &[Value], idx: usize, name: &str) -> Result<f64, EvalError> {
    arg(args, idx, name)?.scalar(&format!("argument {} of '{name}'", idx + 1))
}

fn text<'a>(args: &'a [Value], idx: usize, name: &str) -> Result<&'a str, EvalError> {
    arg(args, idx, name)?.text(&format!("argument {} of '{name}'", idx + 1))
}

fn array<'e>(engine: &'e Engine, args: &[Value], idx: usize, name: &str) -> Result<&'e Array, EvalError> {
    let h = arg(args, idx, name)?.array(&format!("argument {} of '{name}'", idx + 1))?;
    fetch(engine, h)
}

/// A non-negative array dimension.
fn dimension(args: &[Value], idx: usize, name: &str) -> Result<usize, EvalError> {
    let x = num(args, idx, name)?;
    if x < 0.0 || !x.is_finite() {
        return Err(EvalError::args(
            name,
            format!("dimension must be a non-negative number, got {x}"),
        ));
    }
    Ok(x as usize)
}

/// A zeroed `rows` × `cols` array, or an argument error when it is too large.
fn sized(rows: usize, cols: usize, name: &str) -> Result<Array, EvalError> {
    Array::try_zeros(rows, cols).ok_or_else(|| {
        EvalError::args(
            name,
            format!(
                "{rows} x {cols} exceeds the {} element limit",
                crate::array::MAX_ELEMENTS
            ),
        )
    })
}

/// Apply `f`, reporting a domain error when it turns a number into NaN.
fn domain(engine: &mut Engine, name: &str, x: f64, f: impl Fn(f64) -> f64) -> Value {
    let y = f(x);
    if y.is_nan() && !x.is_nan() {
        engine.error(format!("Domain error in function '{name}'"));
    }
    Value::Scalar(y)
}

fn words<'a>(s: &'a str, delims: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    s.split(move |c: char| delims.contains(c)).filter(|w| !w.is_empty())
}

fn extract<'a>(s: &'a str, begin: &str, end: &str) -> &'a str {
    let Some(start) = s.find(begin) else {
        return "";
    };
    let tail = &s[start..];
    if end.is_empty() {
        return tail;
    }
    match tail[begin.len()..].find(end) {
        Some(i) => &tail[..begin.len() + i],
        None => tail,
    }
}

static NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?")
        .unwrap_or_else(|e| panic!("number regex: {e}"))
});

/// C `strtod`: the longest numeric prefix, 0 when there is none.
fn strtod(s: &str) -> f64 {
    NUMBER_PREFIX
        .find(s)
        .and_then(|m| m.as_str().trim_start().parse().ok())
        .unwrap_or(0.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::script::expr::parse_expr;
    use crate::script::eval::eval;

    fn ev(e: &mut Engine, src: &str) -> Value {
        eval(e, &parse_expr(src).unwrap()).unwrap()
    }

    fn scalar(e: &mut Engine, src: &str) -> f64 {
        ev(e, src).scalar("test").unwrap()
    }

    #[test]
    fn every_library_entry_dispatches() {
        let mut syms = SymbolTable::new();
        register(&mut syms).unwrap();
        assert_eq!(syms.len(), LIBRARY.len());
        for &(name, returns, ..) in LIBRARY {
            let s = syms.get(name).unwrap();
            assert_eq!(s.kind.category(), returns, "{name}");
            assert!(s.is_internal);
            assert_ne!(s.info, "UNDEFINED");
        }
    }

    #[test]
    fn math() {
        let mut e = Engine::new(Options::default());
        assert_eq!(scalar(&mut e, "abs(-3)"), 3.0);
        assert_eq!(scalar(&mut e, "int(-2.7)"), -2.0);
        assert_eq!(scalar(&mut e, "nint(2.5)"), 3.0);
        assert_eq!(scalar(&mut e, "nint(-2.5)"), -3.0);
        assert_eq!(scalar(&mut e, "max(2, 9)"), 9.0);
        assert_eq!(scalar(&mut e, "sign(3, -1)"), -3.0);
        assert_eq!(scalar(&mut e, "dim(5, 3)"), 2.0);
        assert_eq!(scalar(&mut e, "dim(3, 5)"), 0.0);
        assert_eq!(scalar(&mut e, "hypot(3, 4)"), 5.0);
        assert!((scalar(&mut e, "sind(30)") - 0.5).abs() < 1e-12);
        assert!((scalar(&mut e, "atan2(1, 1)") - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert_eq!(e.error_count(), 0);
    }

    #[test]
    fn domain_errors_are_reported() {
        let mut e = Engine::new(Options::default());
        assert!(scalar(&mut e, "sqrt(-1)").is_nan());
        assert_eq!(e.error_count(), 1);
        assert_eq!(scalar(&mut e, "fmod(5, 0)"), 0.0);
        assert_eq!(e.error_count(), 2);
    }

    #[test]
    fn arity_is_checked() {
        let mut e = Engine::new(Options::default());
        let err = eval(&mut e, &parse_expr("sqrt(1, 2)").unwrap()).unwrap_err();
        assert!(matches!(err, EvalError::BadArguments { ref name, .. } if name == "sqrt"));
        let err = eval(&mut e, &parse_expr("sqrt('x')").unwrap()).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn rand_is_in_range_and_seedable() {
        let mut e = Engine::new(Options::default());
        ev(&mut e, "srand(42)");
        let a: Vec<f64> = (0..20).map(|_| scalar(&mut e, "rand(5, 10)")).collect();
        assert!(a.iter().all(|x| (5.0..=10.0).contains(x)));
        ev(&mut e, "srand(42)");
        let b: Vec<f64> = (0..20).map(|_| scalar(&mut e, "rand(5, 10)")).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn strings() {
        let mut e = Engine::new(Options::default());
        assert_eq!(ev(&mut e, "toupper('abc')"), Value::from("ABC"));
        assert_eq!(scalar(&mut e, "strlen('héllo')"), 5.0);
        assert_eq!(scalar(&mut e, "find('hello', 'll')"), 3.0);
        assert_eq!(scalar(&mut e, "find('hello', 'z')"), 0.0);
        assert_eq!(scalar(&mut e, "word_count('a, b,,c', ', ')"), 3.0);
        assert_eq!(ev(&mut e, "get_word(2, 'a, b,,c', ', ')"), Value::from("b"));
        assert_eq!(ev(&mut e, "get_word(9, 'a b', ' ')"), Value::from(""));
        assert_eq!(ev(&mut e, "extract('key=value;', '=', ';')"), Value::from("=value"));
        assert_eq!(ev(&mut e, "extract('abc', 'x', 'c')"), Value::from(""));
        assert_eq!(ev(&mut e, "tostring(1/4)"), Value::from("0.25"));
        assert_eq!(ev(&mut e, "version()"), Value::from(VERSION));
    }

    #[test]
    fn conversion() {
        let mut e = Engine::new(Options::default());
        assert_eq!(scalar(&mut e, "tonumber(' 2.5 ')"), 2.5);
        assert_eq!(scalar(&mut e, "strtod('12.5e1abc')"), 125.0);
        assert_eq!(scalar(&mut e, "strtod('abc')"), 0.0);
        assert_eq!(scalar(&mut e, "tonumber('abc')"), 0.0);
        assert_eq!(e.error_count(), 1);
    }

    #[test]
    fn arrays() {
        let mut e = Engine::new(Options::default());
        ev(&mut e, "a = make_array(2, 3, 1.5)");
        assert_eq!(scalar(&mut e, "a[1,2]"), 1.5);
        ev(&mut e, "t = transpose(a)");
        assert_eq!(scalar(&mut e, "rows(t)"), 3.0);
        assert_eq!(scalar(&mut e, "cols(t)"), 2.0);
        ev(&mut e, "l = linear_array(0, 1, 5)");
        assert_eq!(scalar(&mut e, "l[4,0]"), 1.0);
        assert_eq!(scalar(&mut e, "l[1,0]"), 0.25);
        let err = eval(&mut e, &parse_expr("make_array(-1, 2)").unwrap()).unwrap_err();
        assert!(matches!(err, EvalError::BadArguments { .. }));
    }

    #[test]
    fn constants() {
        let mut syms = SymbolTable::new();
        define_constants(&mut syms, "#").unwrap();
        assert_eq!(syms.get("TRUE").unwrap().value, Value::Scalar(1.0));
        assert_eq!(syms.get("PI").unwrap().kind, SymbolKind::ImmutableVariable);
        assert_eq!(syms.get("_C_").unwrap().value, Value::from("#"));
        assert_eq!(syms.get("_FORMAT").unwrap().value, Value::from("%.10g"));
        assert!(syms.get("DEG").unwrap().is_internal);
    }
}
