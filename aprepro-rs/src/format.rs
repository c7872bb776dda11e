//! printf-style formatting of scalar results.
//!
//! Scalars are written with the format held in the `_FORMAT` variable
//! (default `%.10g`).  Only a single conversion is supported, which covers
//! every format users actually set:
//!
//! | Conversion | Example | Output for 1234.5 |
//! |------------|---------|-------------------|
//! | `g` / `G`  | `%.10g` | `1234.5` |
//! | `f`        | `%.2f`  | `1234.50` |
//! | `e` / `E`  | `%.2e`  | `1.23e+03` |
//! | `d`        | `%d`    | `1234` |

use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_FORMAT: &str = "%.10g";

static SPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)%([-+ 0]*)(\d*)(?:\.(\d+))?([gGfFeEdi])(.*)$")
        .unwrap_or_else(|e| panic!("format regex: {e}"))
});

/// A parsed `_FORMAT` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    prefix: String,
    suffix: String,
    left: bool,
    plus: bool,
    zero: bool,
    width: usize,
    precision: Option<usize>,
    conv: char,
}

impl NumberFormat {
    /// Parse `spec`; `None` when it holds no usable conversion.
    pub fn parse(spec: &str) -> Option<Self> {
        let caps = SPEC_RE.captures(spec)?;
        let flags = caps.get(2).map_or("", |m| m.as_str());
        Some(NumberFormat {
            prefix: caps[1].to_owned(),
            suffix: caps[6].to_owned(),
            left: flags.contains('-'),
            plus: flags.contains('+'),
            zero: flags.contains('0'),
            width: caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0),
            precision: caps.get(4).and_then(|m| m.as_str().parse().ok()),
            conv: caps[5].chars().next().unwrap_or('g'),
        })
    }

    pub fn format(&self, x: f64) -> String {
        let mut body = match self.conv {
            'g' => format_g(x, self.precision.unwrap_or(6), false),
            'G' => format_g(x, self.precision.unwrap_or(6), true),
            'f' | 'F' => non_finite(x).unwrap_or_else(|| format!("{:.*}", self.precision.unwrap_or(6), x)),
            'e' => format_e(x, self.precision.unwrap_or(6), false),
            'E' => format_e(x, self.precision.unwrap_or(6), true),
            _ => non_finite(x).unwrap_or_else(|| format!("{}", x.trunc() as i64)),
        };
        if self.plus && !body.starts_with('-') {
            body.insert(0, '+');
        }
        if body.len() < self.width {
            let pad = self.width - body.len();
            if self.left {
                body.push_str(&" ".repeat(pad));
            } else if self.zero && x.is_finite() {
                let at = usize::from(body.starts_with(['-', '+']));
                body.insert_str(at, &"0".repeat(pad));
            } else {
                body.insert_str(0, &" ".repeat(pad));
            }
        }
        format!("{}{}{}", self.prefix, body, self.suffix)
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            prefix: String::new(),
            suffix: String::new(),
            left: false,
            plus: false,
            zero: false,
            width: 0,
            precision: Some(10),
            conv: 'g',
        }
    }
}

/// Format with `spec`, falling back to `%.10g` when `spec` is unusable.
pub fn format_number(x: f64, spec: &str) -> String {
    NumberFormat::parse(spec).unwrap_or_default().format(x)
}

fn non_finite(x: f64) -> Option<String> {
    if x.is_nan() {
        Some("nan".to_owned())
    } else if x.is_infinite() {
        Some(if x < 0.0 { "-inf" } else { "inf" }.to_owned())
    } else {
        None
    }
}

/// Split Rust's `{:e}` output into mantissa and exponent.
fn sci_parts(x: f64, decimals: usize) -> (String, i32) {
    let s = format!("{:.*e}", decimals, x);
    match s.split_once('e') {
        Some((m, e)) => (m.to_owned(), e.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn exponent_suffix(exp: i32, upper: bool) -> String {
    let e = if upper { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{e}{sign}{:02}", exp.abs())
}

fn strip_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// C `%e`.
fn format_e(x: f64, precision: usize, upper: bool) -> String {
    if let Some(s) = non_finite(x) {
        return s;
    }
    let (mant, exp) = sci_parts(x, precision);
    format!("{mant}{}", exponent_suffix(exp, upper))
}

/// C `%g`: shortest of fixed and scientific at `precision` significant
/// digits, trailing zeros removed.
pub fn format_g(x: f64, precision: usize, upper: bool) -> String {
    if let Some(s) = non_finite(x) {
        return s;
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }
    let p = precision.max(1);
    let (mant, exp) = sci_parts(x, p - 1);
    if exp < -4 || exp >= p as i32 {
        format!("{}{}", strip_zeros(&mant), exponent_suffix(exp, upper))
    } else {
        let decimals = (p as i32 - 1 - exp).max(0) as usize;
        strip_zeros(&format!("{:.*}", decimals, x)).to_owned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn g_basic() {
        assert_eq!(format_number(7.0, DEFAULT_FORMAT), "7");
        assert_eq!(format_number(0.1, DEFAULT_FORMAT), "0.1");
        assert_eq!(format_number(-2.5, DEFAULT_FORMAT), "-2.5");
        assert_eq!(format_number(1234.5, DEFAULT_FORMAT), "1234.5");
        assert_eq!(format_number(0.0, DEFAULT_FORMAT), "0");
    }

    #[test]
    fn g_switches_to_scientific() {
        assert_eq!(format_number(1e20, DEFAULT_FORMAT), "1e+20");
        assert_eq!(format_number(1.5e-7, DEFAULT_FORMAT), "1.5e-07");
        assert_eq!(format_number(12345678901.0, DEFAULT_FORMAT), "1.23456789e+10");
        assert_eq!(format_g(0.0001, 6, false), "0.0001");
        assert_eq!(format_g(0.00001, 6, false), "1e-05");
    }

    #[test]
    fn g_rounds_to_precision() {
        assert_eq!(format_number(std::f64::consts::PI, DEFAULT_FORMAT), "3.141592654");
        assert_eq!(format_number(2.0 / 3.0, "%.3g"), "0.667");
        assert_eq!(format_g(999999.5, 6, false), "1e+06");
    }

    #[test]
    fn other_conversions() {
        assert_eq!(format_number(1234.5, "%.2f"), "1234.50");
        assert_eq!(format_number(1234.56, "%.3e"), "1.235e+03");
        assert_eq!(format_number(1234.9, "%d"), "1234");
        assert_eq!(format_number(3.0, "%5.1f"), "  3.0");
        assert_eq!(format_number(3.0, "%-5.1f|"), "3.0  |");
        assert_eq!(format_number(-3.0, "%06.1f"), "-003.0");
        assert_eq!(format_number(2.0, "x=%g;"), "x=2;");
    }

    #[test]
    fn bad_spec_falls_back() {
        assert_eq!(format_number(0.5, "nonsense"), "0.5");
    }

    #[test]
    fn non_finite_values() {
        assert_eq!(format_number(f64::INFINITY, DEFAULT_FORMAT), "inf");
        assert_eq!(format_number(f64::NAN, "%.2f"), "nan");
    }
}
