use proptest::prelude::*;

use aprepro::script::expr::parse_expr;
use aprepro::{Engine, Options, Value};

fn engine() -> Engine {
    Engine::new(Options {
        warning_msg: false,
        ..Options::default()
    })
}

proptest! {
    /// The scanner returns Ok or Err on arbitrary input; it never panics and
    /// always leaves the position stack empty.
    #[test]
    fn scanner_does_not_panic(s in "\\PC*") {
        let mut e = engine();
        let _ = e.evaluate_string(&s, "fuzz");
        prop_assert!(e.position().is_empty());
    }

    /// Same, biased towards brace-heavy input.
    #[test]
    fn scanner_survives_brace_soup(s in "[{}()\\[\\],a-c0-9+*/^=<>!&|?:'\" \n\\\\]{0,64}") {
        let mut e = engine();
        let _ = e.evaluate_string(&s, "fuzz");
        prop_assert!(e.position().is_empty());
    }

    /// The expression parser never panics either.
    #[test]
    fn parser_does_not_panic(s in "\\PC*") {
        let _ = parse_expr(&s);
    }

    /// Text without braces or backslashes is copied through byte for byte.
    #[test]
    fn literal_text_passes_through(s in "[^{}\\\\]*") {
        let mut e = engine();
        e.evaluate_string(&s, "plain").unwrap();
        prop_assert_eq!(e.output(), s.as_str());
        prop_assert_eq!(e.error_count(), 0);
    }

    /// Whatever a host stores under a valid name comes back unchanged.
    #[test]
    fn add_get_round_trip(name in "[A-Za-z_][A-Za-z0-9_]{0,12}", x in -1e12f64..1e12) {
        let mut e = engine();
        let is_function = e.get_symbol(&name).is_some_and(|s| s.kind.is_function());
        let is_constant = e.get_symbol(&name).is_some_and(|s| s.is_internal);
        prop_assume!(!is_function && !is_constant);
        e.add_variable(&name, x, false, false);
        prop_assert_eq!(&e.get_symbol(&name).unwrap().value, &Value::Scalar(x));
    }

    /// Integer arithmetic inside braces agrees with Rust.
    #[test]
    fn integer_sums(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        let mut e = engine();
        e.evaluate_string(&format!("{{{a} + {b}}}"), "sum").unwrap();
        prop_assert_eq!(e.output(), (a + b).to_string());
    }
}
