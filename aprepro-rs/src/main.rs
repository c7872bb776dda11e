use std::fs::File;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use aprepro::cli;
use aprepro::script::builtins::VERSION;
use aprepro::{Engine, EvalError};

fn main() -> ExitCode {
    aprepro::init_tracing();

    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("aprepro: {e}");
            eprint!("{}", cli::usage());
            return ExitCode::FAILURE;
        }
    };
    if args.help {
        eprintln!("\nAprepro version {VERSION}\n");
        eprint!("{}", cli::usage());
        return ExitCode::SUCCESS;
    }
    if args.version {
        eprintln!("Algebraic Preprocessor (Aprepro) version {VERSION}");
        return ExitCode::SUCCESS;
    }

    let options = args.options.clone();
    let mut engine = Engine::new(args.options);
    engine.set_diagnostic_sinks(Some(Box::new(io::stderr())), Some(Box::new(io::stderr())));

    // ── Command-line definitions ──────────────────────────────────────────────
    for (name, value) in args.defines {
        engine.add_variable(&name, value, options.immutable, false);
    }

    // ── Output sink ───────────────────────────────────────────────────────────
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => match File::create(path) {
            Ok(f) => Box::new(io::BufWriter::new(f)),
            Err(e) => {
                eprintln!("aprepro: can't create '{}': {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdout().lock()),
    };

    if !options.quiet {
        if let Err(e) = writeln!(out, "{}", engine.long_version()) {
            eprintln!("aprepro: write failed: {e}");
            return ExitCode::FAILURE;
        }
    }

    // ── Evaluate ──────────────────────────────────────────────────────────────
    let result = match &args.input {
        Some(path) => engine.evaluate_file(path),
        None if options.interactive => run_interactive(&mut engine, &mut out),
        None => engine.evaluate_stream(io::stdin().lock(), "standard input"),
    };

    if let Err(e) = out.write_all(engine.take_output().as_bytes()).and_then(|()| out.flush()) {
        eprintln!("aprepro: write failed: {e}");
        return ExitCode::FAILURE;
    }
    let parsed = match result {
        Ok(()) => true,
        Err(e @ EvalError::Read { .. }) => {
            eprintln!("aprepro: {e}");
            false
        }
        Err(e) => {
            tracing::debug!(error = %e, "evaluation aborted");
            false
        }
    };

    // ── Variable dumps ────────────────────────────────────────────────────────
    if options.dumpvars || options.debugging {
        eprint!("{}", engine.dump_variables("", false));
    }
    if options.dumpvars_json {
        eprintln!("{}", engine.dump_variables_json());
    }

    if !parsed
        || (options.errors_fatal && engine.error_count() > 0)
        || (options.errors_and_warnings_fatal && engine.warning_count() > 0)
    {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Line-at-a-time evaluation of standard input, flushing after each line.
fn run_interactive(engine: &mut Engine, out: &mut dyn Write) -> Result<(), EvalError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let mut line = line.map_err(|source| EvalError::Read {
            name: "standard input".to_owned(),
            source,
        })?;
        if engine.options().end_on_exit && matches!(line.trim(), "exit" | "EXIT" | "Exit") {
            break;
        }
        line.push('\n');
        if let Err(e) = engine.evaluate_interactive(&line) {
            tracing::debug!(error = %e, "interactive line failed");
        }
        let text = engine.take_output();
        if out.write_all(text.as_bytes()).and_then(|()| out.flush()).is_err() {
            break;
        }
    }
    Ok(())
}
