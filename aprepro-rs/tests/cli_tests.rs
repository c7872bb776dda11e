/// Command-line tests: run input through the `aprepro` binary and check its
/// stdout, stderr and exit status.
///
/// Each case pipes its input to the binary on stdin unless it names files.
use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn binary() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_aprepro"))
}

fn run(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(binary())
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn aprepro binary");
    child
        .stdin
        .as_mut()
        .expect("stdin not open")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait on aprepro")
}

fn stdout(o: &Output) -> String {
    String::from_utf8_lossy(&o.stdout).into_owned()
}

fn stderr(o: &Output) -> String {
    String::from_utf8_lossy(&o.stderr).into_owned()
}

// ── Cases ─────────────────────────────────────────────────────────────────────

#[test]
fn quiet_substitution_from_stdin() {
    let o = run(&["-q"], "x = {3 + 4}\n");
    assert!(o.status.success());
    assert_eq!(stdout(&o), "x = 7\n");
}

#[test]
fn header_line_unless_quiet() {
    let o = run(&[], "body\n");
    let out = stdout(&o);
    let mut lines = out.lines();
    assert!(lines
        .next()
        .unwrap()
        .starts_with("$ Algebraic Preprocessor (Aprepro) version"));
    assert_eq!(lines.next(), Some("body"));
}

#[test]
fn comment_option_changes_header() {
    let o = run(&["-c#"], "");
    assert!(stdout(&o).starts_with("# Algebraic Preprocessor"));
}

#[test]
fn command_line_definitions() {
    let o = run(&["-q", "n=6", "s='mesh'"], "{n * 7} {s}\n");
    assert_eq!(stdout(&o), "42 mesh\n");
}

#[test]
fn files_in_and_out() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.i");
    let output = dir.path().join("out.txt");
    fs::write(&input, "{a = 2}\n{a ^ 10}\n").unwrap();

    let o = run(
        &["-q", input.to_str().unwrap(), output.to_str().unwrap()],
        "",
    );
    assert!(o.status.success());
    assert_eq!(fs::read_to_string(&output).unwrap(), "2\n1024\n");
    assert_eq!(stdout(&o), "");
}

#[test]
fn errors_go_to_stderr_with_position() {
    let o = run(&["-q"], "a\n{1/0}\n");
    assert!(o.status.success());
    assert!(stderr(&o).contains("Aprepro: ERROR: Zero divisor (standard input, line 2)"));
}

#[test]
fn errors_fatal_sets_exit_status() {
    let o = run(&["-q", "--errors_fatal"], "{1/0}\n");
    assert!(!o.status.success());
}

#[test]
fn warnings_fatal_sets_exit_status() {
    let o = run(&["-q", "-F"], "{undefined_name}\n");
    assert!(!o.status.success());
    let o = run(&["-q", "-F", "-W"], "{undefined_name}\n");
    assert!(o.status.success());
}

#[test]
fn aborted_parse_fails() {
    let o = run(&["-q"], "{1 +\n");
    assert!(!o.status.success());
}

#[test]
fn dumpvars_json() {
    let o = run(&["-q", "-J"], "{b = 2}{a = 'x'}\n");
    let err = stderr(&o);
    let json: serde_json::Value = serde_json::from_str(err.trim()).unwrap();
    assert_eq!(json["a"], serde_json::json!("x"));
    assert_eq!(json["b"], serde_json::json!(2.0));
}

#[test]
fn unknown_option_is_rejected() {
    let o = run(&["--frobnicate"], "");
    assert!(!o.status.success());
    assert!(stderr(&o).contains("unknown option"));
}

#[test]
fn interactive_exit_on() {
    let o = run(&["-q", "-i", "-e"], "{1+1}\nexit\n{2+2}\n");
    assert_eq!(stdout(&o), "2\n");
}

#[cfg(target_os = "linux")]
#[test]
fn failed_output_write_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.i");
    fs::write(&input, "{1 + 1}\n").unwrap();

    let o = run(&[input.to_str().unwrap(), "/dev/full"], "");
    assert!(!o.status.success());
    assert!(stderr(&o).contains("write failed"));
}

#[test]
fn missing_input_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.i");
    let o = run(&["-q", input.to_str().unwrap()], "");
    assert!(!o.status.success());
    assert!(stderr(&o).contains("error reading"));
}
