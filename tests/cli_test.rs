//! Integration tests for the command line surface.
//!
//! These run the compiled binary as a subprocess; none of them reach the
//! network because every case stops before a platform session is opened.

use std::process::{Command, Output};

/// Helper: path to the built binary. `cargo test` compiles it for us.
fn docrelay_bin() -> String {
    let mut path = std::env::current_exe()
        .expect("cannot determine test exe path")
        .parent()
        .expect("no parent dir")
        .parent()
        .expect("no grandparent dir")
        .to_path_buf();
    path.push("docrelay");
    path.to_string_lossy().to_string()
}

/// A command with no credentials or destination leaking in from the environment.
fn docrelay() -> Command {
    let mut cmd = Command::new(docrelay_bin());
    for var in [
        "TELEGRAM_API_TOKEN",
        "TELEGRAM_CHAT_ID",
        "BALE_API_TOKEN",
        "BALE_CHAT_ID",
        "DOCRELAY_DESTINATION",
        "DOCRELAY_CONFIG",
        "DOCRELAY_LOG_FORMAT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to run docrelay")
}

#[test]
fn log_format_json_with_help_exits_zero() {
    let output = run(docrelay().args(["--log-format", "json", "--help"]));

    assert!(
        output.status.success(),
        "expected exit 0, got {:?}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr),
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("--log-format"),
        "help text should mention --log-format:\n{stdout}"
    );
}

#[test]
fn help_names_credential_env_vars() {
    let output = run(docrelay().arg("--help"));
    let stdout = String::from_utf8_lossy(&output.stdout);

    for var in [
        "TELEGRAM_API_TOKEN",
        "TELEGRAM_CHAT_ID",
        "BALE_API_TOKEN",
        "BALE_CHAT_ID",
        "DOCRELAY_LOG_FORMAT",
    ] {
        assert!(stdout.contains(var), "help text should mention {var}:\n{stdout}");
    }
}

#[test]
fn invalid_destination_fails_before_anything_else() {
    let output = run(docrelay().args(["--destination", "X", "missing.docx"]));

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid destination"),
        "stderr should explain the selector:\n{stderr}"
    );
}

#[test]
fn empty_prompted_destination_fails() {
    // stdin is closed, so the destination prompt reads an empty line.
    let output = run(docrelay().arg("missing.docx"));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_credentials_fail() {
    let output = run(docrelay().args(["--destination", "T", "missing.docx"]));

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("TELEGRAM_API_TOKEN"),
        "stderr should name the missing variable:\n{stderr}"
    );
}

#[test]
fn missing_document_fails() {
    let output = run(docrelay()
        .env("BALE_API_TOKEN", "123:abc")
        .env("BALE_CHAT_ID", "@news")
        .args(["--destination", "B", "/no/such/file.docx"]));

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to read document"),
        "stderr should report the document error:\n{stderr}"
    );
}
