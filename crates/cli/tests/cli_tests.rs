//! CLI integration tests

use std::process::Command;

fn kubeqa() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kubeqa"))
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = kubeqa()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Kube Query Agent"), "Should show app name");
    assert!(stdout.contains("ask"), "Should show ask command");
    assert!(stdout.contains("health"), "Should show health command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = kubeqa()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("kubeqa"), "Should show binary name");
}

/// Test ask subcommand help
#[test]
fn test_ask_help() {
    let output = kubeqa()
        .args(["ask", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Ask help should succeed");
    assert!(stdout.contains("QUESTION"), "Should show question argument");
}

/// Test format and api-url options
#[test]
fn test_global_options() {
    let output = kubeqa()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("KUBEQA_API_URL"), "Should show env var");
}

/// Test that ask without a question fails
#[test]
fn test_missing_question() {
    let output = kubeqa()
        .arg("ask")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Ask without a question should fail");
}

/// Test invalid subcommand
#[test]
fn test_invalid_command() {
    let output = kubeqa()
        .arg("invalid-command")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Invalid command should fail");
}

/// Test invalid format value
#[test]
fn test_invalid_format() {
    let output = kubeqa()
        .args(["--format", "yaml", "health"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Unknown format should fail");
}

/// Test unreachable agent reports an error
#[test]
fn test_unreachable_agent() {
    let output = kubeqa()
        .args(["--api-url", "http://127.0.0.1:9", "health"])
        .env_remove("KUBEQA_API_URL")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Unreachable agent should fail");
}
