//! Tests for the `autosign` binary.

use std::path::Path;
use std::process::{Command, Output};

use crate::integration::{CsrFixture, signed_csr};
use tempfile::{TempDir, tempdir};

/// Write a YAML config (logging into the same directory) and a CSR file.
fn setup(config_body: &str, pem: &str) -> TempDir {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("autosign.log");
    let config = format!("{}logFile: {}\n", config_body, log_path.display());
    std::fs::write(dir.path().join("autosign.yaml"), config).unwrap();
    std::fs::write(dir.path().join("request.pem"), pem).unwrap();
    dir
}

fn run(dir: &Path, hostname: &str, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_autosign"))
        .arg("--config")
        .arg(dir.join("autosign.yaml"))
        .arg("--csr")
        .arg(dir.join("request.pem"))
        .args(extra)
        .arg(hostname)
        .output()
        .unwrap()
}

#[test]
fn test_exit_code_on_grant() {
    let pem = CsrFixture::new("agent01")
        .challenge_password("s3cr3t")
        .to_pem();
    let dir = setup("challengePassword: s3cr3t\n", &pem);

    let output = run(dir.path(), "agent01", &[]);
    assert_eq!(output.status.code(), Some(0));

    let log = std::fs::read_to_string(dir.path().join("autosign.log")).unwrap();
    assert!(log.contains("Sign agent01"));
}

#[test]
fn test_json_audit_log() {
    let dir = setup("logFormat: json\n", &signed_csr("agent01", &[]));

    let output = run(dir.path(), "agent01", &[]);
    assert_eq!(output.status.code(), Some(0));

    let log = std::fs::read_to_string(dir.path().join("autosign.log")).unwrap();
    let last: serde_json::Value = serde_json::from_str(log.lines().last().unwrap()).unwrap();
    assert_eq!(last["hostname"], "agent01");
    assert_eq!(last["reason"], "no_dns_alt_names_no_patterns");
}

#[test]
fn test_exit_code_on_denial() {
    let dir = setup("autosignPatterns:\n  - '^db-\\d+$'\n", &signed_csr("web-1", &[]));

    let output = run(dir.path(), "web-1", &[]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_exit_code_on_malformed_csr() {
    let dir = setup("", "this is not a certificate request\n");

    let output = run(dir.path(), "agent01", &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Malformed certificate request"));

    let log = std::fs::read_to_string(dir.path().join("autosign.log")).unwrap();
    assert!(log.contains("Do not sign agent01"));
    assert!(log.contains("reason=error"));
}

#[cfg(unix)]
#[test]
fn test_sign_failure_is_an_error() {
    let dir = setup("", &signed_csr("agent01", &[]));

    let granted = run(dir.path(), "agent01", &["--sign", "--puppet-bin", "true"]);
    assert_eq!(granted.status.code(), Some(0));

    let failed = run(dir.path(), "agent01", &["--sign", "--puppet-bin", "false"]);
    assert_eq!(failed.status.code(), Some(2));
}
