//! Configuration loading feeding the policy evaluator.

use crate::integration::{CsrFixture, signed_csr};
use puppet_autosign::logging::{FileLogger, LogLevel};
use puppet_autosign::{AutosignConfig, ConfigLoader, CsrDocument, DecisionReason, PolicyEvaluator};
use tempfile::tempdir;

#[test]
fn test_yaml_config_drives_decision() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("autosign.yaml");
    std::fs::write(
        &path,
        "challengePassword: s3cr3t\nautosignPatterns:\n  - '^db-\\d+$'\n",
    )
    .unwrap();

    let config = ConfigLoader::new().with_paths([&path]).load().unwrap();
    let policy = config.policy();

    let pem = CsrFixture::new("agent01").challenge_password("s3cr3t").to_pem();
    let csr = CsrDocument::parse(pem.as_bytes()).unwrap();
    let decision = PolicyEvaluator::new(&policy).evaluate(&csr, "agent01");
    assert_eq!(decision.reason, DecisionReason::ChallengeMatched);

    let pem = signed_csr("db-42", &[]);
    let csr = CsrDocument::parse(pem.as_bytes()).unwrap();
    let decision = PolicyEvaluator::new(&policy).evaluate(&csr, "db-42");
    assert_eq!(decision.reason, DecisionReason::HostnamePatternMatched);
}

#[test]
fn test_json_config_from_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("autosign.json");
    std::fs::write(
        &path,
        r#"{"autosignPatterns": ["^web-.*$"], "logFile": "/tmp/a.log", "debug": true}"#,
    )
    .unwrap();

    let config = AutosignConfig::from_path(&path).unwrap();
    assert!(config.debug);
    assert_eq!(config.autosign_patterns, vec!["^web-.*$"]);
    assert_eq!(config.policy().challenge_secret(), None);
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("autosign.conf");
    std::fs::write(&path, "debug = true\n").unwrap();

    let err = ConfigLoader::new().with_paths([&path]).load().unwrap_err();
    assert!(err.to_string().contains("Unsupported configuration file type"));
}

#[test]
fn test_audit_log_records_decision() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("puppetlabs-autosign.log");
    let logger = FileLogger::open(&log_path, LogLevel::Debug).unwrap();

    let config = AutosignConfig::from_yaml("autosignPatterns:\n  - '^db-\\d+$'\n").unwrap();
    let policy = config.policy();
    let pem = signed_csr("web-1", &[]);
    let csr = CsrDocument::parse(pem.as_bytes()).unwrap();

    let decision = PolicyEvaluator::new(&policy)
        .with_sink(&logger)
        .evaluate(&csr, "web-1");
    assert!(!decision.signed);

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(contents.contains("Checking certificate for web-1"));
    assert!(contents.contains("Checking pattern '^db-\\d+$'"));
    assert!(contents.contains("Do not sign web-1"));
}
