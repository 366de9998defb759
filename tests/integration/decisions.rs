//! End-to-end autosign decisions on encoded certificate requests.

use crate::integration::{CsrFixture, signed_csr};
use puppet_autosign::types::oids;
use puppet_autosign::{
    AttributeName, AutosignPolicy, CheckError, CsrDocument, DecisionReason, decide,
};

#[test]
fn test_challenge_password_grants() {
    let pem = CsrFixture::new("agent01.example.com")
        .challenge_password("s3cr3t")
        .to_pem();
    let policy = AutosignPolicy::new().with_challenge_secret("s3cr3t");

    let decision = decide(pem.as_bytes(), "agent01.example.com", &policy).unwrap();
    assert!(decision.signed);
    assert_eq!(decision.reason, DecisionReason::ChallengeMatched);
}

#[test]
fn test_challenge_password_beats_alt_names() {
    let pem = CsrFixture::new("web-1")
        .challenge_password("s3cr3t")
        .dns_alt_name("evil.example.org")
        .to_pem();
    let policy = AutosignPolicy::new()
        .with_challenge_secret("s3cr3t")
        .with_pattern(r"^web-\d+\.example\.com$");

    let decision = decide(pem.as_bytes(), "web-1", &policy).unwrap();
    assert!(decision.signed);
    assert_eq!(decision.reason, DecisionReason::ChallengeMatched);
}

#[test]
fn test_challenge_password_is_trimmed() {
    let pem = CsrFixture::new("agent01")
        .challenge_password("  s3cr3t \n")
        .to_pem();
    let policy = AutosignPolicy::new()
        .with_challenge_secret("s3cr3t")
        .with_pattern("^nomatch$");

    let decision = decide(pem.as_bytes(), "agent01", &policy).unwrap();
    assert_eq!(decision.reason, DecisionReason::ChallengeMatched);
}

#[test]
fn test_wrong_password_falls_through_to_patterns() {
    let pem = CsrFixture::new("db-42").challenge_password("wrong").to_pem();
    let policy = AutosignPolicy::new()
        .with_challenge_secret("s3cr3t")
        .with_pattern(r"^db-\d+$");

    let decision = decide(pem.as_bytes(), "db-42", &policy).unwrap();
    assert!(decision.signed);
    assert_eq!(decision.reason, DecisionReason::HostnamePatternMatched);
    assert_eq!(decision.matched_pattern.as_deref(), Some(r"^db-\d+$"));
    assert!(decision.errors.is_empty());
}

#[test]
fn test_empty_challenge_password_is_recorded() {
    let pem = CsrFixture::new("db-42").empty_challenge_password().to_pem();
    let policy = AutosignPolicy::new()
        .with_challenge_secret("s3cr3t")
        .with_pattern(r"^db-\d+$");

    let decision = decide(pem.as_bytes(), "db-42", &policy).unwrap();
    assert!(decision.signed);
    assert!(matches!(
        decision.last_error(),
        Some(CheckError::AttributeDecode { attribute, .. }) if attribute == "challengePassword"
    ));
}

#[test]
fn test_rcgen_request_without_alt_names() {
    let pem = signed_csr("agent01.example.com", &[]);

    let permissive = decide(pem.as_bytes(), "agent01.example.com", &AutosignPolicy::new()).unwrap();
    assert!(permissive.signed);
    assert_eq!(permissive.reason, DecisionReason::NoDnsAltNamesNoPatterns);

    let strict = AutosignPolicy::new().with_pattern(r"^web-\d+\.example\.com$");
    let denied = decide(pem.as_bytes(), "agent01.example.com", &strict).unwrap();
    assert!(!denied.signed);
    assert_eq!(denied.reason, DecisionReason::NoMatch);
}

#[test]
fn test_rcgen_request_with_alt_names() {
    let pem = signed_csr("web-7", &["web-7.example.com", "www.example.com"]);
    let policy = AutosignPolicy::new()
        .with_pattern(r"^db-\d+$")
        .with_pattern(r"^www\.example\.com$");

    let decision = decide(pem.as_bytes(), "web-7", &policy).unwrap();
    assert!(decision.signed);
    assert_eq!(decision.reason, DecisionReason::HostnamePatternMatched);
    assert_eq!(
        decision.matched_pattern.as_deref(),
        Some(r"^www\.example\.com$")
    );
}

#[test]
fn test_alt_names_without_patterns_deny() {
    let pem = signed_csr("web-7", &["web-7.example.com"]);

    let decision = decide(pem.as_bytes(), "web-7", &AutosignPolicy::new()).unwrap();
    assert!(!decision.signed);
    assert_eq!(decision.reason, DecisionReason::NoMatch);
}

#[test]
fn test_alt_names_ignore_claimed_hostname() {
    let pem = CsrFixture::new("web-1.example.com")
        .dns_alt_name("other.example.org")
        .to_pem();
    let policy = AutosignPolicy::new().with_pattern(r"^web-\d+\.example\.com$");

    let decision = decide(pem.as_bytes(), "web-1.example.com", &policy).unwrap();
    assert!(!decision.signed);
}

#[test]
fn test_malformed_pattern_is_skipped() {
    let pem = signed_csr("db-42", &[]);
    let policy = AutosignPolicy::new()
        .with_pattern("([unclosed")
        .with_pattern(r"^db-\d+$");

    let decision = decide(pem.as_bytes(), "db-42", &policy).unwrap();
    assert!(decision.signed);
    assert!(matches!(
        decision.last_error(),
        Some(CheckError::PatternCompile { pattern, .. }) if pattern == "([unclosed"
    ));
}

#[test]
fn test_puppet_extensions_are_flattened() {
    let pem = CsrFixture::new("agent01")
        .extension(oids::PP_ROLE, "webserver")
        .extension(oids::PP_ENVIRONMENT, "production")
        .dns_alt_name("agent01.example.com")
        .to_pem();

    let csr = CsrDocument::parse(pem.as_bytes()).unwrap();
    assert_eq!(csr.subject_common_name(), "agent01");
    assert_eq!(csr.dns_alt_names(), &["agent01.example.com".to_string()]);
    assert_eq!(
        csr.attribute_string(AttributeName::PpRole).unwrap().as_deref(),
        Some("webserver")
    );
    assert_eq!(
        csr.attribute_string(AttributeName::PpEnvironment)
            .unwrap()
            .as_deref(),
        Some("production")
    );
    assert!(csr.attribute(AttributeName::ExtensionRequest).is_some());
    assert!(csr.attribute(AttributeName::PpUuid).is_none());
}

#[test]
fn test_malformed_input_is_an_error() {
    let policy = AutosignPolicy::new();

    for input in [
        &b"not a pem"[..],
        b"",
        b"-----BEGIN CERTIFICATE REQUEST-----\nAAAA\n-----END CERTIFICATE REQUEST-----\n",
    ] {
        let err = decide(input, "host", &policy).unwrap_err();
        assert!(err.is_malformed_input(), "unexpected error: {err}");
    }
}

#[test]
fn test_wrong_pem_label_is_rejected() {
    let pem = signed_csr("agent01", &[]).replace("CERTIFICATE REQUEST", "CERTIFICATE");

    let err = CsrDocument::parse(pem.as_bytes()).unwrap_err();
    assert!(err.is_malformed_input());
}
