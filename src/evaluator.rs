// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Autosign decision protocol.
//!
//! Evaluation is a fixed, short-circuiting chain:
//!
//! 1. **Challenge password.** When the policy holds a secret and the request
//!    carries a `challengePassword` attribute, an exact match grants. A
//!    mismatch, a missing attribute or an undecodable value falls through.
//! 2. **DNS alt names / hostname patterns.**
//!    - No DNS alt names and no patterns: grant.
//!    - No DNS alt names: match the claimed hostname against the patterns.
//!    - DNS alt names present: match each alt name in turn; with no
//!      patterns this denies.
//!
//! Patterns are tried in order and the first match wins. A pattern that
//! fails to compile is recorded on the [`Decision`] and skipped.
//!
//! # Example
//!
//! ```no_run
//! use puppet_autosign::{AutosignPolicy, CsrDocument, PolicyEvaluator};
//!
//! # fn example(pem: &[u8]) -> puppet_autosign::Result<()> {
//! let policy = AutosignPolicy::new()
//!     .with_challenge_secret("s3cr3t")
//!     .with_pattern(r"^web-\d+\.example\.com$");
//!
//! let csr = CsrDocument::parse(pem)?;
//! let decision = PolicyEvaluator::new(&policy).evaluate(&csr, "web-1.example.com");
//! println!("{}: {}", decision.reason, decision.detail);
//! # Ok(())
//! # }
//! ```

use std::fmt;

use regex::Regex;

use crate::error::{AutosignError, CheckError};
use crate::logging::{self, LogEntry, LogLevel, Logger};
use crate::policy::AutosignPolicy;
use crate::types::{AttributeName, CsrDocument};

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionReason {
    /// The challenge password matched the configured secret.
    ChallengeMatched,
    /// A hostname pattern matched the hostname or a DNS alt name.
    HostnamePatternMatched,
    /// No DNS alt names were requested and no patterns are configured.
    NoDnsAltNamesNoPatterns,
    /// Every check was exhausted without a match.
    NoMatch,
    /// The request could not be evaluated.
    Error,
}

impl DecisionReason {
    /// Stable identifier used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChallengeMatched => "challenge_matched",
            Self::HostnamePatternMatched => "hostname_pattern_matched",
            Self::NoDnsAltNamesNoPatterns => "no_dns_alt_names_no_patterns",
            Self::NoMatch => "no_match",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one autosign evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the request should be signed.
    pub signed: bool,
    /// The rule that produced the decision.
    pub reason: DecisionReason,
    /// Human-readable explanation.
    pub detail: String,
    /// The pattern that matched, for [`DecisionReason::HostnamePatternMatched`].
    pub matched_pattern: Option<String>,
    /// Non-fatal errors raised by individual checks, in the order seen.
    pub errors: Vec<CheckError>,
}

impl Decision {
    fn grant(reason: DecisionReason, detail: impl Into<String>) -> Self {
        Self {
            signed: true,
            reason,
            detail: detail.into(),
            matched_pattern: None,
            errors: Vec::new(),
        }
    }

    fn deny(reason: DecisionReason, detail: impl Into<String>) -> Self {
        Self {
            signed: false,
            reason,
            detail: detail.into(),
            matched_pattern: None,
            errors: Vec::new(),
        }
    }

    /// A denial describing a request that could not be evaluated.
    pub fn from_error(error: &AutosignError) -> Self {
        Self::deny(DecisionReason::Error, error.to_string())
    }

    /// The last non-fatal error recorded, if any.
    pub fn last_error(&self) -> Option<&CheckError> {
        self.errors.last()
    }

    fn with_errors(mut self, errors: Vec<CheckError>) -> Self {
        self.errors = errors;
        self
    }
}

/// Result of a single policy check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckOutcome {
    /// Whether the check passed.
    pub satisfied: bool,
    /// The pattern that matched, for pattern checks.
    pub matched_pattern: Option<String>,
    /// Errors raised while running the check.
    pub errors: Vec<CheckError>,
}

impl CheckOutcome {
    fn not_satisfied() -> Self {
        Self::default()
    }
}

/// Applies an [`AutosignPolicy`] to certificate requests.
///
/// The evaluator holds no mutable state; one instance can serve any number
/// of requests, from any number of threads.
#[derive(Clone, Copy)]
pub struct PolicyEvaluator<'a> {
    policy: &'a AutosignPolicy,
    sink: Option<&'a dyn Logger>,
}

impl fmt::Debug for PolicyEvaluator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyEvaluator")
            .field("policy", self.policy)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl<'a> PolicyEvaluator<'a> {
    /// Create an evaluator for the given policy.
    pub fn new(policy: &'a AutosignPolicy) -> Self {
        Self { policy, sink: None }
    }

    /// Forward evaluation events to an audit log sink.
    pub fn with_sink(mut self, sink: &'a dyn Logger) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Decide whether `csr`, claimed by `hostname`, should be autosigned.
    pub fn evaluate(&self, csr: &CsrDocument, hostname: &str) -> Decision {
        self.emit(
            LogLevel::Info,
            format!("Checking certificate for {}", hostname),
            &[("hostname", hostname)],
        );

        let challenge = self.check_challenge(csr);
        let mut errors = challenge.errors;
        if challenge.satisfied {
            return self.finish(
                hostname,
                Decision::grant(
                    DecisionReason::ChallengeMatched,
                    format!("challenge password matched for {}", hostname),
                )
                .with_errors(errors),
            );
        }

        let decision = if !csr.has_dns_alt_names() {
            self.emit(LogLevel::Info, "No DNS alt names", &[("hostname", hostname)]);

            if self.policy.hostname_patterns().is_empty() {
                Decision::grant(
                    DecisionReason::NoDnsAltNamesNoPatterns,
                    format!(
                        "{} requests no DNS alt names and no autosign patterns are configured",
                        hostname
                    ),
                )
            } else {
                let outcome = self.check_patterns(hostname);
                errors.extend(outcome.errors);
                match outcome.matched_pattern {
                    Some(pattern) => Decision {
                        matched_pattern: Some(pattern.clone()),
                        ..Decision::grant(
                            DecisionReason::HostnamePatternMatched,
                            format!("hostname {} matched pattern '{}'", hostname, pattern),
                        )
                    },
                    None => Decision::deny(
                        DecisionReason::NoMatch,
                        format!("hostname {} matched no autosign pattern", hostname),
                    ),
                }
            }
        } else if self.policy.hostname_patterns().is_empty() {
            Decision::deny(
                DecisionReason::NoMatch,
                format!(
                    "{} requests DNS alt names [{}] but no autosign patterns are configured",
                    hostname,
                    csr.dns_alt_names().join(", ")
                ),
            )
        } else {
            let mut matched = None;
            for dns_name in csr.dns_alt_names() {
                let outcome = self.check_patterns(dns_name);
                for error in outcome.errors {
                    if !errors.contains(&error) {
                        errors.push(error);
                    }
                }
                if let Some(pattern) = outcome.matched_pattern {
                    matched = Some((dns_name.clone(), pattern));
                    break;
                }
            }

            match matched {
                Some((dns_name, pattern)) => Decision {
                    matched_pattern: Some(pattern.clone()),
                    ..Decision::grant(
                        DecisionReason::HostnamePatternMatched,
                        format!("DNS alt name {} matched pattern '{}'", dns_name, pattern),
                    )
                },
                None => Decision::deny(
                    DecisionReason::NoMatch,
                    format!("no DNS alt name of {} matched an autosign pattern", hostname),
                ),
            }
        };

        self.finish(hostname, decision.with_errors(errors))
    }

    /// Deny a request that could not be evaluated, recording why.
    pub fn reject(&self, hostname: &str, error: &AutosignError) -> Decision {
        self.emit(
            LogLevel::Error,
            format!("Unable to evaluate request for {}: {}", hostname, error),
            &[("hostname", hostname)],
        );
        self.finish(hostname, Decision::from_error(error))
    }

    /// Compare the request's challenge password with the configured secret.
    ///
    /// Not satisfied when the check is disabled, the attribute is absent,
    /// the value cannot be decoded, or the value differs.
    pub fn check_challenge(&self, csr: &CsrDocument) -> CheckOutcome {
        let Some(secret) = self.policy.challenge_secret() else {
            return CheckOutcome::not_satisfied();
        };

        match csr.attribute_string(AttributeName::ChallengePassword) {
            Ok(None) => {
                self.emit(LogLevel::Debug, "No challenge password in request", &[]);
                CheckOutcome::not_satisfied()
            }
            Ok(Some(password)) => {
                let satisfied = password.as_bytes() == secret.as_bytes();
                if satisfied {
                    self.emit(LogLevel::Info, "Challenge password matched", &[]);
                } else {
                    self.emit(LogLevel::Info, "Challenge password did not match", &[]);
                }
                CheckOutcome {
                    satisfied,
                    ..CheckOutcome::default()
                }
            }
            Err(error) => {
                self.emit(
                    LogLevel::Warn,
                    format!("Error parsing challenge password: {}", error),
                    &[],
                );
                CheckOutcome {
                    errors: vec![error],
                    ..CheckOutcome::default()
                }
            }
        }
    }

    /// Match `candidate` against the configured patterns, first match wins.
    pub fn check_patterns(&self, candidate: &str) -> CheckOutcome {
        let mut outcome = CheckOutcome::not_satisfied();

        for pattern in self.policy.hostname_patterns() {
            self.emit(
                LogLevel::Debug,
                format!("Checking pattern '{}'", pattern),
                &[("candidate", candidate)],
            );

            let regex = match Regex::new(pattern) {
                Ok(regex) => regex,
                Err(e) => {
                    let message = e.to_string();
                    self.emit(
                        LogLevel::Warn,
                        format!("Failed to compile pattern '{}'", pattern),
                        &[("error", message.as_str())],
                    );
                    outcome
                        .errors
                        .push(CheckError::pattern_compile(pattern.as_str(), message));
                    continue;
                }
            };

            if regex.is_match(candidate) {
                self.emit(
                    LogLevel::Info,
                    format!("Matching pattern '{}' for {}", pattern, candidate),
                    &[],
                );
                outcome.satisfied = true;
                outcome.matched_pattern = Some(pattern.clone());
                return outcome;
            }
        }

        outcome
    }

    fn finish(&self, hostname: &str, decision: Decision) -> Decision {
        let verdict = if decision.signed { "Sign" } else { "Do not sign" };
        self.emit(
            LogLevel::Info,
            format!("{} {}: {}", verdict, hostname, decision.detail),
            &[("hostname", hostname), ("reason", decision.reason.as_str())],
        );
        decision
    }

    fn emit(&self, level: LogLevel, message: impl Into<String>, fields: &[(&str, &str)]) {
        let entry = fields
            .iter()
            .fold(LogEntry::new(level, message), |entry, (k, v)| {
                entry.with_field(*k, *v)
            });
        logging::record(self.sink, entry);
    }
}

/// Evaluate `csr` for `hostname` against `policy` with no audit sink.
pub fn evaluate(csr: &CsrDocument, hostname: &str, policy: &AutosignPolicy) -> Decision {
    PolicyEvaluator::new(policy).evaluate(csr, hostname)
}
