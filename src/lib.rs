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

//! # puppet-autosign
//!
//! A policy-based autosign engine for Puppet certificate signing requests.
//!
//! The Puppet CA runs an autosign command for every pending request, passing
//! the certname as an argument and the PEM-encoded CSR on stdin. This crate
//! decides whether that request should be signed.
//!
//! ## Decision Order
//!
//! 1. A `challengePassword` attribute equal to the configured secret grants.
//! 2. A request without DNS alt names is granted when no patterns are
//!    configured, otherwise its hostname must match a pattern.
//! 3. A request with DNS alt names is granted only when one of those names
//!    matches a pattern.
//!
//! ## Quick Start
//!
//! ```no_run
//! use puppet_autosign::{AutosignPolicy, decide};
//!
//! # fn example(pem: &[u8]) -> puppet_autosign::Result<()> {
//! let policy = AutosignPolicy::new()
//!     .with_challenge_secret("s3cr3t")
//!     .with_pattern(r"^web-\d+\.example\.com$");
//!
//! let decision = decide(pem, "web-1.example.com", &policy)?;
//! if decision.signed {
//!     println!("approved: {}", decision.detail);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`ConfigLoader`] finds a YAML or JSON [`AutosignConfig`] in the standard
//! Puppet locations; [`AutosignConfig::policy`] turns it into a policy.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod evaluator;
pub mod logging;
pub mod policy;
pub mod signer;
pub mod types;

// Re-export main types at crate root for convenience
pub use config::{AutosignConfig, ConfigLoader};
pub use error::{AutosignError, CheckError, Result};
pub use evaluator::{CheckOutcome, Decision, DecisionReason, PolicyEvaluator, evaluate};
pub use policy::AutosignPolicy;
pub use signer::{CertificateSigner, PuppetCertSigner};
pub use types::{AttributeName, AttributeRegistry, AttributeValue, CsrDocument};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a PEM-encoded request and evaluate it against `policy`.
///
/// # Errors
///
/// Returns [`AutosignError::MalformedInput`] (or [`AutosignError::Der`]) if
/// `raw` is not a PEM-encoded PKCS#10 request.
pub fn decide(raw: &[u8], hostname: &str, policy: &AutosignPolicy) -> Result<Decision> {
    let csr = CsrDocument::parse(raw)?;
    Ok(evaluate(&csr, hostname, policy))
}
