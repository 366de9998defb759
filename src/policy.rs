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

//! Autosign policy values.

/// The resolved autosign policy.
///
/// An empty or absent challenge secret disables the challenge-password
/// check, and an empty pattern list disables hostname matching. Pattern order
/// is significant: the first matching pattern wins.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AutosignPolicy {
    challenge_secret: Option<String>,
    hostname_patterns: Vec<String>,
}

impl std::fmt::Debug for AutosignPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosignPolicy")
            .field("challenge_secret", &self.challenge_secret.is_some())
            .field("hostname_patterns", &self.hostname_patterns)
            .finish()
    }
}

impl AutosignPolicy {
    /// Create a policy with both checks disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shared challenge secret. An empty string disables the check.
    pub fn with_challenge_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.challenge_secret = if secret.is_empty() {
            None
        } else {
            Some(secret)
        };
        self
    }

    /// Append one hostname pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.hostname_patterns.push(pattern.into());
        self
    }

    /// Append hostname patterns, preserving their order.
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hostname_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// The challenge secret, if the challenge check is enabled.
    pub fn challenge_secret(&self) -> Option<&str> {
        self.challenge_secret.as_deref()
    }

    /// Configured hostname patterns, in evaluation order.
    pub fn hostname_patterns(&self) -> &[String] {
        &self.hostname_patterns
    }

    /// Returns true if neither check is configured.
    pub fn is_permissive(&self) -> bool {
        self.challenge_secret.is_none() && self.hostname_patterns.is_empty()
    }
}
