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

//! Error types for the autosign gate.
//!
//! Two families live here. [`AutosignError`] is fatal to the current request
//! and is returned through [`Result`]. [`CheckError`] is recorded by a single
//! policy check and carried on the [`Decision`](crate::Decision) for audit; it
//! never stops evaluation.

use thiserror::Error;

/// Result type alias using [`AutosignError`].
pub type Result<T> = std::result::Result<T, AutosignError>;

/// Errors that abort the current autosign request.
#[derive(Debug, Error)]
pub enum AutosignError {
    /// Input is not a PEM block or not a well-formed PKCS#10 request.
    #[error("Malformed certificate request: {0}")]
    MalformedInput(String),

    /// Configuration file could not be located, read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external signing command failed.
    #[error("Signing failed: {0}")]
    Sign(String),

    /// DER encoding/decoding error.
    #[error("DER error: {0}")]
    Der(#[from] der::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AutosignError {
    /// Create a malformed input error with the given message.
    pub fn malformed_input(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a signing error with the given message.
    pub fn sign(msg: impl Into<String>) -> Self {
        Self::Sign(msg.into())
    }

    /// Returns true if the error came from the certificate request itself
    /// rather than from the environment around it.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedInput(_) | Self::Der(_))
    }
}

/// Non-fatal failures raised while running one policy check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// An attribute value could not be read as a string.
    #[error("Attribute {attribute} could not be decoded: {message}")]
    AttributeDecode {
        /// Symbolic name (or dotted OID) of the attribute.
        attribute: String,
        /// Decoder message.
        message: String,
    },

    /// A configured hostname pattern is not a valid regular expression.
    #[error("Pattern '{pattern}' failed to compile: {message}")]
    PatternCompile {
        /// The pattern as configured.
        pattern: String,
        /// Compiler message.
        message: String,
    },
}

impl CheckError {
    /// Create an attribute decode error.
    pub fn attribute_decode(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AttributeDecode {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Create a pattern compile error.
    pub fn pattern_compile(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PatternCompile {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}
