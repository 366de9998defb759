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

//! Certificate signing hand-off.
//!
//! Once a request is approved, the CA still has to sign it. The
//! [`CertificateSigner`] trait keeps that step out of the policy engine;
//! [`PuppetCertSigner`] shells out to `puppet cert sign`.

use std::path::PathBuf;
use std::process::Command;

use crate::error::{AutosignError, Result};

/// Default `puppet` executable.
pub const DEFAULT_PUPPET_BIN: &str = "/opt/puppetlabs/bin/puppet";

/// Default Puppet SSL directory.
pub const DEFAULT_SSLDIR: &str = "/etc/puppetlabs/puppet/ssl";

/// Something that can sign a pending certificate request.
pub trait CertificateSigner {
    /// Sign the pending request for `hostname`.
    fn sign(&self, hostname: &str) -> Result<()>;
}

/// Signs requests by running `puppet cert sign`.
#[derive(Debug, Clone)]
pub struct PuppetCertSigner {
    binary: PathBuf,
    ssldir: PathBuf,
    allow_dns_alt_names: bool,
}

impl Default for PuppetCertSigner {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_PUPPET_BIN),
            ssldir: PathBuf::from(DEFAULT_SSLDIR),
            allow_dns_alt_names: true,
        }
    }
}

impl PuppetCertSigner {
    /// Create a signer using the default Puppet installation paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different `puppet` executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Use a different SSL directory.
    pub fn with_ssldir(mut self, ssldir: impl Into<PathBuf>) -> Self {
        self.ssldir = ssldir.into();
        self
    }

    /// Control whether `--allow-dns-alt-names` is passed.
    pub fn with_allow_dns_alt_names(mut self, allow: bool) -> Self {
        self.allow_dns_alt_names = allow;
        self
    }

    /// The argument list passed to the executable.
    pub fn args(&self, hostname: &str) -> Vec<String> {
        let mut args = vec!["cert".to_string(), "sign".to_string(), hostname.to_string()];
        if self.allow_dns_alt_names {
            args.push("--allow-dns-alt-names".to_string());
        }
        args.push("--ssldir".to_string());
        args.push(self.ssldir.display().to_string());
        args
    }
}

impl CertificateSigner for PuppetCertSigner {
    fn sign(&self, hostname: &str) -> Result<()> {
        let args = self.args(hostname);
        tracing::info!("Running {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary).args(&args).output().map_err(|e| {
            AutosignError::sign(format!("Failed to run {}: {e}", self.binary.display()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AutosignError::sign(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }

        tracing::info!("Signed certificate for {}", hostname);
        Ok(())
    }
}
