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

//! Autosign configuration file model and discovery.
//!
//! The configuration is a small YAML or JSON document:
//!
//! ```yaml
//! challengePassword: s3cr3t
//! autosignPatterns:
//!   - '^web-\d+\.example\.com$'
//!   - '^db-\d+$'
//! logFile: /var/log/puppetlabs/autosign.log
//! logFormat: text
//! debug: false
//! ```
//!
//! # Search Order
//!
//! 1. Explicit paths (if set via [`ConfigLoader::with_paths`]), first existing wins
//! 2. Environment variable `AUTOSIGN_CONFIG`
//! 3. `/etc/puppetlabs/puppet/autosign.json`
//! 4. `/etc/puppetlabs/puppet/autosign.yaml`
//! 5. `./autosign.json`
//! 6. `./autosign.yaml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AutosignError, Result};
use crate::logging::AuditFormat;
use crate::policy::AutosignPolicy;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "puppetlabs-autosign.log";

/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "AUTOSIGN_CONFIG";

/// Default configuration file candidates, in search order.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "/etc/puppetlabs/puppet/autosign.json",
    "/etc/puppetlabs/puppet/autosign.yaml",
    "autosign.json",
    "autosign.yaml",
];

/// Contents of an autosign configuration file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutosignConfig {
    /// Shared challenge secret; empty disables the challenge check.
    pub challenge_password: String,

    /// Hostname patterns, evaluated in order.
    pub autosign_patterns: Vec<String>,

    /// Audit log destination.
    pub log_file: PathBuf,

    /// Audit log line format (`text` or `json`).
    pub log_format: AuditFormat,

    /// Enable debug-level logging.
    pub debug: bool,
}

impl Default for AutosignConfig {
    fn default() -> Self {
        Self {
            challenge_password: String::new(),
            autosign_patterns: Vec::new(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_format: AuditFormat::Text,
            debug: false,
        }
    }
}

impl std::fmt::Debug for AutosignConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosignConfig")
            .field("challenge_password", &!self.challenge_password.is_empty())
            .field("autosign_patterns", &self.autosign_patterns)
            .field("log_file", &self.log_file)
            .field("log_format", &self.log_format)
            .field("debug", &self.debug)
            .finish()
    }
}

/// On-disk configuration format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML (`.yaml`, `.yml`).
    Yaml,
    /// JSON (`.json`).
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl AutosignConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document is valid and means "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| AutosignError::config(format!("Invalid YAML: {e}")))
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AutosignError::config(format!("Invalid JSON: {e}")))
    }

    /// Read and parse a configuration file, choosing the format by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            AutosignError::config(format!(
                "Unsupported configuration file type: {}",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path).map_err(|e| {
            AutosignError::config(format!("Failed to read {}: {e}", path.display()))
        })?;

        match format {
            ConfigFormat::Yaml => Self::from_yaml(&content),
            ConfigFormat::Json => Self::from_json(&content),
        }
    }

    /// The autosign policy described by this configuration.
    pub fn policy(&self) -> AutosignPolicy {
        AutosignPolicy::new()
            .with_challenge_secret(self.challenge_password.clone())
            .with_patterns(self.autosign_patterns.iter().cloned())
    }
}

/// Configuration file loader with discovery and precedence rules.
///
/// # Example
///
/// ```no_run
/// use puppet_autosign::config::ConfigLoader;
///
/// // Load from default locations
/// let config = ConfigLoader::new().load().unwrap();
///
/// // Load from a specific list of candidates
/// let config = ConfigLoader::new()
///     .with_paths(["/etc/puppetlabs/puppet/autosign.yaml"])
///     .load()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Explicit candidate paths; replaces the default list when non-empty.
    explicit_paths: Vec<PathBuf>,

    /// Environment variable name for config path override.
    env_var_name: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            explicit_paths: Vec::new(),
            env_var_name: CONFIG_ENV_VAR.to_string(),
        }
    }

    /// Set explicit candidate paths, searched in order.
    pub fn with_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.explicit_paths = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        self
    }

    /// Set the environment variable name for path override.
    ///
    /// Default: `AUTOSIGN_CONFIG`
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var_name = name.into();
        self
    }

    /// Load the configuration.
    ///
    /// Falls back to [`AutosignConfig::default`] when no candidate file
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The environment variable names a file that does not exist
    /// - The selected file cannot be read or parsed
    pub fn load(&self) -> Result<AutosignConfig> {
        match self.find_config_file()? {
            Some(path) => {
                tracing::info!("Parsing config file {}", path.display());
                let config = AutosignConfig::from_path(&path)?;
                tracing::debug!("Loaded config {:?}", config);
                Ok(config)
            }
            None => {
                tracing::warn!(
                    "No configuration file found, using defaults. Searched: {}",
                    self.search_paths()
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                Ok(AutosignConfig::default())
            }
        }
    }

    /// Find the configuration file path, if any candidate exists.
    pub fn find_config_file(&self) -> Result<Option<PathBuf>> {
        if self.explicit_paths.is_empty()
            && let Ok(env_path) = std::env::var(&self.env_var_name)
        {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(AutosignError::config(format!(
                "Configuration file from {} not found: {}",
                self.env_var_name, env_path
            )));
        }

        Ok(self.search_paths().into_iter().find(|p| p.exists()))
    }

    /// The candidate paths that are searched, in order.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        if !self.explicit_paths.is_empty() {
            return self.explicit_paths.clone();
        }
        DEFAULT_CONFIG_FILES.iter().map(PathBuf::from).collect()
    }
}
