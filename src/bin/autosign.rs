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

//! Puppet CA Autosign Command
//!
//! Invoked by the Puppet CA for every pending certificate request, with the
//! agent's certname as the only argument and the PEM-encoded CSR on stdin.
//!
//! # Usage
//!
//! ```text
//! autosign [OPTIONS] <HOSTNAME>
//!
//! Options:
//!   -c, --config <PATH>      Configuration file(s) to search, in order
//!       --csr <PATH>         Read the CSR from a file instead of stdin
//!       --debug              Enable debug logging
//!   -q, --quiet              Suppress non-error output
//!       --sign               Sign approved requests with `puppet cert sign`
//!       --puppet-bin <PATH>  Path to the puppet executable
//!       --ssldir <PATH>      Puppet SSL directory
//!   -h, --help               Print help
//!   -V, --version            Print version
//! ```
//!
//! # Exit Codes
//!
//! - `0`: the request should be signed
//! - `1`: the request should not be signed
//! - `2`: the request or configuration could not be processed

use clap::Parser;
use puppet_autosign::logging::{self, FileLogger, LogEntry, LogLevel, Logger};
use puppet_autosign::signer::{DEFAULT_PUPPET_BIN, DEFAULT_SSLDIR};
use puppet_autosign::{
    AutosignConfig, AutosignError, CertificateSigner, ConfigLoader, CsrDocument, PolicyEvaluator,
    PuppetCertSigner,
};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_DENIED: u8 = 1;
const EXIT_ERROR: u8 = 2;

/// Puppet CA Autosign Command
#[derive(Parser)]
#[command(name = "autosign")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Policy-based autosigning for Puppet certificate requests", long_about = None)]
struct Cli {
    /// Certname of the requesting agent
    #[arg(value_name = "HOSTNAME")]
    hostname: String,

    /// Configuration file(s) to search, in order
    #[arg(short, long, value_name = "PATH", value_delimiter = ',')]
    config: Vec<PathBuf>,

    /// Read the CSR from a file instead of stdin
    #[arg(long, value_name = "PATH")]
    csr: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,

    /// Sign approved requests with `puppet cert sign`
    #[arg(long)]
    sign: bool,

    /// Path to the puppet executable
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PUPPET_BIN)]
    puppet_bin: PathBuf,

    /// Puppet SSL directory
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SSLDIR)]
    ssldir: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_DENIED),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Evaluate the request; `Ok(true)` means it was approved.
fn run(cli: &Cli) -> Result<bool, AutosignError> {
    let config = load_config(cli)?;
    let sink = open_audit_log(&config, cli.debug);
    let sink_ref = sink.as_ref().map(|logger| logger as &dyn Logger);

    let policy = config.policy();
    let mut evaluator = PolicyEvaluator::new(&policy);
    if let Some(sink) = sink_ref {
        evaluator = evaluator.with_sink(sink);
    }

    let csr = match read_csr(cli).and_then(|raw| CsrDocument::parse(&raw)) {
        Ok(csr) => csr,
        Err(e) => {
            evaluator.reject(&cli.hostname, &e);
            return Err(e);
        }
    };

    if cli.debug || config.debug {
        for line in csr.describe() {
            logging::record(sink_ref, LogEntry::new(LogLevel::Debug, line));
        }
    }

    let decision = evaluator.evaluate(&csr, &cli.hostname);
    for error in &decision.errors {
        tracing::warn!("{}", error);
    }

    if !decision.signed {
        return Ok(false);
    }

    if cli.sign {
        let signer = PuppetCertSigner::new()
            .with_binary(&cli.puppet_bin)
            .with_ssldir(&cli.ssldir);
        if let Err(e) = signer.sign(&cli.hostname) {
            logging::record(sink_ref, LogEntry::new(LogLevel::Error, e.to_string()));
            return Err(e);
        }
    }

    Ok(true)
}

fn load_config(cli: &Cli) -> Result<AutosignConfig, AutosignError> {
    let mut loader = ConfigLoader::new();
    if !cli.config.is_empty() {
        loader = loader.with_paths(&cli.config);
    }
    loader.load()
}

/// Open the audit log; a failure here is reported but does not stop evaluation.
fn open_audit_log(config: &AutosignConfig, debug: bool) -> Option<FileLogger> {
    let level = if debug || config.debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    match FileLogger::open(&config.log_file, level) {
        Ok(logger) => Some(logger.with_format(config.log_format)),
        Err(e) => {
            tracing::warn!("Unable to open log file {}: {}", config.log_file.display(), e);
            None
        }
    }
}

fn read_csr(cli: &Cli) -> Result<Vec<u8>, AutosignError> {
    match &cli.csr {
        Some(path) => std::fs::read(path).map_err(AutosignError::from),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}
