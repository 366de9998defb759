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

//! PKCS#10 certificate request decoding.
//!
//! A [`CsrDocument`] is built in two stages: the PEM envelope is stripped to
//! recover the DER bytes, then the DER is parsed as a `CertificationRequest`
//! (RFC 2986). Request attributes and the extensions carried inside the
//! `extensionRequest` attribute are flattened into one map keyed by OID.

use std::collections::BTreeMap;

use base64::prelude::*;
use const_oid::ObjectIdentifier;
use der::asn1::Any;
use der::{Decode, Encode, Tag, Tagged};
use x509_cert::ext::Extension;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::name::Name;
use x509_cert::request::CertReq;

use crate::error::{AutosignError, CheckError, Result};
use crate::types::attributes::{AttributeName, AttributeRegistry, oids};

const PEM_BEGIN: &[u8] = b"-----BEGIN ";
const PEM_END: &[u8] = b"-----END ";
const PEM_DASHES: &[u8] = b"-----";

/// PEM labels accepted for a certificate request.
const CSR_LABELS: &[&str] = &["CERTIFICATE REQUEST", "NEW CERTIFICATE REQUEST"];

/// Raw value of one flattened attribute or requested extension.
///
/// For request attributes this is the DER encoding of the first value in the
/// attribute's value set. For requested extensions it is the content of
/// `extnValue`. A zero-length value is kept: it means "present but empty".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    raw: Vec<u8>,
}

impl AttributeValue {
    /// Wrap raw value bytes.
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self { raw: raw.into() }
    }

    /// The undecoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Returns true when the attribute was present with no value.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Decode the value as a trimmed string.
    ///
    /// DER string types (UTF8String, PrintableString, IA5String,
    /// VisibleString, TeletexString, BMPString) are unwrapped first. Values
    /// that are not DER but are valid UTF-8 text are accepted as-is.
    pub fn as_string(&self) -> std::result::Result<String, String> {
        if self.raw.is_empty() {
            return Err("attribute is present but has no value".to_string());
        }

        let text = match Any::from_der(&self.raw) {
            Ok(any) => decode_directory_string(&any)?,
            Err(_) => String::from_utf8(self.raw.clone())
                .map_err(|e| format!("value is neither DER nor UTF-8: {}", e))?,
        };

        Ok(text.trim().to_string())
    }
}

/// Decode a DER string value into UTF-8.
fn decode_directory_string(any: &Any) -> std::result::Result<String, String> {
    let bytes = any.value();
    match any.tag() {
        Tag::Utf8String
        | Tag::PrintableString
        | Tag::Ia5String
        | Tag::VisibleString
        | Tag::TeletexString => std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| format!("invalid {} contents: {}", any.tag(), e)),
        Tag::BmpString => {
            if bytes.len() % 2 != 0 {
                return Err("BMPString has odd length".to_string());
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).map_err(|e| format!("invalid BMPString: {}", e))
        }
        other => Err(format!("unsupported string type {}", other)),
    }
}

/// A decoded PKCS#10 certificate request.
///
/// Construction either yields a fully populated document or fails with
/// [`AutosignError::MalformedInput`]; the document is read-only afterwards.
#[derive(Debug, Clone)]
pub struct CsrDocument {
    raw_pem: Vec<u8>,
    subject_common_name: String,
    dns_alt_names: Vec<String>,
    attributes: BTreeMap<ObjectIdentifier, AttributeValue>,
}

impl CsrDocument {
    /// Parse a PEM-encoded certificate request.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let der_bytes = decode_pem(raw)?;
        let request = CertReq::from_der(&der_bytes).map_err(|e| {
            AutosignError::malformed_input(format!("not a PKCS#10 certificate request: {}", e))
        })?;
        Self::from_request(raw.to_vec(), &request)
    }

    fn from_request(raw_pem: Vec<u8>, request: &CertReq) -> Result<Self> {
        let subject_common_name = common_name(&request.info.subject);

        let mut attributes = BTreeMap::new();
        let mut dns_alt_names = Vec::new();

        for attribute in request.info.attributes.iter() {
            let first = attribute.values.iter().next();

            if attribute.oid == oids::EXTENSION_REQUEST {
                let Some(value) = first else {
                    attributes.insert(attribute.oid, AttributeValue::new(Vec::new()));
                    continue;
                };
                attributes.insert(attribute.oid, AttributeValue::new(value.to_der()?));
                for extension in requested_extensions(value)? {
                    if extension.extn_id == oids::SUBJECT_ALT_NAME {
                        dns_alt_names.extend(dns_names(&extension)?);
                    }
                    attributes.insert(
                        extension.extn_id,
                        AttributeValue::new(extension.extn_value.as_bytes()),
                    );
                }
                continue;
            }

            let raw = match first {
                Some(value) => value.to_der()?,
                None => Vec::new(),
            };
            attributes.insert(attribute.oid, AttributeValue::new(raw));
        }

        Ok(Self {
            raw_pem,
            subject_common_name,
            dns_alt_names,
            attributes,
        })
    }

    /// The original encoded input.
    pub fn raw_pem(&self) -> &[u8] {
        &self.raw_pem
    }

    /// Subject common name, or an empty string when the subject has none.
    pub fn subject_common_name(&self) -> &str {
        &self.subject_common_name
    }

    /// DNS entries of the requested Subject Alternative Name extension.
    pub fn dns_alt_names(&self) -> &[String] {
        &self.dns_alt_names
    }

    /// Returns true if the request declares at least one DNS alt name.
    pub fn has_dns_alt_names(&self) -> bool {
        !self.dns_alt_names.is_empty()
    }

    /// Look up a flattened attribute by OID.
    ///
    /// `None` means the OID is absent; a present attribute with no value is
    /// returned as an empty [`AttributeValue`].
    pub fn lookup(&self, oid: &ObjectIdentifier) -> Option<&AttributeValue> {
        self.attributes.get(oid)
    }

    /// Look up a flattened attribute by its registered name.
    pub fn attribute(&self, name: AttributeName) -> Option<&AttributeValue> {
        self.lookup(&AttributeRegistry::oid_for(name))
    }

    /// Decode a registered attribute as a string.
    ///
    /// Returns `Ok(None)` when the attribute is absent.
    pub fn attribute_string(
        &self,
        name: AttributeName,
    ) -> std::result::Result<Option<String>, CheckError> {
        match self.attribute(name) {
            None => Ok(None),
            Some(value) => value
                .as_string()
                .map(Some)
                .map_err(|message| CheckError::attribute_decode(name.as_str(), message)),
        }
    }

    /// All flattened attributes in OID order.
    pub fn attributes(&self) -> impl Iterator<Item = (&ObjectIdentifier, &AttributeValue)> {
        self.attributes.iter()
    }

    /// One-line-per-item summary of the request for diagnostic logs.
    ///
    /// Attribute values are reported by length only, so secrets such as the
    /// challenge password never reach a log file.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![format!("Subject CN: {}", self.subject_common_name)];

        if self.dns_alt_names.is_empty() {
            lines.push("DNS alt names: none".to_string());
        } else {
            lines.push(format!("DNS alt names: {}", self.dns_alt_names.join(", ")));
        }

        for (oid, value) in &self.attributes {
            lines.push(format!(
                "Attribute {} ({}): {} bytes",
                AttributeRegistry::describe(oid),
                oid,
                value.as_bytes().len()
            ));
        }

        lines
    }

    /// Build a document directly from decoded parts.
    #[cfg(test)]
    pub(crate) fn from_parts(
        subject_common_name: &str,
        dns_alt_names: &[&str],
        attributes: Vec<(ObjectIdentifier, AttributeValue)>,
    ) -> Self {
        Self {
            raw_pem: Vec::new(),
            subject_common_name: subject_common_name.to_string(),
            dns_alt_names: dns_alt_names.iter().map(|s| s.to_string()).collect(),
            attributes: attributes.into_iter().collect(),
        }
    }
}

/// Strip the PEM envelope and return the DER payload.
///
/// Bytes before the BEGIN line and after the END line are ignored, whatever
/// they are. The body may be wrapped at any width; `Name: value` header lines
/// are skipped.
fn decode_pem(raw: &[u8]) -> Result<Vec<u8>> {
    let start = find(raw, PEM_BEGIN)
        .ok_or_else(|| AutosignError::malformed_input("no PEM block found"))?;
    let (label, rest) = pem_label(&raw[start + PEM_BEGIN.len()..])
        .ok_or_else(|| AutosignError::malformed_input("PEM BEGIN line is truncated"))?;

    let end = find(rest, PEM_END)
        .ok_or_else(|| AutosignError::malformed_input("PEM block has no END line"))?;
    let (end_label, _) = pem_label(&rest[end + PEM_END.len()..])
        .ok_or_else(|| AutosignError::malformed_input("PEM END line is truncated"))?;

    if label != end_label {
        return Err(AutosignError::malformed_input(format!(
            "PEM END label '{}' does not match BEGIN label '{}'",
            String::from_utf8_lossy(end_label),
            String::from_utf8_lossy(label)
        )));
    }
    if !CSR_LABELS.iter().any(|l| l.as_bytes() == label) {
        return Err(AutosignError::malformed_input(format!(
            "unexpected PEM label '{}'",
            String::from_utf8_lossy(label)
        )));
    }

    let body: Vec<u8> = rest[..end]
        .split(|b| *b == b'\n')
        .filter(|line| !line.contains(&b':'))
        .flatten()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    BASE64_STANDARD
        .decode(&body)
        .map_err(|e| AutosignError::malformed_input(format!("invalid PEM body: {}", e)))
}

/// Split `-----` terminated label text off the front of `input`.
fn pem_label(input: &[u8]) -> Option<(&[u8], &[u8])> {
    let len = find(input, PEM_DASHES)?;
    let label = &input[..len];
    if label.contains(&b'\n') {
        return None;
    }
    Some((label, &input[len + PEM_DASHES.len()..]))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Decode the extension list carried by an `extensionRequest` value.
fn requested_extensions(value: &Any) -> Result<Vec<Extension>> {
    Vec::<Extension>::from_der(&value.to_der()?).map_err(|e| {
        AutosignError::malformed_input(format!("invalid extensionRequest attribute: {}", e))
    })
}

fn dns_names(extension: &Extension) -> Result<Vec<String>> {
    let san = SubjectAltName::from_der(extension.extn_value.as_bytes()).map_err(|e| {
        AutosignError::malformed_input(format!("invalid subjectAltName extension: {}", e))
    })?;

    Ok(san
        .0
        .iter()
        .filter_map(|name| match name {
            GeneralName::DnsName(dns) => Some(dns.to_string()),
            _ => None,
        })
        .collect())
}

/// The first CN in `subject`, or an empty string.
///
/// The CN only feeds diagnostics, so a value in an unsupported string type
/// is kept lossily instead of rejecting the request.
fn common_name(subject: &Name) -> String {
    let Some(value) = subject
        .0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid == oids::COMMON_NAME)
        .map(|atv| &atv.value)
    else {
        return String::new();
    };

    decode_directory_string(value).unwrap_or_else(|e| {
        tracing::warn!("Subject common name could not be decoded: {}", e);
        String::from_utf8_lossy(value.value()).into_owned()
    })
}
