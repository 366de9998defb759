//! Certificate request fixtures shared by the integration tests.

#![allow(dead_code)]

use std::str::FromStr;

use const_oid::ObjectIdentifier;
use der::asn1::{Any, BitString, Ia5String, OctetString, SetOfVec};
use der::pem::LineEnding;
use der::{Decode, Encode, Tag};
use rcgen::{CertificateParams, DnType, KeyPair};
use x509_cert::attr::Attribute;
use x509_cert::ext::Extension;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, Version};
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use puppet_autosign::types::oids;

/// rsaEncryption
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// sha256WithRSAEncryption
const SHA256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

/// Generate a signed CSR with rcgen.
pub fn signed_csr(common_name: &str, san_dns: &[&str]) -> String {
    let mut params =
        CertificateParams::new(san_dns.iter().map(|s| s.to_string()).collect::<Vec<_>>())
            .unwrap();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    let key_pair = KeyPair::generate().unwrap();
    params.serialize_request(&key_pair).unwrap().pem().unwrap()
}

/// Hand-assembled certificate request.
///
/// The signature and key are placeholders; the autosign policy never
/// verifies them.
#[derive(Debug, Default)]
pub struct CsrFixture {
    common_name: String,
    challenge_password: Option<String>,
    empty_challenge_password: bool,
    dns_alt_names: Vec<String>,
    extensions: Vec<(ObjectIdentifier, String)>,
}

impl CsrFixture {
    /// Start a fixture for the given subject common name.
    pub fn new(common_name: &str) -> Self {
        Self {
            common_name: common_name.to_string(),
            ..Default::default()
        }
    }

    /// Add a challengePassword attribute, encoded as a PrintableString.
    pub fn challenge_password(mut self, password: &str) -> Self {
        self.challenge_password = Some(password.to_string());
        self
    }

    /// Add a challengePassword attribute with an empty value set.
    pub fn empty_challenge_password(mut self) -> Self {
        self.empty_challenge_password = true;
        self
    }

    /// Add a DNS subject alternative name.
    pub fn dns_alt_name(mut self, name: &str) -> Self {
        self.dns_alt_names.push(name.to_string());
        self
    }

    /// Request an extension carrying a UTF8String value.
    pub fn extension(mut self, oid: ObjectIdentifier, value: &str) -> Self {
        self.extensions.push((oid, value.to_string()));
        self
    }

    /// Encode the request as PEM.
    pub fn to_pem(&self) -> String {
        let der_bytes = self.build().to_der().unwrap();
        der::pem::encode_string("CERTIFICATE REQUEST", LineEnding::LF, &der_bytes).unwrap()
    }

    fn build(&self) -> CertReq {
        let mut attributes = Vec::new();

        if let Some(password) = &self.challenge_password {
            let value = Any::new(Tag::PrintableString, password.as_bytes().to_vec()).unwrap();
            attributes.push(Attribute {
                oid: oids::CHALLENGE_PASSWORD,
                values: SetOfVec::try_from(vec![value]).unwrap(),
            });
        } else if self.empty_challenge_password {
            attributes.push(Attribute {
                oid: oids::CHALLENGE_PASSWORD,
                values: SetOfVec::new(),
            });
        }

        let extensions = self.requested_extensions();
        if !extensions.is_empty() {
            let value = Any::from_der(&extensions.to_der().unwrap()).unwrap();
            attributes.push(Attribute {
                oid: oids::EXTENSION_REQUEST,
                values: SetOfVec::try_from(vec![value]).unwrap(),
            });
        }

        let name = format!("CN={}", self.common_name);
        let info = CertReqInfo {
            version: Version::V1,
            subject: Name::from_str(&name).unwrap(),
            public_key: SubjectPublicKeyInfoOwned {
                algorithm: AlgorithmIdentifierOwned {
                    oid: RSA_ENCRYPTION,
                    parameters: None,
                },
                subject_public_key: BitString::from_bytes(&[0x00; 16]).unwrap(),
            },
            attributes: SetOfVec::try_from(attributes).unwrap(),
        };

        CertReq {
            info,
            algorithm: AlgorithmIdentifierOwned {
                oid: SHA256_WITH_RSA,
                parameters: None,
            },
            signature: BitString::from_bytes(&[0x00; 16]).unwrap(),
        }
    }

    fn requested_extensions(&self) -> Vec<Extension> {
        let mut extensions = Vec::new();

        if !self.dns_alt_names.is_empty() {
            let names = self
                .dns_alt_names
                .iter()
                .map(|name| GeneralName::DnsName(Ia5String::new(name).unwrap()))
                .collect();
            extensions.push(Extension {
                extn_id: oids::SUBJECT_ALT_NAME,
                critical: false,
                extn_value: OctetString::new(SubjectAltName(names).to_der().unwrap()).unwrap(),
            });
        }

        for (oid, value) in &self.extensions {
            let encoded = Any::new(Tag::Utf8String, value.as_bytes().to_vec())
                .unwrap()
                .to_der()
                .unwrap();
            extensions.push(Extension {
                extn_id: *oid,
                critical: false,
                extn_value: OctetString::new(encoded).unwrap(),
            });
        }

        extensions
    }
}
