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

//! Symbolic attribute names and their OIDs.
//!
//! Policy code refers to CSR attributes by [`AttributeName`] and resolves the
//! OID through [`AttributeRegistry`], so numeric identifiers only ever appear
//! in the [`oids`] table below. The table covers the PKCS#9 attributes a
//! Puppet agent sends and the Puppet registered extension namespace
//! (`1.3.6.1.4.1.34380`).

use std::fmt;

use const_oid::ObjectIdentifier;

/// Well-known OIDs found in Puppet certificate requests.
///
/// The `PP_*` constants carry the Puppet short name of the same spelling.
pub mod oids {
    #![allow(missing_docs)]

    use const_oid::ObjectIdentifier;

    /// Challenge Password OID (1.2.840.113549.1.9.7)
    pub const CHALLENGE_PASSWORD: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.7");

    /// Extension Request OID (1.2.840.113549.1.9.14)
    pub const EXTENSION_REQUEST: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.14");

    /// Subject Alternative Name OID (2.5.29.17)
    pub const SUBJECT_ALT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.17");

    /// Common Name OID (2.5.4.3)
    pub const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

    pub const PP_UUID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.1");
    pub const PP_INSTANCE_ID: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.2");
    pub const PP_IMAGE_NAME: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.3");
    pub const PP_PRESHARED_KEY: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.4");
    pub const PP_COST_CENTER: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.5");
    pub const PP_PRODUCT: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.6");
    pub const PP_PROJECT: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.7");
    pub const PP_APPLICATION: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.8");
    pub const PP_SERVICE: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.9");
    pub const PP_EMPLOYEE: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.10");
    pub const PP_CREATED_BY: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.11");
    pub const PP_ENVIRONMENT: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.12");
    pub const PP_ROLE: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.13");
    pub const PP_SOFTWARE_VERSION: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.14");
    pub const PP_DEPARTMENT: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.15");
    pub const PP_CLUSTER: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.16");
    pub const PP_PROVISIONER: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.17");
    pub const PP_REGION: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.18");
    pub const PP_DATACENTER: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.19");
    pub const PP_ZONE: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.20");
    pub const PP_NETWORK: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.21");
    pub const PP_SECURITYPOLICY: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.22");
    pub const PP_CLOUDPLATFORM: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.23");
    pub const PP_APPTIER: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.24");
    pub const PP_HOSTNAME: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.1.25");

    /// Puppet authorization extension arc.
    pub const PP_AUTHORIZATION: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.3.1");
    pub const PP_AUTH_ROLE: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.4.1.34380.1.3.13");
}

macro_rules! attribute_names {
    ($($variant:ident => $name:literal, $oid:path;)+) => {
        /// Symbolic name of a CSR attribute or requested extension.
        ///
        /// Names are spelled exactly as Puppet spells them in `csr_attributes.yaml`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum AttributeName {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl AttributeName {
            /// Every registered name, in table order.
            pub const ALL: &'static [AttributeName] = &[$(AttributeName::$variant,)+];

            /// The symbolic name as Puppet spells it.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(AttributeName::$variant => $name,)+
                }
            }

            /// The OID registered for this name.
            pub const fn oid(&self) -> ObjectIdentifier {
                match self {
                    $(AttributeName::$variant => $oid,)+
                }
            }
        }
    };
}

attribute_names! {
    ChallengePassword => "challengePassword", oids::CHALLENGE_PASSWORD;
    ExtensionRequest => "extensionRequest", oids::EXTENSION_REQUEST;
    SubjectAltName => "subjectAltName", oids::SUBJECT_ALT_NAME;
    PpUuid => "pp_uuid", oids::PP_UUID;
    PpInstanceId => "pp_instance_id", oids::PP_INSTANCE_ID;
    PpImageName => "pp_image_name", oids::PP_IMAGE_NAME;
    PpPresharedKey => "pp_preshared_key", oids::PP_PRESHARED_KEY;
    PpCostCenter => "pp_cost_center", oids::PP_COST_CENTER;
    PpProduct => "pp_product", oids::PP_PRODUCT;
    PpProject => "pp_project", oids::PP_PROJECT;
    PpApplication => "pp_application", oids::PP_APPLICATION;
    PpService => "pp_service", oids::PP_SERVICE;
    PpEmployee => "pp_employee", oids::PP_EMPLOYEE;
    PpCreatedBy => "pp_created_by", oids::PP_CREATED_BY;
    PpEnvironment => "pp_environment", oids::PP_ENVIRONMENT;
    PpRole => "pp_role", oids::PP_ROLE;
    PpSoftwareVersion => "pp_software_version", oids::PP_SOFTWARE_VERSION;
    PpDepartment => "pp_department", oids::PP_DEPARTMENT;
    PpCluster => "pp_cluster", oids::PP_CLUSTER;
    PpProvisioner => "pp_provisioner", oids::PP_PROVISIONER;
    PpRegion => "pp_region", oids::PP_REGION;
    PpDatacenter => "pp_datacenter", oids::PP_DATACENTER;
    PpZone => "pp_zone", oids::PP_ZONE;
    PpNetwork => "pp_network", oids::PP_NETWORK;
    PpSecuritypolicy => "pp_securitypolicy", oids::PP_SECURITYPOLICY;
    PpCloudplatform => "pp_cloudplatform", oids::PP_CLOUDPLATFORM;
    PpApptier => "pp_apptier", oids::PP_APPTIER;
    PpHostname => "pp_hostname", oids::PP_HOSTNAME;
    PpAuthorization => "pp_authorization", oids::PP_AUTHORIZATION;
    PpAuthRole => "pp_auth_role", oids::PP_AUTH_ROLE;
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed name-to-OID table.
///
/// The table is compiled into the binary, so lookups never fail and need no
/// synchronisation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeRegistry;

impl AttributeRegistry {
    /// Resolve the OID for a symbolic name.
    pub const fn oid_for(name: AttributeName) -> ObjectIdentifier {
        name.oid()
    }

    /// Reverse lookup, used when describing a request.
    pub fn name_for(oid: &ObjectIdentifier) -> Option<AttributeName> {
        AttributeName::ALL
            .iter()
            .copied()
            .find(|name| name.oid() == *oid)
    }

    /// Human-readable label for an OID: the symbolic name when registered,
    /// otherwise the dotted form.
    pub fn describe(oid: &ObjectIdentifier) -> String {
        match Self::name_for(oid) {
            Some(name) => name.as_str().to_string(),
            None => oid.to_string(),
        }
    }
}
