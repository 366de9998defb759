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

//! Certificate request types.
//!
//! [`CsrDocument`] is a parsed PKCS#10 request, flattened into the fields
//! the autosign policy looks at. [`AttributeRegistry`] maps the attribute
//! names Puppet agents use onto their object identifiers.

pub mod attributes;
mod csr;

pub use attributes::{AttributeName, AttributeRegistry, oids};
pub use csr::{AttributeValue, CsrDocument};
