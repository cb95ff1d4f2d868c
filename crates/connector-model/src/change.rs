// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    error::ModelError,
    identity::{ExternalIdentity, ExternalState},
};

/// The durable link between a stored element and the external record that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSourceAspect {
    pub id: String,
    pub element_id: String,
    pub identity: ExternalIdentity,
    pub state: ExternalState,
    pub json_properties: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Outcome of comparing a fingerprint against the stored aspect for an identity.
///
/// `is_changed` absent means no aspect exists yet (first import), `Some(false)` means the record
/// can be skipped and `Some(true)` means it must be re-imported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDecision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source_aspect_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_changed: Option<bool>,
}

impl ChangeDecision {
    pub fn never_seen() -> Self {
        Self::default()
    }

    pub fn for_aspect(aspect: &ExternalSourceAspect, is_changed: bool) -> Self {
        Self {
            element_id: Some(aspect.element_id.clone()),
            external_source_aspect_id: Some(aspect.id.clone()),
            is_changed: Some(is_changed),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.is_changed == Some(false)
    }
}

/// How absent fingerprint fields are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FingerprintPolicy {
    /// A field absent on either side matches anything.
    #[default]
    Wildcard,
    /// A field present in the request but absent in the stored state counts as a change.
    Strict,
}

impl FingerprintPolicy {
    /// Decide whether `requested` differs from `stored` for the aspect of `identity`.
    ///
    /// A side without any fingerprint cannot vouch for its content and is treated as changed,
    /// unless both sides are empty, in which case there is nothing to compare and the request is
    /// malformed.
    pub fn is_changed(
        &self,
        identity: &ExternalIdentity,
        requested: &ExternalState,
        stored: &ExternalState,
    ) -> Result<bool, ModelError> {
        match (requested.is_empty(), stored.is_empty()) {
            (true, true) => Err(ModelError::EmptyFingerprintComparison(identity.to_string())),
            (true, false) | (false, true) => Ok(true),
            (false, false) => Ok(self.field_differs(&requested.version, &stored.version)
                || self.field_differs(&requested.checksum, &stored.checksum)),
        }
    }

    fn field_differs(&self, requested: &Option<String>, stored: &Option<String>) -> bool {
        match (requested, stored) {
            (Some(requested), Some(stored)) => requested != stored,
            (Some(_), None) => matches!(self, FingerprintPolicy::Strict),
            (None, _) => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wildcard => "wildcard",
            Self::Strict => "strict",
        }
    }
}

impl FromStr for FingerprintPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wildcard" => Ok(Self::Wildcard),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "Invalid fingerprint policy '{other}' (expected 'wildcard' or 'strict')"
            )),
        }
    }
}
