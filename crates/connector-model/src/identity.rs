// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Digest;

use crate::error::ModelError;

/// Identifies a record in the external source, independent of where the driver stores it.
///
/// The aspect table is keyed by this triple, so it must be unique within an import run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIdentity {
    pub scope_id: String,
    pub identifier: String,
    pub kind: String,
}

impl ExternalIdentity {
    pub fn new(
        scope_id: impl Into<String>,
        identifier: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            scope_id: scope_id.into(),
            identifier: identifier.into(),
            kind: kind.into(),
        }
    }

    /// An identity must at least name the record; the scope may be empty for sources without one.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.identifier.is_empty() {
            return Err(ModelError::InvalidField {
                field: "identifier",
                container: "ExternalIdentity",
            });
        }
        if self.kind.is_empty() {
            return Err(ModelError::InvalidField {
                field: "kind",
                container: "ExternalIdentity",
            });
        }
        Ok(())
    }
}

impl Display for ExternalIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}@{}", self.kind, self.identifier, self.scope_id)
    }
}

/// Fingerprint of an external record's content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl ExternalState {
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            checksum: None,
        }
    }

    pub fn with_checksum(checksum: impl Into<String>) -> Self {
        Self {
            version: None,
            checksum: Some(checksum.into()),
        }
    }

    /// Fingerprint a JSON payload by the sha256 of its serialized form. Object keys are sorted
    /// first, so equal content yields equal checksums regardless of the source's key order.
    pub fn of_content(content: &Value) -> Self {
        let digest = sha2::Sha256::digest(sorted_keys(content).to_string().as_bytes());
        Self::with_checksum(base16ct::lower::encode_string(&digest))
    }

    /// No version and no checksum: nothing to compare against.
    pub fn is_empty(&self) -> bool {
        self.version.is_none() && self.checksum.is_none()
    }
}

// Maps keep insertion order when serde_json's `preserve_order` is enabled anywhere in the build
fn sorted_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), sorted_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_keys).collect()),
        other => other.clone(),
    }
}

/// Driver-side business key, an alternate way to find an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Code {
    pub spec: String,
    pub scope: String,
    pub value: String,
}

impl Code {
    pub fn new(
        spec: impl Into<String>,
        scope: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            spec: spec.into(),
            scope: scope.into(),
            value: value.into(),
        }
    }
}
