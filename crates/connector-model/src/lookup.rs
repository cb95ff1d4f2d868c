// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{
    error::ModelError,
    identity::{Code, ExternalIdentity},
};

/// Ways to find a stored element. Only the fields that are present take part in the lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementLookupKey {
    pub id: Option<String>,
    pub federation_guid: Option<String>,
    pub code: Option<Code>,
    pub external_identity: Option<ExternalIdentity>,
}

/// A single discriminant of an [`ElementLookupKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupBy<'a> {
    Id(&'a str),
    FederationGuid(&'a str),
    Code(&'a Code),
    ExternalIdentity(&'a ExternalIdentity),
}

impl ElementLookupKey {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn by_federation_guid(guid: impl Into<String>) -> Self {
        Self {
            federation_guid: Some(guid.into()),
            ..Default::default()
        }
    }

    pub fn by_code(code: Code) -> Self {
        Self {
            code: Some(code),
            ..Default::default()
        }
    }

    pub fn by_external_identity(identity: ExternalIdentity) -> Self {
        Self {
            external_identity: Some(identity),
            ..Default::default()
        }
    }

    /// The discriminants in lookup precedence order: id, federation guid, code, external identity.
    ///
    /// A store tries each in turn and stops at the first one that resolves. A key without any
    /// discriminant is a malformed request.
    pub fn candidates(&self) -> Result<Vec<LookupBy<'_>>, ModelError> {
        let candidates: Vec<_> = [
            self.id.as_deref().map(LookupBy::Id),
            self.federation_guid.as_deref().map(LookupBy::FederationGuid),
            self.code.as_ref().map(LookupBy::Code),
            self.external_identity
                .as_ref()
                .map(LookupBy::ExternalIdentity),
        ]
        .into_iter()
        .flatten()
        .collect();

        if candidates.is_empty() {
            Err(ModelError::EmptyLookupKey)
        } else {
            Ok(candidates)
        }
    }
}

/// Serialized properties of a found element. The JSON is transported, never interpreted.
///
/// On the wire an element that was not found is an `ElementProps` with an empty payload, so a
/// found element whose properties serialize to an empty string is indistinguishable from a miss.
/// Stores never produce such an element: the payload is always a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementProps {
    pub props_json: String,
}
