// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Conversions between Store-Query messages and model types.
//!
//! Protobuf cannot tell an unset string from an empty one, and a client in another language may
//! well send an empty `CodeProps` instead of omitting it. Zero-valued discriminants are therefore
//! treated as absent, so they never take part in a lookup.

use connector_model::{
    ChangeDecision, Code, ElementLookupKey, ElementProps, ExternalIdentity, ExternalSourceAspect,
    ExternalState,
};

use crate::{error::WireError, proto};

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

impl From<&ExternalIdentity> for proto::ExternalSourceAspectIdentifier {
    fn from(identity: &ExternalIdentity) -> Self {
        Self {
            scope_id: identity.scope_id.clone(),
            identifier: identity.identifier.clone(),
            kind: identity.kind.clone(),
        }
    }
}

impl TryFrom<proto::ExternalSourceAspectIdentifier> for ExternalIdentity {
    type Error = WireError;

    fn try_from(identifier: proto::ExternalSourceAspectIdentifier) -> Result<Self, Self::Error> {
        let identity = ExternalIdentity {
            scope_id: identifier.scope_id,
            identifier: identifier.identifier,
            kind: identifier.kind,
        };
        identity.validate()?;
        Ok(identity)
    }
}

impl From<&ExternalState> for proto::ExternalSourceState {
    fn from(state: &ExternalState) -> Self {
        Self {
            version: state.version.clone(),
            checksum: state.checksum.clone(),
        }
    }
}

impl From<proto::ExternalSourceState> for ExternalState {
    fn from(state: proto::ExternalSourceState) -> Self {
        Self {
            version: non_empty(state.version),
            checksum: non_empty(state.checksum),
        }
    }
}

impl From<&Code> for proto::CodeProps {
    fn from(code: &Code) -> Self {
        Self {
            spec: code.spec.clone(),
            scope: code.scope.clone(),
            value: code.value.clone(),
        }
    }
}

fn code_from_wire(code: proto::CodeProps) -> Option<Code> {
    if code.spec.is_empty() && code.scope.is_empty() && code.value.is_empty() {
        None
    } else {
        Some(Code {
            spec: code.spec,
            scope: code.scope,
            value: code.value,
        })
    }
}

fn identifier_is_zero(identifier: &proto::ExternalSourceAspectIdentifier) -> bool {
    identifier.scope_id.is_empty() && identifier.identifier.is_empty() && identifier.kind.is_empty()
}

/// Decode a state that must be present, treating an absent message as an empty fingerprint.
pub(crate) fn state_from_wire(state: Option<proto::ExternalSourceState>) -> ExternalState {
    state.map(ExternalState::from).unwrap_or_default()
}

pub(crate) fn identity_from_wire(
    identifier: Option<proto::ExternalSourceAspectIdentifier>,
    message: &'static str,
) -> Result<ExternalIdentity, WireError> {
    identifier
        .ok_or(WireError::MissingField {
            field: "identifier",
            message,
        })?
        .try_into()
}

impl From<&ElementLookupKey> for proto::TryGetElementPropsRequest {
    fn from(key: &ElementLookupKey) -> Self {
        Self {
            id64: key.id.clone(),
            federation_guid: key.federation_guid.clone(),
            code: key.code.as_ref().map(Into::into),
            external_source_aspect_identifier: key.external_identity.as_ref().map(Into::into),
        }
    }
}

impl TryFrom<proto::TryGetElementPropsRequest> for ElementLookupKey {
    type Error = WireError;

    fn try_from(request: proto::TryGetElementPropsRequest) -> Result<Self, Self::Error> {
        let external_identity = match request.external_source_aspect_identifier {
            Some(identifier) if !identifier_is_zero(&identifier) => Some(identifier.try_into()?),
            _ => None,
        };

        let key = ElementLookupKey {
            id: non_empty(request.id64),
            federation_guid: non_empty(request.federation_guid),
            code: request.code.and_then(code_from_wire),
            external_identity,
        };
        key.candidates()?;

        Ok(key)
    }
}

/// A miss travels as an empty payload.
impl From<Option<ElementProps>> for proto::ElementProps {
    fn from(props: Option<ElementProps>) -> Self {
        Self {
            props_json: props.map(|props| props.props_json).unwrap_or_default(),
        }
    }
}

impl From<proto::ElementProps> for Option<ElementProps> {
    fn from(props: proto::ElementProps) -> Self {
        (!props.props_json.is_empty()).then_some(ElementProps {
            props_json: props.props_json,
        })
    }
}

impl From<&ExternalSourceAspect> for proto::ExternalSourceAspectProps {
    fn from(aspect: &ExternalSourceAspect) -> Self {
        Self {
            id: aspect.id.clone(),
            element_id: aspect.element_id.clone(),
            identifier: Some((&aspect.identity).into()),
            state: Some((&aspect.state).into()),
            json_properties: aspect.json_properties.clone(),
            source: aspect.source.clone(),
        }
    }
}

impl TryFrom<proto::ExternalSourceAspectProps> for ExternalSourceAspect {
    type Error = WireError;

    fn try_from(props: proto::ExternalSourceAspectProps) -> Result<Self, Self::Error> {
        Ok(Self {
            identity: identity_from_wire(props.identifier, "ExternalSourceAspectProps")?,
            state: state_from_wire(props.state),
            id: props.id,
            element_id: props.element_id,
            json_properties: props.json_properties,
            source: non_empty(props.source),
        })
    }
}

impl proto::DetectChangeRequest {
    pub fn new(identity: &ExternalIdentity, state: &ExternalState) -> Self {
        Self {
            identifier: Some(identity.into()),
            state: Some(state.into()),
        }
    }

    pub fn into_model(self) -> Result<(ExternalIdentity, ExternalState), WireError> {
        Ok((
            identity_from_wire(self.identifier, "DetectChangeRequest")?,
            state_from_wire(self.state),
        ))
    }
}

impl From<ChangeDecision> for proto::DetectChangeResult {
    fn from(decision: ChangeDecision) -> Self {
        Self {
            element_id: decision.element_id,
            external_source_aspect_id: decision.external_source_aspect_id,
            is_changed: decision.is_changed,
        }
    }
}

impl From<proto::DetectChangeResult> for ChangeDecision {
    fn from(result: proto::DetectChangeResult) -> Self {
        Self {
            element_id: non_empty(result.element_id),
            external_source_aspect_id: non_empty(result.external_source_aspect_id),
            is_changed: result.is_changed,
        }
    }
}
