// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;
use connector_model::{
    Code, ElementProps, ExternalIdentity, ExternalSourceAspect, ExternalState, LookupBy,
};
use serde::Serialize;

use crate::error::StoreError;

/// Id of the root subject every import is ultimately scoped to.
pub const ROOT_SUBJECT_ID: &str = "0x1";

/// An element as held by the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    pub class_full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Code>,
    pub properties: serde_json::Value,
}

impl Element {
    /// Always a JSON object, so a found element is never confused with a miss on the wire.
    pub fn props(&self) -> Result<ElementProps, StoreError> {
        Ok(ElementProps {
            props_json: serde_json::to_string(self)?,
        })
    }
}

/// Insert-or-update of one element, optionally with the aspect linking it to its external record.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementWrite {
    pub class_full_name: String,
    pub federation_guid: Option<String>,
    pub code: Option<Code>,
    pub properties: serde_json::Value,
    /// `None` leaves any existing aspect of the element untouched.
    pub aspect: Option<AspectWrite>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AspectWrite {
    pub identity: ExternalIdentity,
    pub state: ExternalState,
    pub json_properties: String,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Inserted,
    Updated,
    /// The write matched the stored content exactly and nothing was changed.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub element_id: String,
    pub aspect_id: Option<String>,
    pub kind: WriteKind,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementRelation {
    pub class_full_name: String,
    pub source_id: String,
    pub target_id: String,
}

/// The driver's storage. Queries must not need exclusive access, as they are answered while the
/// coordinator is writing the records of an in-flight stream.
#[async_trait]
pub trait ElementStore: Send + Sync {
    async fn find_element(&self, by: LookupBy<'_>) -> Result<Option<Element>, StoreError>;

    async fn find_aspect(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<Option<ExternalSourceAspect>, StoreError>;

    /// Locate the target by aspect identity, then federation guid, then code, and update it in
    /// place; insert a new element when none matches.
    async fn upsert_element(&self, write: ElementWrite) -> Result<WriteOutcome, StoreError>;

    /// Returns false when the relation already existed.
    async fn relate(&self, relation: ElementRelation) -> Result<bool, StoreError>;

    /// Relations of class `class_full_name` pointing at `target_id`.
    async fn relations_to(
        &self,
        class_full_name: &str,
        target_id: &str,
    ) -> Result<Vec<ElementRelation>, StoreError>;

    /// Returns false when there was no such relation.
    async fn unrelate(&self, relation: &ElementRelation) -> Result<bool, StoreError>;
}
