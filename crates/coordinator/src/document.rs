// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The source document itself is tracked like a record: an element linking to it, with an aspect
//! whose version is the file's modification time. Records of the source are scoped to that
//! element.

use std::time::UNIX_EPOCH;

use connector_model::{Code, ExternalIdentity, ExternalState, FingerprintPolicy};
use serde_json::json;
use store_service::{AspectWrite, ElementStore, ElementWrite, ROOT_SUBJECT_ID, queries};
use tracing::{debug, warn};

use crate::error::CoordinatorError;

pub(crate) const DOCUMENT_KIND: &str = "Document";
pub(crate) const REPOSITORY_LINK_CLASS: &str = "RepositoryLink";

pub(crate) struct SourceDocument {
    locator: String,
    identity: ExternalIdentity,
    state: ExternalState,
    element_id: String,
}

impl SourceDocument {
    /// Find or create the element linking to `locator`, without touching its aspect.
    pub(crate) async fn register(
        store: &dyn ElementStore,
        locator: &str,
    ) -> Result<Self, CoordinatorError> {
        let outcome = store.upsert_element(link_write(locator, None)).await?;

        Ok(Self {
            locator: locator.to_string(),
            identity: ExternalIdentity::new(ROOT_SUBJECT_ID, locator, DOCUMENT_KIND),
            state: modification_state(locator).await,
            element_id: outcome.element_id,
        })
    }

    pub(crate) fn element_id(&self) -> &str {
        &self.element_id
    }

    /// A document whose modification time is unknown is always considered changed.
    pub(crate) async fn is_unchanged(
        &self,
        store: &dyn ElementStore,
        policy: FingerprintPolicy,
    ) -> Result<bool, CoordinatorError> {
        if self.state.is_empty() {
            return Ok(false);
        }
        let decision = queries::detect_change(store, policy, &self.identity, &self.state).await?;
        Ok(decision.is_unchanged())
    }

    /// Record the imported version, once all of its records are written.
    pub(crate) async fn commit(&self, store: &dyn ElementStore) -> Result<(), CoordinatorError> {
        let aspect = AspectWrite {
            identity: self.identity.clone(),
            state: self.state.clone(),
            json_properties: json!({ "url": self.locator }).to_string(),
            source: None,
        };
        store
            .upsert_element(link_write(&self.locator, Some(aspect)))
            .await?;

        debug!(locator = %self.locator, version = ?self.state.version, "Source document committed");
        Ok(())
    }
}

fn link_write(locator: &str, aspect: Option<AspectWrite>) -> ElementWrite {
    ElementWrite {
        class_full_name: REPOSITORY_LINK_CLASS.to_string(),
        federation_guid: None,
        code: Some(Code::new(REPOSITORY_LINK_CLASS, ROOT_SUBJECT_ID, locator)),
        properties: json!({ "url": locator }),
        aspect,
    }
}

async fn modification_state(locator: &str) -> ExternalState {
    let modified = tokio::fs::metadata(locator)
        .await
        .and_then(|metadata| metadata.modified());

    match modified.map(|time| time.duration_since(UNIX_EPOCH)) {
        Ok(Ok(since_epoch)) => ExternalState::with_version(since_epoch.as_millis().to_string()),
        Ok(Err(_)) | Err(_) => {
            warn!(%locator, "Modification time of the source is unavailable");
            ExternalState::default()
        }
    }
}
