// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use connector_model::{
    ChangeDecision, Code, ExternalIdentity, ExternalState, FingerprintPolicy, GROUP_KIND,
    GroupRecord, LookupBy, Record, SourceRecord, StreamedRecord, TileRecord,
};
use serde_json::json;
use store_service::{AspectWrite, ElementRelation, ElementStore, ElementWrite, queries};
use tracing::{debug, info};

use crate::{error::CoordinatorError, summary::ImportSummary};

pub(crate) const GROUP_CLASS: &str = "Group";
pub(crate) const GROUP_MEMBERS_RELATIONSHIP: &str = "ElementGroupsMembers";

/// Writes the records of one source document into the store.
pub(crate) struct RecordWriter {
    store: Arc<dyn ElementStore>,
    policy: FingerprintPolicy,
    trust_reader_decisions: bool,
    document_id: String,
}

impl RecordWriter {
    pub(crate) fn new(
        store: Arc<dyn ElementStore>,
        policy: FingerprintPolicy,
        trust_reader_decisions: bool,
        document_id: &str,
    ) -> Self {
        Self {
            store,
            policy,
            trust_reader_decisions,
            document_id: document_id.to_string(),
        }
    }

    pub(crate) async fn write(
        &self,
        streamed: StreamedRecord,
        summary: &mut ImportSummary,
    ) -> Result<(), CoordinatorError> {
        let StreamedRecord {
            record,
            reader_decision,
        } = streamed;
        summary.count_record(&record);

        let source = record.source();
        if self.trust_reader_decisions
            && reader_decision
                .as_ref()
                .is_some_and(ChangeDecision::is_unchanged)
        {
            debug!(identity = %source.identity, "Reader found the record unchanged");
            summary.unchanged += 1;
            return Ok(());
        }

        // Without a fingerprint there is nothing to compare, the write itself catches no-ops
        if !source.state.is_empty() {
            let decision = queries::detect_change(
                self.store.as_ref(),
                self.policy,
                &source.identity,
                &source.state,
            )
            .await?;
            if decision.is_unchanged() {
                debug!(identity = %source.identity, "Record unchanged");
                summary.unchanged += 1;
                return Ok(());
            }
        }

        match &record {
            Record::Tile(tile) => {
                let outcome = self.store.upsert_element(self.tile_write(tile)).await?;
                summary.count_write(outcome.kind);

                self.update_membership(
                    &outcome.element_id,
                    &source.identity.scope_id,
                    tile.group_name(),
                    summary,
                )
                .await?;
            }
            Record::Group(group) => {
                let outcome = self.store.upsert_element(self.group_write(group)).await?;
                summary.count_write(outcome.kind);
            }
        }
        Ok(())
    }

    fn tile_write(&self, tile: &TileRecord) -> ElementWrite {
        ElementWrite {
            class_full_name: tile.shape.clone(),
            federation_guid: Some(tile.source.identity.identifier.clone()),
            code: None,
            properties: tile.source.properties.clone(),
            aspect: Some(self.aspect_write(&tile.source)),
        }
    }

    fn group_write(&self, group: &GroupRecord) -> ElementWrite {
        ElementWrite {
            class_full_name: GROUP_CLASS.to_string(),
            federation_guid: None,
            code: Some(self.group_code(group.name())),
            properties: group.source.properties.clone(),
            aspect: Some(self.aspect_write(&group.source)),
        }
    }

    fn aspect_write(&self, source: &SourceRecord) -> AspectWrite {
        AspectWrite {
            identity: source.identity.clone(),
            state: source.state.clone(),
            json_properties: source.properties.to_string(),
            source: Some(self.document_id.clone()),
        }
    }

    fn group_code(&self, name: &str) -> Code {
        Code::new(GROUP_KIND, &self.document_id, name)
    }

    /// Make `group` the only group the tile belongs to, dropping memberships it had before.
    async fn update_membership(
        &self,
        tile_id: &str,
        scope_id: &str,
        group: Option<&str>,
        summary: &mut ImportSummary,
    ) -> Result<(), CoordinatorError> {
        let group_id = match group {
            Some(name) => Some(self.group_id(scope_id, name, summary).await?),
            None => None,
        };

        for stale in self
            .store
            .relations_to(GROUP_MEMBERS_RELATIONSHIP, tile_id)
            .await?
        {
            if group_id.as_ref() != Some(&stale.source_id) && self.store.unrelate(&stale).await? {
                summary.memberships_removed += 1;
                info!(%tile_id, group_id = %stale.source_id, "Tile left its group");
            }
        }

        if let Some(group_id) = group_id {
            let added = self
                .store
                .relate(ElementRelation {
                    class_full_name: GROUP_MEMBERS_RELATIONSHIP.to_string(),
                    source_id: group_id,
                    target_id: tile_id.to_string(),
                })
                .await?;
            if added {
                summary.memberships += 1;
            }
        }
        Ok(())
    }

    /// The group named `name`, creating a placeholder if it has not been read yet. The placeholder
    /// carries the group's identity, so the group record completes it later.
    async fn group_id(
        &self,
        scope_id: &str,
        name: &str,
        summary: &mut ImportSummary,
    ) -> Result<String, CoordinatorError> {
        let code = self.group_code(name);
        if let Some(group) = self.store.find_element(LookupBy::Code(&code)).await? {
            return Ok(group.id);
        }

        let properties = json!({ "name": name });
        let placeholder = GroupRecord {
            source: SourceRecord {
                identity: ExternalIdentity::new(scope_id, name, GROUP_KIND),
                state: ExternalState::of_content(&properties),
                properties,
            },
        };
        let outcome = self.store.upsert_element(self.group_write(&placeholder)).await?;
        summary.placeholders += 1;

        info!(group = %name, element_id = %outcome.element_id, "Placeholder group created");
        Ok(outcome.element_id)
    }
}
