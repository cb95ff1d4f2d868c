// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use connector_model::{Code, ExternalIdentity, ExternalSourceAspect, LookupBy};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    error::StoreError,
    store::{
        Element, ElementRelation, ElementStore, ElementWrite, ROOT_SUBJECT_ID, WriteKind,
        WriteOutcome,
    },
};

fn owned_elsewhere<'a>(owner: Option<&'a String>, target: Option<&str>) -> Option<&'a String> {
    owner.filter(|owner| Some(owner.as_str()) != target)
}

#[derive(Debug)]
struct StoreState {
    next_id: u64,
    elements: BTreeMap<String, Element>,
    by_federation_guid: HashMap<String, String>,
    by_code: HashMap<Code, String>,
    aspects: HashMap<ExternalIdentity, ExternalSourceAspect>,
    relations: BTreeSet<ElementRelation>,
}

impl StoreState {
    fn new() -> Self {
        let root = Element {
            id: ROOT_SUBJECT_ID.to_string(),
            class_full_name: "Subject".to_string(),
            federation_guid: None,
            code: None,
            properties: json!({}),
        };

        Self {
            next_id: 2,
            elements: BTreeMap::from([(root.id.clone(), root)]),
            by_federation_guid: HashMap::new(),
            by_code: HashMap::new(),
            aspects: HashMap::new(),
            relations: BTreeSet::new(),
        }
    }

    fn allocate_id(&mut self) -> String {
        let id = format!("0x{:x}", self.next_id);
        self.next_id += 1;
        id
    }

    fn find(&self, by: LookupBy<'_>) -> Option<&Element> {
        let id = match by {
            LookupBy::Id(id) => Some(id),
            LookupBy::FederationGuid(guid) => self.by_federation_guid.get(guid).map(String::as_str),
            LookupBy::Code(code) => self.by_code.get(code).map(String::as_str),
            LookupBy::ExternalIdentity(identity) => self
                .aspects
                .get(identity)
                .map(|aspect| aspect.element_id.as_str()),
        }?;
        self.elements.get(id)
    }

    fn target_of(&self, write: &ElementWrite) -> Option<String> {
        let by_identity = write
            .aspect
            .as_ref()
            .and_then(|aspect| self.aspects.get(&aspect.identity))
            .map(|aspect| &aspect.element_id);
        let by_guid = write
            .federation_guid
            .as_ref()
            .and_then(|guid| self.by_federation_guid.get(guid));
        let by_code = write.code.as_ref().and_then(|code| self.by_code.get(code));

        by_identity.or(by_guid).or(by_code).cloned()
    }

    fn check_unique_keys(
        &self,
        write: &ElementWrite,
        target: Option<&str>,
    ) -> Result<(), StoreError> {
        if let Some(guid) = &write.federation_guid {
            if let Some(owner) = owned_elsewhere(self.by_federation_guid.get(guid), target) {
                return Err(StoreError::DuplicateFederationGuid {
                    guid: guid.clone(),
                    owner: owner.clone(),
                });
            }
        }
        if let Some(code) = &write.code {
            if let Some(owner) = owned_elsewhere(self.by_code.get(code), target) {
                return Err(StoreError::DuplicateCode {
                    spec: code.spec.clone(),
                    scope: code.scope.clone(),
                    value: code.value.clone(),
                    owner: owner.clone(),
                });
            }
        }
        Ok(())
    }

    fn unindex(&mut self, element: &Element) {
        if let Some(guid) = &element.federation_guid {
            self.by_federation_guid.remove(guid);
        }
        if let Some(code) = &element.code {
            self.by_code.remove(code);
        }
    }

    fn index(&mut self, element: &Element) {
        if let Some(guid) = &element.federation_guid {
            self.by_federation_guid
                .insert(guid.clone(), element.id.clone());
        }
        if let Some(code) = &element.code {
            self.by_code.insert(code.clone(), element.id.clone());
        }
    }

    fn upsert(&mut self, write: ElementWrite) -> Result<WriteOutcome, StoreError> {
        if let Some(aspect) = &write.aspect {
            aspect.identity.validate()?;
        }

        let target = self.target_of(&write);
        self.check_unique_keys(&write, target.as_deref())?;

        let element_id = match &target {
            Some(id) => id.clone(),
            None => self.allocate_id(),
        };

        let element = Element {
            id: element_id.clone(),
            class_full_name: write.class_full_name,
            federation_guid: write.federation_guid,
            code: write.code,
            properties: write.properties,
        };

        let aspect = match write.aspect {
            Some(aspect_write) => {
                let reused_id = self
                    .aspects
                    .get(&aspect_write.identity)
                    .filter(|existing| existing.element_id == element_id)
                    .map(|existing| existing.id.clone());
                let id = match reused_id {
                    Some(id) => id,
                    None => self.allocate_id(),
                };
                Some(ExternalSourceAspect {
                    id,
                    element_id: element_id.clone(),
                    identity: aspect_write.identity,
                    state: aspect_write.state,
                    json_properties: aspect_write.json_properties,
                    source: aspect_write.source,
                })
            }
            None => None,
        };
        let aspect_id = aspect.as_ref().map(|aspect| aspect.id.clone());

        let kind = match self.elements.get(&element_id).cloned() {
            None => WriteKind::Inserted,
            Some(previous) => {
                let element_unchanged = previous == element;
                let aspect_unchanged = aspect
                    .as_ref()
                    .is_none_or(|aspect| self.aspects.get(&aspect.identity) == Some(aspect));

                if element_unchanged && aspect_unchanged {
                    return Ok(WriteOutcome {
                        element_id,
                        aspect_id,
                        kind: WriteKind::Unchanged,
                    });
                }
                self.unindex(&previous);
                WriteKind::Updated
            }
        };

        self.index(&element);
        self.elements.insert(element_id.clone(), element);
        if let Some(aspect) = aspect {
            self.aspects.insert(aspect.identity.clone(), aspect);
        }

        Ok(WriteOutcome {
            element_id,
            aspect_id,
            kind,
        })
    }
}

/// Store kept entirely in memory, behind a single readers-writer lock.
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::new()),
        }
    }

    pub async fn element_count(&self) -> usize {
        self.state.read().await.elements.len()
    }

    pub async fn relations(&self) -> Vec<ElementRelation> {
        self.state.read().await.relations.iter().cloned().collect()
    }
}

#[async_trait]
impl ElementStore for InMemoryStore {
    async fn find_element(&self, by: LookupBy<'_>) -> Result<Option<Element>, StoreError> {
        Ok(self.state.read().await.find(by).cloned())
    }

    async fn find_aspect(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<Option<ExternalSourceAspect>, StoreError> {
        Ok(self.state.read().await.aspects.get(identity).cloned())
    }

    async fn upsert_element(&self, write: ElementWrite) -> Result<WriteOutcome, StoreError> {
        let outcome = self.state.write().await.upsert(write)?;
        debug!(
            element_id = %outcome.element_id,
            kind = ?outcome.kind,
            "Element written"
        );
        Ok(outcome)
    }

    async fn relate(&self, relation: ElementRelation) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        for id in [&relation.source_id, &relation.target_id] {
            if !state.elements.contains_key(id) {
                return Err(StoreError::UnknownElement(id.clone()));
            }
        }
        Ok(state.relations.insert(relation))
    }

    async fn relations_to(
        &self,
        class_full_name: &str,
        target_id: &str,
    ) -> Result<Vec<ElementRelation>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .relations
            .iter()
            .filter(|relation| {
                relation.class_full_name == class_full_name && relation.target_id == target_id
            })
            .cloned()
            .collect())
    }

    async fn unrelate(&self, relation: &ElementRelation) -> Result<bool, StoreError> {
        Ok(self.state.write().await.relations.remove(relation))
    }
}

#[cfg(test)]
mod tests {
    use connector_model::ExternalState;

    use super::*;
    use crate::store::AspectWrite;

    fn group_write(name: &str, properties: serde_json::Value) -> ElementWrite {
        ElementWrite {
            class_full_name: "Group".into(),
            federation_guid: None,
            code: Some(Code::new("Group", "0x2", name)),
            properties,
            aspect: None,
        }
    }

    fn with_aspect(mut write: ElementWrite, identifier: &str, checksum: &str) -> ElementWrite {
        write.aspect = Some(AspectWrite {
            identity: ExternalIdentity::new("0x2", identifier, "Group"),
            state: ExternalState::with_checksum(checksum),
            json_properties: write.properties.to_string(),
            source: Some("0x2".into()),
        });
        write
    }

    #[tokio::test]
    async fn identical_write_is_a_no_op() {
        let store = InMemoryStore::new();
        let write = with_aspect(group_write("A", json!({"Name": "A"})), "A", "abc");

        let first = store.upsert_element(write.clone()).await.unwrap();
        assert_eq!(first.kind, WriteKind::Inserted);

        let second = store.upsert_element(write).await.unwrap();
        assert_eq!(second.kind, WriteKind::Unchanged);
        assert_eq!(second.element_id, first.element_id);
        assert_eq!(second.aspect_id, first.aspect_id);
    }

    #[tokio::test]
    async fn placeholder_is_completed_through_its_code() {
        let store = InMemoryStore::new();
        let placeholder = store
            .upsert_element(group_write("A", json!({"Name": "A"})))
            .await
            .unwrap();

        let full = store
            .upsert_element(with_aspect(
                group_write("A", json!({"Name": "A", "Color": "red"})),
                "A",
                "abc",
            ))
            .await
            .unwrap();

        assert_eq!(full.kind, WriteKind::Updated);
        assert_eq!(full.element_id, placeholder.element_id);
        let identity = ExternalIdentity::new("0x2", "A", "Group");
        let aspect = store.find_aspect(&identity).await.unwrap().unwrap();
        assert_eq!(aspect.element_id, placeholder.element_id);
    }

    #[tokio::test]
    async fn federation_guid_is_unique() {
        let store = InMemoryStore::new();
        let mut first = group_write("A", json!({}));
        first.federation_guid = Some("guid-1".into());
        store.upsert_element(first).await.unwrap();

        let mut second = group_write("B", json!({}));
        second.federation_guid = Some("guid-1".into());
        assert!(matches!(
            store.upsert_element(second).await,
            Err(StoreError::DuplicateFederationGuid { .. })
        ));
    }

    #[tokio::test]
    async fn relations_need_existing_elements() {
        let store = InMemoryStore::new();
        let group = store
            .upsert_element(group_write("A", json!({})))
            .await
            .unwrap();

        let relation = ElementRelation {
            class_full_name: "ElementGroupsMembers".into(),
            source_id: group.element_id.clone(),
            target_id: ROOT_SUBJECT_ID.into(),
        };
        assert!(store.relate(relation.clone()).await.unwrap());
        assert!(!store.relate(relation).await.unwrap());

        let dangling = ElementRelation {
            class_full_name: "ElementGroupsMembers".into(),
            source_id: group.element_id,
            target_id: "0xff".into(),
        };
        assert!(matches!(
            store.relate(dangling).await,
            Err(StoreError::UnknownElement(id)) if id == "0xff"
        ));
    }

    #[tokio::test]
    async fn relations_are_found_by_target_and_removed() {
        let store = InMemoryStore::new();
        let a = store.upsert_element(group_write("A", json!({}))).await.unwrap();
        let b = store.upsert_element(group_write("B", json!({}))).await.unwrap();

        let member_of = |group: &WriteOutcome| ElementRelation {
            class_full_name: "ElementGroupsMembers".into(),
            source_id: group.element_id.clone(),
            target_id: ROOT_SUBJECT_ID.into(),
        };
        store.relate(member_of(&a)).await.unwrap();
        store.relate(member_of(&b)).await.unwrap();
        store
            .relate(ElementRelation {
                class_full_name: "OtherRelationship".into(),
                ..member_of(&a)
            })
            .await
            .unwrap();

        let members = store
            .relations_to("ElementGroupsMembers", ROOT_SUBJECT_ID)
            .await
            .unwrap();
        assert_eq!(members, vec![member_of(&a), member_of(&b)]);

        assert!(store.unrelate(&member_of(&a)).await.unwrap());
        assert!(!store.unrelate(&member_of(&a)).await.unwrap());
        assert_eq!(
            store
                .relations_to("ElementGroupsMembers", ROOT_SUBJECT_ID)
                .await
                .unwrap(),
            vec![member_of(&b)]
        );
        assert_eq!(store.relations().await.len(), 2);
    }
}
