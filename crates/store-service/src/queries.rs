// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The Store-Query operations, independent of the transport. The driver calls these directly for
//! its own checks; the gRPC service answers the reader with the same functions.

use connector_model::{
    ChangeDecision, ElementLookupKey, ElementProps, ExternalIdentity, ExternalSourceAspect,
    ExternalState, FingerprintPolicy,
};
use tracing::debug;

use crate::{error::StoreError, store::ElementStore};

/// Props of the first element the key resolves to, trying discriminants in precedence order.
pub async fn try_get_element_props(
    store: &dyn ElementStore,
    key: &ElementLookupKey,
) -> Result<Option<ElementProps>, StoreError> {
    for by in key.candidates()? {
        if let Some(element) = store.find_element(by).await? {
            debug!(element_id = %element.id, lookup = ?by, "Element found");
            return element.props().map(Some);
        }
    }
    Ok(None)
}

pub async fn get_external_source_aspect(
    store: &dyn ElementStore,
    identity: &ExternalIdentity,
) -> Result<Option<ExternalSourceAspect>, StoreError> {
    identity.validate()?;
    store.find_aspect(identity).await
}

pub async fn detect_change(
    store: &dyn ElementStore,
    policy: FingerprintPolicy,
    identity: &ExternalIdentity,
    state: &ExternalState,
) -> Result<ChangeDecision, StoreError> {
    identity.validate()?;

    let decision = match store.find_aspect(identity).await? {
        None => ChangeDecision::never_seen(),
        Some(aspect) => {
            let is_changed = policy.is_changed(identity, state, &aspect.state)?;
            ChangeDecision::for_aspect(&aspect, is_changed)
        }
    };

    debug!(%identity, is_changed = ?decision.is_changed, "Change detected");
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use connector_model::{Code, ModelError};
    use serde_json::json;

    use super::*;
    use crate::{
        memory::InMemoryStore,
        store::{AspectWrite, ElementWrite},
    };

    fn tile_write(identity: &ExternalIdentity, checksum: &str) -> ElementWrite {
        let properties = json!({"guid": "tile-guid"});
        ElementWrite {
            class_full_name: "Tile".into(),
            federation_guid: Some("tile-guid".into()),
            code: Some(Code::new("Tile", "0x1", "tile-guid")),
            aspect: Some(AspectWrite {
                identity: identity.clone(),
                state: ExternalState::with_checksum(checksum),
                json_properties: properties.to_string(),
                source: None,
            }),
            properties,
        }
    }

    #[tokio::test]
    async fn detect_change_follows_the_stored_checksum() {
        let store = InMemoryStore::new();
        let identity = ExternalIdentity::new("s", "1", "k");
        let policy = FingerprintPolicy::default();

        let fresh = detect_change(&store, policy, &identity, &ExternalState::with_checksum("abc"))
            .await
            .unwrap();
        assert_eq!(fresh, ChangeDecision::never_seen());

        let written = store
            .upsert_element(tile_write(&identity, "abc"))
            .await
            .unwrap();

        let same = detect_change(&store, policy, &identity, &ExternalState::with_checksum("abc"))
            .await
            .unwrap();
        assert_eq!(same.is_changed, Some(false));
        assert_eq!(same.element_id, Some(written.element_id.clone()));
        assert_eq!(same.external_source_aspect_id, written.aspect_id);

        let different =
            detect_change(&store, policy, &identity, &ExternalState::with_checksum("xyz"))
                .await
                .unwrap();
        assert_eq!(different.is_changed, Some(true));
    }

    #[tokio::test]
    async fn empty_comparison_is_rejected() {
        let store = InMemoryStore::new();
        let identity = ExternalIdentity::new("s", "1", "k");
        let mut write = tile_write(&identity, "abc");
        if let Some(aspect) = write.aspect.as_mut() {
            aspect.state = ExternalState::default();
        }
        store.upsert_element(write).await.unwrap();

        let result = detect_change(
            &store,
            FingerprintPolicy::Wildcard,
            &identity,
            &ExternalState::default(),
        )
        .await;
        assert!(matches!(
            result,
            Err(StoreError::Model(ModelError::EmptyFingerprintComparison(_)))
        ));
    }

    #[tokio::test]
    async fn aspect_round_trips_properties_and_state() {
        let store = InMemoryStore::new();
        let identity = ExternalIdentity::new("s", "1", "k");
        store
            .upsert_element(tile_write(&identity, "abc"))
            .await
            .unwrap();

        let aspect = get_external_source_aspect(&store, &identity)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(aspect.json_properties, r#"{"guid":"tile-guid"}"#);
        assert_eq!(aspect.state, ExternalState::with_checksum("abc"));

        let unknown = ExternalIdentity::new("s", "2", "k");
        assert_eq!(
            get_external_source_aspect(&store, &unknown).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn lookup_precedence_and_misses() {
        let store = InMemoryStore::new();
        let identity = ExternalIdentity::new("s", "1", "k");
        let written = store
            .upsert_element(tile_write(&identity, "abc"))
            .await
            .unwrap();

        // The id misses, so the federation guid decides
        let key = ElementLookupKey {
            id: Some("0xfff".into()),
            federation_guid: Some("tile-guid".into()),
            ..Default::default()
        };
        let props = try_get_element_props(&store, &key).await.unwrap().unwrap();
        let props: serde_json::Value = serde_json::from_str(&props.props_json).unwrap();
        assert_eq!(props["id"], json!(written.element_id));
        assert_eq!(props["classFullName"], "Tile");

        let by_code = ElementLookupKey::by_code(Code::new("Tile", "0x1", "tile-guid"));
        assert!(
            try_get_element_props(&store, &by_code)
                .await
                .unwrap()
                .is_some()
        );

        let miss = ElementLookupKey::by_external_identity(ExternalIdentity::new("s", "9", "k"));
        assert_eq!(try_get_element_props(&store, &miss).await.unwrap(), None);

        assert!(matches!(
            try_get_element_props(&store, &ElementLookupKey::default()).await,
            Err(StoreError::Model(ModelError::EmptyLookupKey))
        ));
    }
}
