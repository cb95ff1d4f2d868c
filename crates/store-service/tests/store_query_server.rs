// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{sync::Arc, time::Duration};

use connector_model::{Code, ExternalIdentity, ExternalState, FingerprintPolicy};
use connector_proto::{StoreQueryClient, proto};
use serde_json::json;
use store_service::{
    AspectWrite, ElementStore, ElementWrite, InMemoryStore, StoreQueryService, StoreServer,
};
use test_log::test;

async fn start(store: Arc<InMemoryStore>) -> (StoreServer, StoreQueryClient<tonic::transport::Channel>) {
    let service = StoreQueryService::new(store, FingerprintPolicy::Wildcard);
    let server = StoreServer::start(service, "127.0.0.1").await.unwrap();
    let client = StoreQueryClient::connect(format!("http://{}", server.address()))
        .await
        .unwrap();
    (server, client)
}

fn detect_request(checksum: &str) -> proto::DetectChangeRequest {
    proto::DetectChangeRequest::new(
        &ExternalIdentity::new("s", "1", "k"),
        &ExternalState::with_checksum(checksum),
    )
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn detect_change_over_the_wire() {
    let store = Arc::new(InMemoryStore::new());
    let (server, mut client) = start(store.clone()).await;

    let fresh = client
        .detect_change(detect_request("abc"))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(fresh, proto::DetectChangeResult::default());

    let properties = json!({"Name": "one"});
    store
        .upsert_element(ElementWrite {
            class_full_name: "Tile".into(),
            federation_guid: None,
            code: None,
            aspect: Some(AspectWrite {
                identity: ExternalIdentity::new("s", "1", "k"),
                state: ExternalState::with_checksum("abc"),
                json_properties: properties.to_string(),
                source: None,
            }),
            properties,
        })
        .await
        .unwrap();

    let same = client
        .detect_change(detect_request("abc"))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(same.is_changed, Some(false));
    assert!(same.element_id.is_some());
    assert!(same.external_source_aspect_id.is_some());

    let changed = client
        .detect_change(detect_request("xyz"))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(changed.is_changed, Some(true));

    server.stop(Duration::from_secs(5)).await.unwrap();
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn code_lookup_ignores_zero_valued_discriminants() {
    let store = Arc::new(InMemoryStore::new());
    store
        .upsert_element(ElementWrite {
            class_full_name: "Group".into(),
            federation_guid: None,
            code: Some(Code::new("Group", "0x2", "A")),
            properties: json!({"Name": "A"}),
            aspect: None,
        })
        .await
        .unwrap();
    let (server, mut client) = start(store).await;

    let code = proto::CodeProps {
        spec: "Group".into(),
        scope: "0x2".into(),
        value: "A".into(),
    };
    let code_only = proto::TryGetElementPropsRequest {
        code: Some(code.clone()),
        ..Default::default()
    };
    let with_zero_values = proto::TryGetElementPropsRequest {
        id64: Some(String::new()),
        federation_guid: Some(String::new()),
        code: Some(code),
        external_source_aspect_identifier: Some(Default::default()),
    };

    let first = client
        .try_get_element_props(code_only)
        .await
        .unwrap()
        .into_inner();
    let second = client
        .try_get_element_props(with_zero_values)
        .await
        .unwrap()
        .into_inner();

    assert!(!first.props_json.is_empty());
    assert_eq!(first, second);

    server.stop(Duration::from_secs(5)).await.unwrap();
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn aspect_props_round_trip_and_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let identity = ExternalIdentity::new("0x2", "tile-1", "Tile");
    let properties = json!({"guid": "tile-1", "Group": "A"});
    store
        .upsert_element(ElementWrite {
            class_full_name: "Tile".into(),
            federation_guid: Some("tile-1".into()),
            code: None,
            aspect: Some(AspectWrite {
                identity: identity.clone(),
                state: ExternalState {
                    version: Some("7".into()),
                    checksum: Some("abc".into()),
                },
                json_properties: properties.to_string(),
                source: Some("0x2".into()),
            }),
            properties: properties.clone(),
        })
        .await
        .unwrap();
    let (server, mut client) = start(store).await;

    let aspect = client
        .get_external_source_aspect_props(proto::ExternalSourceAspectIdentifier::from(&identity))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(aspect.json_properties, properties.to_string());
    assert_eq!(
        aspect.state,
        Some(proto::ExternalSourceState {
            version: Some("7".into()),
            checksum: Some("abc".into()),
        })
    );
    assert_eq!(aspect.source.as_deref(), Some("0x2"));

    let status = client
        .get_external_source_aspect_props(proto::ExternalSourceAspectIdentifier {
            scope_id: "0x2".into(),
            identifier: "tile-2".into(),
            kind: "Tile".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::NotFound);

    server.stop(Duration::from_secs(5)).await.unwrap();
}
