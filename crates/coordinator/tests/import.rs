// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{sync::Arc, time::Duration};

use ::common::env_const::{
    CONNECTOR_READER_ADDRESS, CONNECTOR_SKIP_UNCHANGED_SOURCES, CONNECTOR_TRUST_READER_DECISIONS,
};
use connector_model::LookupBy;
use coordinator::{Coordinator, CoordinatorError, ImportSummary};
use reader_service::{ReaderOptions, ReaderPhase, spawn_reader, tile::TileFileOpener};
use store_service::{ElementStore, InMemoryStore};
use test_log::test;

mod common;

use common::*;

#[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn imports_tiles_groups_and_memberships() {
    let source = write_source(TILE_FILE);
    let store = Arc::new(InMemoryStore::new());

    let summary = Coordinator::new(config(&[]), store.clone())
        .run(&locator(&source))
        .await
        .unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            records: 3,
            tiles: 2,
            groups: 1,
            inserted: 2,
            // The placeholder created for tile-1 is completed by the group record
            updated: 1,
            unchanged: 0,
            placeholders: 1,
            memberships: 1,
            memberships_removed: 0,
            source_unchanged: false,
        }
    );

    let tile = store
        .find_element(LookupBy::FederationGuid("tile-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tile.class_full_name, "SmallSquareTile");

    let relations = store.relations().await;
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].target_id, tile.id);

    // Root, source document link, two tiles and the group
    assert_eq!(store.element_count().await, 5);
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn unmodified_source_is_skipped() {
    let source = write_source(TILE_FILE);
    let store = Arc::new(InMemoryStore::new());

    Coordinator::new(config(&[]), store.clone())
        .run(&locator(&source))
        .await
        .unwrap();

    let summary = Coordinator::new(config(&[]), store.clone())
        .run(&locator(&source))
        .await
        .unwrap();
    assert!(summary.source_unchanged);
    assert_eq!(summary.records, 0);

    // Read anyway: every record is found unchanged
    let summary = Coordinator::new(
        config(&[(CONNECTOR_SKIP_UNCHANGED_SOURCES, "false")]),
        store.clone(),
    )
    .run(&locator(&source))
    .await
    .unwrap();
    assert!(!summary.source_unchanged);
    assert_eq!(summary.records, 3);
    assert_eq!(summary.unchanged, 3);
    assert_eq!(summary.inserted + summary.updated, 0);

    // Same outcome when the reader's own decisions are taken at face value
    let summary = Coordinator::new(
        config(&[
            (CONNECTOR_SKIP_UNCHANGED_SOURCES, "false"),
            (CONNECTOR_TRUST_READER_DECISIONS, "true"),
        ]),
        store.clone(),
    )
    .run(&locator(&source))
    .await
    .unwrap();
    assert_eq!(summary.unchanged, 3);
    assert_eq!(store.element_count().await, 5);
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn modified_record_is_updated() {
    let source = write_source(TILE_FILE);
    let store = Arc::new(InMemoryStore::new());
    let always_read = || config(&[(CONNECTOR_SKIP_UNCHANGED_SOURCES, "false")]);

    Coordinator::new(always_read(), store.clone())
        .run(&locator(&source))
        .await
        .unwrap();

    rewrite_source(&source, &TILE_FILE.replace("Blue", "Green"));

    let summary = Coordinator::new(always_read(), store.clone())
        .run(&locator(&source))
        .await
        .unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.unchanged, 2);

    let tile = store
        .find_element(LookupBy::FederationGuid("tile-2"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tile.properties["casingMaterial"], "Green");
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn unavailable_source_fails_and_shuts_the_reader_down() {
    let reader = spawn_reader(
        "127.0.0.1",
        Arc::new(TileFileOpener),
        ReaderOptions::default(),
        Duration::from_secs(1),
    )
    .await
    .unwrap();
    let address = reader.address.to_string();

    let error = Coordinator::new(
        config(&[(CONNECTOR_READER_ADDRESS, address.as_str())]),
        Arc::new(InMemoryStore::new()),
    )
    .run("/nonexistent/tiles.json")
    .await
    .unwrap_err();

    match error {
        CoordinatorError::SourceUnavailable { locator, status } => {
            assert_eq!(locator, "/nonexistent/tiles.json");
            assert_eq!(status.code(), tonic::Code::NotFound);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(reader.context.phase(), ReaderPhase::Terminated);
    tokio::time::timeout(Duration::from_secs(5), reader.task)
        .await
        .expect("reader did not stop after shutdown")
        .unwrap()
        .unwrap();
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn aborted_stream_keeps_records_already_written() {
    let source = write_source(
        r#"{ "Tiles": { "RectangleTile": [{ "guid": "tile-1" }, { "Group": "A" }, { "guid": "tile-3" }] } }"#,
    );
    let store = Arc::new(InMemoryStore::new());

    let error = Coordinator::new(config(&[]), store.clone())
        .run(&locator(&source))
        .await
        .unwrap_err();

    match error {
        CoordinatorError::StreamAborted { received, status } => {
            assert_eq!(received, 1);
            assert_eq!(status.code(), tonic::Code::Aborted);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(
        store
            .find_element(LookupBy::FederationGuid("tile-1"))
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        store
            .find_element(LookupBy::FederationGuid("tile-3"))
            .await
            .unwrap()
            .is_none()
    );

    // The document was not marked as imported, so it is read again
    let error = Coordinator::new(config(&[]), store.clone())
        .run(&locator(&source))
        .await
        .unwrap_err();
    assert!(matches!(error, CoordinatorError::StreamAborted { .. }));
}
