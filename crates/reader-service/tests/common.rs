// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![allow(dead_code)]

use std::{io::Write, net::SocketAddr, sync::Arc, time::Duration};

use connector_proto::{ReaderClient, proto};
use reader_service::{ReaderOptions, RunningReader, spawn_reader, tile::TileFileOpener};
use tempfile::NamedTempFile;
use tonic::transport::Channel;

/// Two tiles, one of them in group "A", then the group itself.
pub const TILE_FILE: &str = r#"{
    "Tiles": {
        "SmallSquareTile": [
            { "guid": "tile-1", "Group": "A", "casingMaterial": "Red" },
            { "guid": "tile-2", "casingMaterial": "Blue" }
        ]
    },
    "Groups": [{ "name": "A", "groupType": "Kitchen" }]
}"#;

pub fn write_source(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

pub fn locator(file: &NamedTempFile) -> String {
    file.path().to_str().unwrap().to_string()
}

pub async fn start_reader(options: ReaderOptions) -> RunningReader {
    spawn_reader(
        "127.0.0.1",
        Arc::new(TileFileOpener),
        options,
        Duration::from_secs(2),
    )
    .await
    .unwrap()
}

pub async fn connect(address: SocketAddr) -> ReaderClient<Channel> {
    ReaderClient::connect(format!("http://{address}"))
        .await
        .unwrap()
}

pub fn initialize_request(locator: String) -> proto::InitializeRequest {
    proto::InitializeRequest {
        source_locator: locator,
        scope_id: Some("0x2".into()),
    }
}
