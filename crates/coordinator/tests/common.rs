// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![allow(dead_code)]

use std::io::Write;

use common::env_const::CONNECTOR_SHUTDOWN_GRACE_MS;
use connector_env::MapEnvironment;
use coordinator::ConnectorConfig;
use tempfile::NamedTempFile;

/// Tile-1 names group "A" before the group is read, so a placeholder is created for it.
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

pub fn rewrite_source(file: &NamedTempFile, content: &str) {
    std::fs::write(file.path(), content).unwrap();
}

pub fn locator(file: &NamedTempFile) -> String {
    file.path().to_str().unwrap().to_string()
}

/// Configuration from the given variables, with a short shutdown grace.
pub fn config(vars: &[(&str, &str)]) -> ConnectorConfig {
    let mut env = MapEnvironment::from([(CONNECTOR_SHUTDOWN_GRACE_MS, "1000")]);
    for (key, value) in vars {
        env.set(key, value);
    }
    ConnectorConfig::from_env(&env).unwrap()
}
