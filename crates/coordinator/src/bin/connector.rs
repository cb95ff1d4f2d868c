// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use common::logging_tracing;
use connector_env::SystemEnvironment;
use coordinator::{ConnectorConfig, Coordinator};
use store_service::InMemoryStore;

/// Import a source document through a reader and print what changed.
///
/// The reader is chosen by `CONNECTOR_READER_ADDRESS`, `CONNECTOR_READER_PROGRAM` (with
/// `CONNECTOR_READER_ARGS`) or, by default, the built-in tile-file reader.
#[derive(Parser)]
struct Cli {
    /// Locator of the source, handed to the reader as is
    source: String,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    logging_tracing::init("connector")?;

    let config = ConnectorConfig::from_env(&SystemEnvironment)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()?;

    let summary = runtime.block_on(async {
        let store = Arc::new(InMemoryStore::new());
        Coordinator::new(config, store).run(&args.source).await
    })?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
