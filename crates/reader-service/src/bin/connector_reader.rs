// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::Parser;
use common::{address::to_bind_address, env_const::get_shutdown_grace, logging_tracing};
use connector_env::SystemEnvironment;
use connector_model::StreamedRecord;
use reader_service::{
    ReaderContext, ReaderOptions, ReaderService, SourceOpener, record_stream, serve, tile,
};
use tokio::net::TcpListener;
use tokio_stream::StreamExt;

/// Serve the Reader service for tile files.
///
/// Usage:
///
/// ```bash
/// connector-reader 127.0.0.1:50051
/// connector-reader 127.0.0.1:50051 --self-test tiles.json
/// ```
#[derive(Parser)]
struct Cli {
    /// Address to serve on, as `host:port`
    address: String,

    /// Read the file through a full lifecycle without a driver, print its records and exit
    #[clap(long)]
    self_test: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    logging_tracing::init("connector-reader")?;

    let env = SystemEnvironment;
    let options = ReaderOptions::from_env(&env)?;
    let opener: Arc<dyn SourceOpener> = Arc::new(tile::TileFileOpener);

    if let Some(file) = args.self_test {
        return self_test(file, options, opener).await;
    }

    let bind_address = to_bind_address(&args.address);
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    let context = Arc::new(ReaderContext::new(options));
    let service = ReaderService::new(context, opener);
    serve(listener, service, get_shutdown_grace(&env)?).await?;

    Ok(())
}

async fn self_test(
    file: PathBuf,
    options: ReaderOptions,
    opener: Arc<dyn SourceOpener>,
) -> Result<()> {
    let Some(locator) = file.to_str() else {
        bail!("Source path {} is not valid UTF-8", file.display());
    };

    let context = Arc::new(ReaderContext::new(options));
    context.initialize(locator, locator, opener).await?;

    let mut records = Box::pin(record_stream(context.clone())?);
    let mut count = 0;
    while let Some(response) = records.next().await {
        let record = StreamedRecord::try_from(response?)?.record;
        println!("{}", serde_json::to_string(&record)?);
        count += 1;
    }
    drop(records);

    context.shutdown().await;
    tracing::info!(count, "Self-test completed");

    Ok(())
}
