// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{sync::Arc, time::Duration};

use common::address::{free_local_address, to_endpoint_uri};
use connector_proto::ReaderClient;
use reader_service::{RunningReader, spawn_reader, tile::TileFileOpener};
use tokio::{
    process::{Child, Command},
    time::Instant,
};
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info, warn};

use crate::{
    config::{ConnectorConfig, LaunchMode},
    error::CoordinatorError,
};

const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(50);

enum Launched {
    Attached,
    Spawned(Child),
    Inline(RunningReader),
}

/// A reader the coordinator started, or attached to, for one import.
pub(crate) struct ReaderHandle {
    address: String,
    launched: Launched,
}

impl ReaderHandle {
    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    /// Wait up to `grace` for the reader to stop after it was shut down, then force it.
    pub(crate) async fn finish(self, grace: Duration) {
        match self.launched {
            Launched::Attached => {}
            Launched::Spawned(mut child) => match tokio::time::timeout(grace, child.wait()).await {
                Ok(Ok(status)) => info!(%status, "Reader process exited"),
                Ok(Err(error)) => warn!(%error, "Failed to wait for the reader process"),
                Err(_) => {
                    warn!(?grace, "Reader process did not exit in time, killing it");
                    if let Err(error) = child.kill().await {
                        warn!(%error, "Failed to kill the reader process");
                    }
                }
            },
            Launched::Inline(running) => {
                let mut task = running.task;
                match tokio::time::timeout(grace, &mut task).await {
                    Ok(Ok(Ok(()))) => {}
                    Ok(Ok(Err(error))) => warn!(%error, "Inline reader failed"),
                    Ok(Err(error)) => warn!(%error, "Inline reader task panicked"),
                    Err(_) => {
                        warn!(?grace, "Inline reader did not stop in time, aborting it");
                        task.abort();
                    }
                }
            }
        }
    }
}

pub(crate) async fn launch(config: &ConnectorConfig) -> Result<ReaderHandle, CoordinatorError> {
    match &config.launch {
        LaunchMode::Attach { address } => {
            info!(%address, "Attaching to a running reader");
            Ok(ReaderHandle {
                address: address.clone(),
                launched: Launched::Attached,
            })
        }
        LaunchMode::Spawn { program, args } => {
            let address = free_local_address(&config.bind_host).await?.to_string();

            let child = Command::new(program)
                .args(args)
                .arg(&address)
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| CoordinatorError::Launch {
                    program: program.clone(),
                    source,
                })?;

            info!(%program, %address, pid = ?child.id(), "Reader process started");
            Ok(ReaderHandle {
                address,
                launched: Launched::Spawned(child),
            })
        }
        LaunchMode::Inline => {
            let running = spawn_reader(
                &config.bind_host,
                Arc::new(TileFileOpener),
                config.reader.clone(),
                config.shutdown_grace,
            )
            .await?;

            info!(address = %running.address, "Inline reader started");
            Ok(ReaderHandle {
                address: running.address.to_string(),
                launched: Launched::Inline(running),
            })
        }
    }
}

/// Connect to the reader, retrying until it listens or `connect_timeout` has passed.
pub(crate) async fn connect(
    address: &str,
    connect_timeout: Duration,
    call_timeout: Duration,
) -> Result<ReaderClient<Channel>, CoordinatorError> {
    let unreachable = |source| CoordinatorError::ReaderUnreachable {
        address: address.to_string(),
        source,
    };

    let endpoint = Endpoint::from_shared(to_endpoint_uri(address))
        .map_err(unreachable)?
        .connect_timeout(connect_timeout)
        .timeout(call_timeout);

    let deadline = Instant::now() + connect_timeout;
    loop {
        match endpoint.connect().await {
            Ok(channel) => return Ok(ReaderClient::new(channel)),
            Err(error) if Instant::now() >= deadline => return Err(unreachable(error)),
            Err(error) => {
                debug!(%address, %error, "Reader not ready yet");
                tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
            }
        }
    }
}
