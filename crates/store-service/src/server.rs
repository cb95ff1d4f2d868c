// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{net::SocketAddr, time::Duration};

use connector_proto::StoreQueryServer;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::{info, warn};

use crate::{error::StoreError, service::StoreQueryService};

/// A running Store-Query server, bound to an OS-assigned port.
pub struct StoreServer {
    address: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<Result<(), tonic::transport::Error>>,
}

impl StoreServer {
    pub async fn start(service: StoreQueryService, host: &str) -> Result<Self, StoreError> {
        let listener = TcpListener::bind((host, 0)).await?;
        let address = listener.local_addr()?;

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();

        let task = tokio::spawn(
            Server::builder()
                .add_service(StoreQueryServer::new(service))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    signal.cancelled().await
                }),
        );

        info!(%address, "Store-Query service listening");

        Ok(Self {
            address,
            shutdown,
            task,
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Stop accepting calls and wait up to `grace` for in-flight ones to finish.
    pub async fn stop(self, grace: Duration) -> Result<(), StoreError> {
        self.shutdown.cancel();

        let mut task = self.task;
        match tokio::time::timeout(grace, &mut task).await {
            Ok(result) => result??,
            Err(_) => {
                warn!(address = %self.address, "Store-Query service did not stop in time, aborting");
                task.abort();
            }
        }

        info!(address = %self.address, "Store-Query service stopped");
        Ok(())
    }
}
