// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use connector_proto::ReaderServer;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{info, warn};

use crate::{
    context::{ReaderContext, ReaderOptions},
    error::ReaderError,
    service::ReaderService,
    source::SourceOpener,
};

/// Serve the Reader service on `listener` until the reader is shut down.
///
/// After `shutdown`, calls still in flight (typically an abandoned record stream) get `grace` to
/// finish before they are dropped.
pub async fn serve(
    listener: TcpListener,
    service: ReaderService,
    grace: Duration,
) -> Result<(), ReaderError> {
    let address = listener.local_addr()?;
    let shutdown = service.context().shutdown_token();
    let signal = shutdown.clone();

    let server = Server::builder()
        .add_service(ReaderServer::new(service))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            signal.cancelled().await
        });
    tokio::pin!(server);

    info!(%address, "Reader service listening");

    tokio::select! {
        result = &mut server => result?,
        _ = async {
            shutdown.cancelled().await;
            tokio::time::sleep(grace).await
        } => {
            warn!(%address, ?grace, "Reader calls still in flight after shutdown, abandoning them");
        }
    }

    info!(%address, "Reader service stopped");
    Ok(())
}

/// A reader serving in a task of the current process.
pub struct RunningReader {
    pub address: SocketAddr,
    pub context: Arc<ReaderContext>,
    pub task: JoinHandle<Result<(), ReaderError>>,
}

/// Bind an OS-assigned port on `host` and serve a fresh reader there.
pub async fn spawn_reader(
    host: &str,
    opener: Arc<dyn SourceOpener>,
    options: ReaderOptions,
    grace: Duration,
) -> Result<RunningReader, ReaderError> {
    let listener = TcpListener::bind((host, 0)).await?;
    let address = listener.local_addr()?;

    let context = Arc::new(ReaderContext::new(options));
    let service = ReaderService::new(context.clone(), opener);
    let task = tokio::spawn(serve(listener, service, grace));

    Ok(RunningReader {
        address,
        context,
        task,
    })
}
