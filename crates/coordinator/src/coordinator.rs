// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{net::SocketAddr, sync::Arc};

use connector_model::StreamedRecord;
use connector_proto::{ReaderClient, proto};
use store_service::{ElementStore, StoreQueryService, StoreServer};
use tonic::{Code, transport::Channel};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::ConnectorConfig,
    document::SourceDocument,
    error::CoordinatorError,
    launcher::{self, ReaderHandle},
    summary::ImportSummary,
    writer::RecordWriter,
};

/// Drives one import: serves Store-Query over `store`, runs a reader against it and writes
/// whatever the reader streams back.
pub struct Coordinator {
    config: ConnectorConfig,
    store: Arc<dyn ElementStore>,
}

impl Coordinator {
    pub fn new(config: ConnectorConfig, store: Arc<dyn ElementStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Import the source at `locator`.
    ///
    /// The reader is shut down and the Store-Query service stopped whether or not the import
    /// succeeds. Records written before a failure stay in the store, but the source document is
    /// only marked as imported after a complete stream, so the next run reads it again.
    #[instrument(skip(self))]
    pub async fn run(&self, locator: &str) -> Result<ImportSummary, CoordinatorError> {
        let service = StoreQueryService::new(self.store.clone(), self.config.fingerprint_policy);
        let store_server = StoreServer::start(service, &self.config.bind_host).await?;

        let result = match launcher::launch(&self.config).await {
            Ok(reader) => self.run_with_reader(reader, locator, store_server.address()).await,
            Err(error) => Err(error),
        };

        if let Err(error) = store_server.stop(self.config.shutdown_grace).await {
            warn!(%error, "Failed to stop the Store-Query service");
        }

        match &result {
            Ok(summary) => info!(?summary, "Import completed"),
            Err(error) => warn!(%error, "Import failed"),
        }
        result
    }

    async fn run_with_reader(
        &self,
        reader: ReaderHandle,
        locator: &str,
        store_address: SocketAddr,
    ) -> Result<ImportSummary, CoordinatorError> {
        let result = match launcher::connect(
            reader.address(),
            self.config.connect_timeout,
            self.config.call_timeout,
        )
        .await
        {
            Ok(mut client) => {
                let result = self.import(&mut client, locator, store_address).await;
                if let Err(status) = client.shutdown(proto::ShutdownRequest {}).await {
                    warn!(status = %status.message(), "Reader did not acknowledge shutdown");
                }
                result
            }
            Err(error) => Err(error),
        };

        // The reader gets its own grace for in-flight calls first
        reader.finish(self.config.shutdown_grace * 2).await;
        result
    }

    async fn import(
        &self,
        client: &mut ReaderClient<Channel>,
        locator: &str,
        store_address: SocketAddr,
    ) -> Result<ImportSummary, CoordinatorError> {
        let store = self.store.as_ref();

        let document = SourceDocument::register(store, locator).await?;
        if self.config.skip_unchanged_sources
            && document
                .is_unchanged(store, self.config.fingerprint_policy)
                .await?
        {
            info!(%locator, "Source not modified since its last import, skipping it");
            return Ok(ImportSummary::skipped_source());
        }

        client
            .initialize(proto::InitializeRequest {
                source_locator: locator.to_string(),
                scope_id: Some(document.element_id().to_string()),
            })
            .await
            .map_err(|status| CoordinatorError::SourceUnavailable {
                locator: locator.to_string(),
                status,
            })?;

        match client
            .on_store_service_available(proto::OnStoreServiceAvailableRequest {
                address: store_address.to_string(),
            })
            .await
        {
            Ok(_) => {}
            Err(status) if status.code() == Code::Unimplemented => {
                debug!("Reader does not call back into Store-Query");
            }
            Err(status) => return Err(CoordinatorError::call("OnStoreServiceAvailable")(status)),
        }

        let mut stream = client
            .get_data(proto::GetDataRequest {})
            .await
            .map_err(CoordinatorError::call("GetData"))?
            .into_inner();

        let writer = RecordWriter::new(
            self.store.clone(),
            self.config.fingerprint_policy,
            self.config.trust_reader_decisions,
            document.element_id(),
        );
        let mut summary = ImportSummary::default();
        let idle = self.config.stream_idle_timeout;

        loop {
            let message = tokio::time::timeout(idle, stream.message())
                .await
                .map_err(|_| CoordinatorError::StreamIdle {
                    received: summary.records,
                    idle,
                })?;

            match message {
                Ok(Some(response)) => {
                    let streamed = StreamedRecord::try_from(response)?;
                    writer.write(streamed, &mut summary).await?;
                }
                Ok(None) => break,
                Err(status) => {
                    return Err(CoordinatorError::StreamAborted {
                        received: summary.records,
                        status,
                    });
                }
            }
        }

        document.commit(store).await?;
        Ok(summary)
    }
}
