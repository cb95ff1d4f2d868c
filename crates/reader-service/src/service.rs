// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{pin::Pin, sync::Arc};

use connector_proto::proto::{self, reader_server::Reader};
use tokio_stream::Stream;
use tonic::{Request, Response, Status};
use tracing::instrument;

use crate::{context::ReaderContext, source::SourceOpener, stream::record_stream};

pub struct ReaderService {
    context: Arc<ReaderContext>,
    opener: Arc<dyn SourceOpener>,
}

impl ReaderService {
    pub fn new(context: Arc<ReaderContext>, opener: Arc<dyn SourceOpener>) -> Self {
        Self { context, opener }
    }

    pub fn context(&self) -> &Arc<ReaderContext> {
        &self.context
    }
}

#[tonic::async_trait]
impl Reader for ReaderService {
    type GetDataStream =
        Pin<Box<dyn Stream<Item = Result<proto::GetDataResponse, Status>> + Send + 'static>>;

    #[instrument(name = "Reader::Initialize", skip_all)]
    async fn initialize(
        &self,
        request: Request<proto::InitializeRequest>,
    ) -> Result<Response<proto::Ack>, Status> {
        let request = request.into_inner();
        // Without an explicit scope, records are scoped to the source they come from
        let scope_id = request
            .scope_id
            .filter(|scope_id| !scope_id.is_empty())
            .unwrap_or_else(|| request.source_locator.clone());

        self.context
            .initialize(&request.source_locator, &scope_id, self.opener.clone())
            .await?;

        Ok(Response::new(proto::Ack {}))
    }

    #[instrument(name = "Reader::OnStoreServiceAvailable", skip_all)]
    async fn on_store_service_available(
        &self,
        request: Request<proto::OnStoreServiceAvailableRequest>,
    ) -> Result<Response<proto::Ack>, Status> {
        self.context
            .store_service_available(&request.into_inner().address)
            .await?;

        Ok(Response::new(proto::Ack {}))
    }

    #[instrument(name = "Reader::GetData", skip_all)]
    async fn get_data(
        &self,
        _request: Request<proto::GetDataRequest>,
    ) -> Result<Response<Self::GetDataStream>, Status> {
        let stream = record_stream(self.context.clone())?;

        Ok(Response::new(Box::pin(stream)))
    }

    #[instrument(name = "Reader::Shutdown", skip_all)]
    async fn shutdown(
        &self,
        _request: Request<proto::ShutdownRequest>,
    ) -> Result<Response<proto::Ack>, Status> {
        self.context.shutdown().await;

        Ok(Response::new(proto::Ack {}))
    }
}
