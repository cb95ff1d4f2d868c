// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use connector_model::{ElementLookupKey, ExternalIdentity, FingerprintPolicy};
use connector_proto::proto::{self, store_query_server::StoreQuery};
use tonic::{Request, Response, Status};
use tracing::instrument;

use crate::{queries, store::ElementStore};

/// gRPC face of the driver's store. Holds no per-call state, so the server may run any number
/// of calls concurrently.
#[derive(Clone)]
pub struct StoreQueryService {
    store: Arc<dyn ElementStore>,
    policy: FingerprintPolicy,
}

impl StoreQueryService {
    pub fn new(store: Arc<dyn ElementStore>, policy: FingerprintPolicy) -> Self {
        Self { store, policy }
    }
}

#[tonic::async_trait]
impl StoreQuery for StoreQueryService {
    #[instrument(name = "StoreQuery::TryGetElementProps", skip_all)]
    async fn try_get_element_props(
        &self,
        request: Request<proto::TryGetElementPropsRequest>,
    ) -> Result<Response<proto::ElementProps>, Status> {
        let key = ElementLookupKey::try_from(request.into_inner())?;
        let props = queries::try_get_element_props(self.store.as_ref(), &key).await?;

        Ok(Response::new(props.into()))
    }

    #[instrument(name = "StoreQuery::GetExternalSourceAspectProps", skip_all)]
    async fn get_external_source_aspect_props(
        &self,
        request: Request<proto::ExternalSourceAspectIdentifier>,
    ) -> Result<Response<proto::ExternalSourceAspectProps>, Status> {
        let identity = ExternalIdentity::try_from(request.into_inner())?;

        match queries::get_external_source_aspect(self.store.as_ref(), &identity).await? {
            Some(aspect) => Ok(Response::new((&aspect).into())),
            None => Err(Status::not_found(format!(
                "No external source aspect for {identity}"
            ))),
        }
    }

    #[instrument(name = "StoreQuery::DetectChange", skip_all)]
    async fn detect_change(
        &self,
        request: Request<proto::DetectChangeRequest>,
    ) -> Result<Response<proto::DetectChangeResult>, Status> {
        let (identity, state) = request.into_inner().into_model()?;
        let decision =
            queries::detect_change(self.store.as_ref(), self.policy, &identity, &state).await?;

        Ok(Response::new(decision.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    fn service() -> StoreQueryService {
        StoreQueryService::new(Arc::new(InMemoryStore::new()), FingerprintPolicy::Wildcard)
    }

    #[tokio::test]
    async fn missing_aspect_is_not_found() {
        let status = service()
            .get_external_source_aspect_props(Request::new(
                proto::ExternalSourceAspectIdentifier {
                    scope_id: "s".into(),
                    identifier: "1".into(),
                    kind: "k".into(),
                },
            ))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn missing_element_is_an_empty_success() {
        let response = service()
            .try_get_element_props(Request::new(proto::TryGetElementPropsRequest {
                federation_guid: Some("nope".into()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert!(response.into_inner().props_json.is_empty());
    }

    #[tokio::test]
    async fn lookup_without_discriminant_is_invalid() {
        let status = service()
            .try_get_element_props(Request::new(Default::default()))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn detect_change_without_identifier_is_invalid() {
        let status = service()
            .detect_change(Request::new(proto::DetectChangeRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }
}
