// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use async_stream::try_stream;
use connector_model::{ChangeDecision, ElementLookupKey, ElementProps, Record, StreamedRecord};
use connector_proto::{StoreQueryClient, proto};
use tokio_stream::Stream;
use tonic::{Status, transport::Channel};
use tracing::{debug, info, warn};

use crate::{context::ReaderContext, error::ReaderError};

/// Start a record stream over the context's source.
///
/// Records are produced one at a time as the consumer polls. Any Store-Query calls for a record
/// complete before that record is yielded, so they always fall between two emitted records.
/// Lifecycle violations are reported here, before any stream exists.
pub fn record_stream(
    context: Arc<ReaderContext>,
) -> Result<impl Stream<Item = Result<proto::GetDataResponse, Status>> + Send + 'static, ReaderError>
{
    let (mut source, guard) = context.begin_streaming()?;

    Ok(try_stream! {
        let _guard = guard;
        let mut emitted = 0usize;

        while let Some(record) = source.next_record() {
            if context.is_shutting_down() {
                warn!(emitted, "Reader shut down, abandoning record stream");
                Err::<(), _>(Status::cancelled("Reader is shutting down"))?;
            }

            let record = record.map_err(|error| {
                warn!(emitted, %error, "Record stream aborted");
                Status::aborted(format!("Failed to produce record {}: {error}", emitted + 1))
            })?;

            let reader_decision = match context.store_client().await {
                Some(client) => lookups(client, &record, context.options().change_detection).await,
                None => None,
            };

            yield proto::GetDataResponse::from(&StreamedRecord {
                record,
                reader_decision,
            });
            emitted += 1;
        }

        info!(emitted, "Record stream completed");
    })
}

/// The reader's own queries against the driver's store. Failures are logged and the record is
/// sent without a decision; the driver checks again before writing.
async fn lookups(
    mut client: StoreQueryClient<Channel>,
    record: &Record,
    change_detection: bool,
) -> Option<ChangeDecision> {
    if let Record::Tile(tile) = record {
        let key = ElementLookupKey::by_federation_guid(&tile.source.identity.identifier);
        match client
            .try_get_element_props(proto::TryGetElementPropsRequest::from(&key))
            .await
        {
            Ok(response) => {
                let props: Option<ElementProps> = response.into_inner().into();
                if props.is_some() {
                    debug!(identity = %tile.source.identity, "Tile already converted");
                }
            }
            Err(status) => warn!(%status, "TryGetElementProps failed"),
        }
    }

    let source = record.source();
    if !change_detection || source.state.is_empty() {
        return None;
    }

    match client
        .detect_change(proto::DetectChangeRequest::new(
            &source.identity,
            &source.state,
        ))
        .await
    {
        Ok(response) => Some(response.into_inner().into()),
        Err(status) => {
            warn!(identity = %source.identity, %status, "DetectChange failed");
            None
        }
    }
}
