// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use connector_model::{GroupRecord, Record, SourceRecord, StreamedRecord, TileRecord};

use crate::{
    error::WireError,
    proto::{self, get_data_response},
    store_query::{identity_from_wire, state_from_wire},
};

fn properties_from_wire(json_properties: &str) -> Result<serde_json::Value, WireError> {
    if json_properties.is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    serde_json::from_str(json_properties).map_err(|source| WireError::InvalidJson {
        field: "json_properties",
        source,
    })
}

impl From<&StreamedRecord> for proto::GetDataResponse {
    fn from(streamed: &StreamedRecord) -> Self {
        let record = match &streamed.record {
            Record::Tile(tile) => get_data_response::Record::Tile(proto::TileRecord {
                shape: tile.shape.clone(),
                identifier: Some((&tile.source.identity).into()),
                state: Some((&tile.source.state).into()),
                json_properties: tile.source.properties.to_string(),
            }),
            Record::Group(group) => get_data_response::Record::Group(proto::GroupRecord {
                identifier: Some((&group.source.identity).into()),
                state: Some((&group.source.state).into()),
                json_properties: group.source.properties.to_string(),
            }),
        };

        Self {
            record: Some(record),
            reader_decision: streamed.reader_decision.clone().map(Into::into),
        }
    }
}

impl TryFrom<proto::GetDataResponse> for StreamedRecord {
    type Error = WireError;

    fn try_from(response: proto::GetDataResponse) -> Result<Self, Self::Error> {
        let record = match response.record {
            Some(get_data_response::Record::Tile(tile)) => Record::Tile(TileRecord {
                shape: tile.shape,
                source: SourceRecord {
                    identity: identity_from_wire(tile.identifier, "TileRecord")?,
                    state: state_from_wire(tile.state),
                    properties: properties_from_wire(&tile.json_properties)?,
                },
            }),
            Some(get_data_response::Record::Group(group)) => Record::Group(GroupRecord {
                source: SourceRecord {
                    identity: identity_from_wire(group.identifier, "GroupRecord")?,
                    state: state_from_wire(group.state),
                    properties: properties_from_wire(&group.json_properties)?,
                },
            }),
            None => {
                return Err(WireError::MissingField {
                    field: "record",
                    message: "GetDataResponse",
                });
            }
        };

        Ok(StreamedRecord {
            record,
            reader_decision: response.reader_decision.map(Into::into),
        })
    }
}
