// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use crate::{
    change::ChangeDecision,
    identity::{ExternalIdentity, ExternalState},
};

pub const TILE_KIND: &str = "Tile";
pub const GROUP_KIND: &str = "Group";

/// Property of a tile naming the group it belongs to.
pub const GROUP_PROPERTY: &str = "Group";

/// What every record carries regardless of its variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub identity: ExternalIdentity,
    pub state: ExternalState,
    pub properties: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    pub shape: String,
    #[serde(flatten)]
    pub source: SourceRecord,
}

impl TileRecord {
    pub fn group_name(&self) -> Option<&str> {
        self.source
            .properties
            .get(GROUP_PROPERTY)
            .and_then(serde_json::Value::as_str)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    #[serde(flatten)]
    pub source: SourceRecord,
}

impl GroupRecord {
    pub fn name(&self) -> &str {
        &self.source.identity.identifier
    }
}

/// A unit of reader output. New kinds of record are new variants, matched exhaustively where
/// records are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Record {
    Tile(TileRecord),
    Group(GroupRecord),
}

impl Record {
    pub fn source(&self) -> &SourceRecord {
        match self {
            Record::Tile(tile) => &tile.source,
            Record::Group(group) => &group.source,
        }
    }

    pub fn identity(&self) -> &ExternalIdentity {
        &self.source().identity
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Record::Tile(_) => TILE_KIND,
            Record::Group(_) => GROUP_KIND,
        }
    }
}

/// A record as it travels from reader to driver, with the reader's own change decision if it
/// made one.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamedRecord {
    pub record: Record,
    pub reader_decision: Option<ChangeDecision>,
}

impl From<Record> for StreamedRecord {
    fn from(record: Record) -> Self {
        Self {
            record,
            reader_decision: None,
        }
    }
}
