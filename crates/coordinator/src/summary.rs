// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use connector_model::Record;
use serde::Serialize;
use store_service::WriteKind;

/// Counts of what one import did to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Records received from the reader, including any that were skipped.
    pub records: usize,
    pub tiles: usize,
    pub groups: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Groups created because a tile referenced them before they were read.
    pub placeholders: usize,
    pub memberships: usize,
    /// Memberships dropped because a tile no longer names that group.
    pub memberships_removed: usize,
    /// The whole source was skipped, as it has not been modified since the last import.
    pub source_unchanged: bool,
}

impl ImportSummary {
    pub(crate) fn skipped_source() -> Self {
        Self {
            source_unchanged: true,
            ..Default::default()
        }
    }

    pub(crate) fn count_record(&mut self, record: &Record) {
        self.records += 1;
        match record {
            Record::Tile(_) => self.tiles += 1,
            Record::Group(_) => self.groups += 1,
        }
    }

    pub(crate) fn count_write(&mut self, kind: WriteKind) {
        match kind {
            WriteKind::Inserted => self.inserted += 1,
            WriteKind::Updated => self.updated += 1,
            WriteKind::Unchanged => self.unchanged += 1,
        }
    }
}
