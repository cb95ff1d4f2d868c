// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use connector_model::Record;

use crate::error::SourceError;

/// An opened external source, owned by the reader between `initialize` and `shutdown`.
pub trait RecordSource: Send {
    /// The next record in traversal order, or `None` once the source is exhausted. An error ends
    /// the stream; records produced before it remain valid.
    fn next_record(&mut self) -> Option<Result<Record, SourceError>>;
}

/// Opens a source from the locator the driver hands to `initialize`.
pub trait SourceOpener: Send + Sync {
    /// `scope_id` scopes the identities of every record the source produces.
    fn open(&self, locator: &str, scope_id: &str) -> Result<Box<dyn RecordSource>, SourceError>;
}
