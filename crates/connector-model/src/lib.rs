// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Domain types shared by the driver and the reader.

mod change;
mod error;
mod identity;
mod lookup;
mod record;

pub use change::{ChangeDecision, ExternalSourceAspect, FingerprintPolicy};
pub use error::ModelError;
pub use identity::{Code, ExternalIdentity, ExternalState};
pub use lookup::{ElementLookupKey, ElementProps, LookupBy};
pub use record::{
    GROUP_KIND, GROUP_PROPERTY, GroupRecord, Record, SourceRecord, StreamedRecord, TILE_KIND,
    TileRecord,
};
