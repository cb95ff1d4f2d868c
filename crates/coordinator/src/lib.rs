// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The driver side of a connector run: launches a reader, exposes the store to it over
//! Store-Query and writes the records it streams.

mod config;
mod coordinator;
mod document;
mod error;
mod launcher;
mod summary;
mod writer;

pub use config::{ConnectorConfig, LaunchMode};
pub use coordinator::Coordinator;
pub use error::CoordinatorError;
pub use summary::ImportSummary;
