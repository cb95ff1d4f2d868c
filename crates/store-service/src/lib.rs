// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Driver-side storage and the Store-Query service the reader calls back into.

mod error;
mod memory;
pub mod queries;
mod server;
mod service;
mod store;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use server::StoreServer;
pub use service::StoreQueryService;
pub use store::{
    AspectWrite, Element, ElementRelation, ElementStore, ElementWrite, ROOT_SUBJECT_ID, WriteKind,
    WriteOutcome,
};
