// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The reader side: a lifecycle context around one external source, the gRPC Reader service
//! that drives it, and a tile-file source.

mod context;
mod error;
mod serve;
mod service;
mod source;
mod stream;
pub mod tile;

pub use context::{ReaderContext, ReaderOptions, ReaderPhase, StreamingGuard};
pub use error::{ReaderError, SourceError};
pub use serve::{RunningReader, serve, spawn_reader};
pub use service::ReaderService;
pub use source::{RecordSource, SourceOpener};
pub use stream::record_stream;
