// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use connector_env::EnvError;
use connector_proto::WireError;
use reader_service::ReaderError;
use store_service::StoreError;
use thiserror::Error;
use tonic::Status;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("{0}")]
    Env(#[from] EnvError),

    #[error("No reader configured: set CONNECTOR_READER_ADDRESS or CONNECTOR_READER_PROGRAM, or enable CONNECTOR_READER_INLINE")]
    NoReaderConfigured,

    #[error("Failed to launch reader {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Reader at {address} is not reachable: {source}")]
    ReaderUnreachable {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("Source {locator} is unavailable: {}", status.message())]
    SourceUnavailable { locator: String, status: Status },

    #[error("{call} failed: {}", status.message())]
    Call { call: &'static str, status: Status },

    #[error("Record stream aborted after {received} records: {}", status.message())]
    StreamAborted { received: usize, status: Status },

    #[error("No record received for {idle:?} after {received} records")]
    StreamIdle { received: usize, idle: Duration },

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Wire(#[from] WireError),

    #[error("{0}")]
    Reader(#[from] ReaderError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl CoordinatorError {
    pub(crate) fn call(call: &'static str) -> impl FnOnce(Status) -> Self {
        move |status| CoordinatorError::Call { call, status }
    }
}
