// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use connector_model::ModelError;
use thiserror::Error;
use tonic::Status;

/// Failures of the external source, either when opening it or while producing a record.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Cannot open source {locator}: {source}")]
    Open {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Source {locator} is not valid JSON: {source}")]
    Parse {
        locator: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Source {locator} is malformed: {message}")]
    Malformed { locator: String, message: String },

    #[error("{kind} #{position} has no `{field}`")]
    MissingField {
        kind: &'static str,
        position: usize,
        field: &'static str,
    },

    #[error("{0}")]
    Model(#[from] ModelError),
}

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Reader has not been initialized with a source")]
    NotInitialized,

    #[error("A record stream is already in progress")]
    AlreadyStreaming,

    #[error("Reader has been shut down")]
    Terminated,

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("Invalid Store-Query address {address}: {source}")]
    InvalidStoreAddress {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("Reader server failed: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Opening the source panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<ReaderError> for Status {
    fn from(error: ReaderError) -> Self {
        let message = error.to_string();
        match error {
            ReaderError::NotInitialized
            | ReaderError::AlreadyStreaming
            | ReaderError::Terminated => Status::failed_precondition(message),
            ReaderError::Source(SourceError::Open { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Status::not_found(message)
            }
            ReaderError::Source(SourceError::Open { .. }) => Status::unavailable(message),
            ReaderError::Source(_) | ReaderError::InvalidStoreAddress { .. } => {
                Status::invalid_argument(message)
            }
            ReaderError::Transport(_) | ReaderError::Io(_) | ReaderError::Join(_) => {
                Status::internal(message)
            }
        }
    }
}
