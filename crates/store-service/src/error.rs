// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use connector_model::ModelError;
use connector_proto::WireError;
use thiserror::Error;
use tonic::Status;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Federation guid {guid} already belongs to element {owner}")]
    DuplicateFederationGuid { guid: String, owner: String },

    #[error("Code {spec}/{scope}/{value} already belongs to element {owner}")]
    DuplicateCode {
        spec: String,
        scope: String,
        value: String,
        owner: String,
    },

    #[error("Unknown element {0}")]
    UnknownElement(String),

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("{0}")]
    Wire(#[from] WireError),

    #[error("Could not serialize element properties: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store-Query server failed: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Store-Query server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<StoreError> for Status {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Model(_) => Status::invalid_argument(error.to_string()),
            StoreError::Wire(error) => error.into(),
            StoreError::UnknownElement(_) => Status::not_found(error.to_string()),
            _ => Status::internal(error.to_string()),
        }
    }
}
