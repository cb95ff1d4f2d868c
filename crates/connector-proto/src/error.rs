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

#[derive(Error, Debug)]
pub enum WireError {
    #[error("Missing required field `{field}` in {message}")]
    MissingField {
        field: &'static str,
        message: &'static str,
    },

    #[error("Field `{field}` does not hold valid JSON: {source}")]
    InvalidJson {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Model(#[from] ModelError),
}

/// Every wire error is a malformed message, which the caller must fix before trying again.
impl From<WireError> for Status {
    fn from(error: WireError) -> Self {
        Status::invalid_argument(error.to_string())
    }
}
