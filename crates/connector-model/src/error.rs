// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Element lookup key must carry at least one of id, federationGuid, code or externalIdentity")]
    EmptyLookupKey,

    #[error("Missing field `{field}` in {container}")]
    MissingField {
        field: &'static str,
        container: &'static str,
    },

    #[error("Field `{field}` in {container} must be a non-empty string")]
    InvalidField {
        field: &'static str,
        container: &'static str,
    },

    #[error(
        "Cannot compare fingerprints for {0}: neither the request nor the stored aspect carries a version or checksum"
    )]
    EmptyFingerprintComparison(String),
}
