// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The wire contract between driver and reader: generated gRPC messages and services for the
//! Store-Query and Reader services, and their conversions to and from `connector-model` types.

pub mod proto {
    #![allow(clippy::doc_markdown)]
    tonic::include_proto!("connector");
}

mod error;
mod reader;
mod store_query;

pub use error::WireError;

pub use proto::{
    reader_client::ReaderClient, reader_server::ReaderServer,
    store_query_client::StoreQueryClient, store_query_server::StoreQueryServer,
};
