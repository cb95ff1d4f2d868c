// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! # Tracing configuration setup.
//!
//! Both processes are instrumented with Rust's `tracing` framework.
//!
//! Calling the `init` function will initialize a global tracing subscriber based on the value of
//! the `CONNECTOR_LOG` environment variable which follows the same conventions as `RUST_LOG`.
//! Output goes to stderr, so a reader process launched by the driver keeps its stdout free.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, prelude::*};

pub const CONNECTOR_LOG: &str = "CONNECTOR_LOG";

// Transport internals are chatty at `info`/`debug`
const QUIET_DIRECTIVES: [&str; 3] = ["h2=warn", "hyper=warn", "tower=warn"];

/// Initialize the tracing subscriber.
///
/// `service_name` is logged once so that interleaved driver and reader output can be told apart.
pub fn init(service_name: &str) -> Result<(), LoggingError> {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(CONNECTOR_LOG)
        .from_env_lossy();

    for directive in QUIET_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }

    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(service = service_name, "Logging initialized");

    Ok(())
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log directive: {0}")]
    Directive(#[from] tracing_subscriber::filter::ParseError),

    #[error("Could not install the tracing subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}
