// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use common::env_const::{
    CONNECTOR_FINGERPRINT_POLICY, CONNECTOR_READER_ADDRESS, CONNECTOR_READER_ARGS,
    CONNECTOR_READER_INLINE, CONNECTOR_READER_PROGRAM, CONNECTOR_SKIP_UNCHANGED_SOURCES,
    CONNECTOR_TRUST_READER_DECISIONS, get_bind_host, get_call_timeout, get_connect_timeout,
    get_shutdown_grace, get_stream_idle_timeout, get_worker_threads,
};
use connector_env::{Environment, get_parsed};
use connector_model::FingerprintPolicy;
use reader_service::ReaderOptions;

use crate::error::CoordinatorError;

/// How the coordinator gets hold of a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
    /// A reader that is already serving at this address.
    Attach { address: String },
    /// Start this program with a free local address appended to `args`.
    Spawn { program: String, args: Vec<String> },
    /// Serve the tile-file reader from a task of the driver process.
    Inline,
}

#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub launch: LaunchMode,
    pub bind_host: String,
    pub worker_threads: usize,
    pub connect_timeout: Duration,
    pub call_timeout: Duration,
    pub stream_idle_timeout: Duration,
    pub shutdown_grace: Duration,
    pub fingerprint_policy: FingerprintPolicy,
    pub trust_reader_decisions: bool,
    pub skip_unchanged_sources: bool,
    /// Used for inline readers only; other readers read their own environment.
    pub reader: ReaderOptions,
}

impl ConnectorConfig {
    pub fn from_env(env: &dyn Environment) -> Result<Self, CoordinatorError> {
        Ok(Self {
            launch: launch_mode(env)?,
            bind_host: get_bind_host(env),
            worker_threads: get_worker_threads(env)?,
            connect_timeout: get_connect_timeout(env)?,
            call_timeout: get_call_timeout(env)?,
            stream_idle_timeout: get_stream_idle_timeout(env)?,
            shutdown_grace: get_shutdown_grace(env)?,
            fingerprint_policy: get_parsed(
                env,
                CONNECTOR_FINGERPRINT_POLICY,
                FingerprintPolicy::default(),
            )?,
            trust_reader_decisions: env.enabled(CONNECTOR_TRUST_READER_DECISIONS, false)?,
            skip_unchanged_sources: env.enabled(CONNECTOR_SKIP_UNCHANGED_SOURCES, true)?,
            reader: ReaderOptions::from_env(env)?,
        })
    }
}

/// An explicit address wins over a program, which wins over running inline.
fn launch_mode(env: &dyn Environment) -> Result<LaunchMode, CoordinatorError> {
    let non_empty = |key| env.get(key).filter(|value: &String| !value.trim().is_empty());

    if let Some(address) = non_empty(CONNECTOR_READER_ADDRESS) {
        return Ok(LaunchMode::Attach { address });
    }
    if let Some(program) = non_empty(CONNECTOR_READER_PROGRAM) {
        return Ok(LaunchMode::Spawn {
            program,
            args: env.get_list(CONNECTOR_READER_ARGS),
        });
    }
    if env.enabled(CONNECTOR_READER_INLINE, true)? {
        Ok(LaunchMode::Inline)
    } else {
        Err(CoordinatorError::NoReaderConfigured)
    }
}
