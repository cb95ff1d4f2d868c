// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use connector_env::{EnvError, Environment, get_millis, get_parsed};

pub const CONNECTOR_READER_ADDRESS: &str = "CONNECTOR_READER_ADDRESS";
pub const CONNECTOR_READER_PROGRAM: &str = "CONNECTOR_READER_PROGRAM";
pub const CONNECTOR_READER_ARGS: &str = "CONNECTOR_READER_ARGS";
pub const CONNECTOR_READER_INLINE: &str = "CONNECTOR_READER_INLINE";

pub const CONNECTOR_BIND_HOST: &str = "CONNECTOR_BIND_HOST";
pub const CONNECTOR_WORKER_THREADS: &str = "CONNECTOR_WORKER_THREADS";

pub const CONNECTOR_CONNECT_TIMEOUT_MS: &str = "CONNECTOR_CONNECT_TIMEOUT_MS";
pub const CONNECTOR_CALL_TIMEOUT_MS: &str = "CONNECTOR_CALL_TIMEOUT_MS";
pub const CONNECTOR_STREAM_IDLE_TIMEOUT_MS: &str = "CONNECTOR_STREAM_IDLE_TIMEOUT_MS";
pub const CONNECTOR_SHUTDOWN_GRACE_MS: &str = "CONNECTOR_SHUTDOWN_GRACE_MS";

pub const CONNECTOR_FINGERPRINT_POLICY: &str = "CONNECTOR_FINGERPRINT_POLICY"; // "wildcard" (default) or "strict"
pub const CONNECTOR_TRUST_READER_DECISIONS: &str = "CONNECTOR_TRUST_READER_DECISIONS";
pub const CONNECTOR_SKIP_UNCHANGED_SOURCES: &str = "CONNECTOR_SKIP_UNCHANGED_SOURCES";
pub const CONNECTOR_READER_CHANGE_DETECTION: &str = "CONNECTOR_READER_CHANGE_DETECTION";

/// The driver-side server must be able to answer callbacks while a `GetData` call is in flight,
/// which needs at least two workers.
pub const MIN_WORKER_THREADS: usize = 2;

pub fn get_bind_host(env: &dyn Environment) -> String {
    env.get_or_else(CONNECTOR_BIND_HOST, "127.0.0.1")
}

pub fn get_worker_threads(env: &dyn Environment) -> Result<usize, EnvError> {
    let threads: usize = get_parsed(env, CONNECTOR_WORKER_THREADS, 4)?;
    Ok(threads.max(MIN_WORKER_THREADS))
}

pub fn get_connect_timeout(env: &dyn Environment) -> Result<Duration, EnvError> {
    get_millis(env, CONNECTOR_CONNECT_TIMEOUT_MS, Duration::from_secs(5))
}

pub fn get_call_timeout(env: &dyn Environment) -> Result<Duration, EnvError> {
    get_millis(env, CONNECTOR_CALL_TIMEOUT_MS, Duration::from_secs(30))
}

pub fn get_stream_idle_timeout(env: &dyn Environment) -> Result<Duration, EnvError> {
    get_millis(env, CONNECTOR_STREAM_IDLE_TIMEOUT_MS, Duration::from_secs(60))
}

pub fn get_shutdown_grace(env: &dyn Environment) -> Result<Duration, EnvError> {
    get_millis(env, CONNECTOR_SHUTDOWN_GRACE_MS, Duration::from_secs(5))
}

pub fn get_reader_change_detection(env: &dyn Environment) -> Result<bool, EnvError> {
    env.enabled(CONNECTOR_READER_CHANGE_DETECTION, true)
}
