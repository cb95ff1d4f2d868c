// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use common::env_const::{get_call_timeout, get_connect_timeout, get_reader_change_detection};
use connector_env::{EnvError, Environment};
use connector_proto::StoreQueryClient;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Channel, Endpoint};
use tracing::{info, warn};

use crate::{
    error::ReaderError,
    source::{RecordSource, SourceOpener},
};

/// Where the reader is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderPhase {
    Created,
    Initialized,
    Streaming,
    Terminated,
}

enum Lifecycle {
    Created,
    Initialized(Box<dyn RecordSource>),
    Streaming,
    Terminated,
}

impl Lifecycle {
    fn phase(&self) -> ReaderPhase {
        match self {
            Lifecycle::Created => ReaderPhase::Created,
            Lifecycle::Initialized(_) => ReaderPhase::Initialized,
            Lifecycle::Streaming => ReaderPhase::Streaming,
            Lifecycle::Terminated => ReaderPhase::Terminated,
        }
    }

    fn accepts_initialize(&self) -> Result<(), ReaderError> {
        match self {
            Lifecycle::Terminated => Err(ReaderError::Terminated),
            Lifecycle::Streaming => Err(ReaderError::AlreadyStreaming),
            Lifecycle::Created | Lifecycle::Initialized(_) => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Ask the driver's DetectChange for every record, when a Store-Query address is known.
    pub change_detection: bool,
    pub connect_timeout: Duration,
    pub call_timeout: Duration,
}

impl ReaderOptions {
    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        Ok(Self {
            change_detection: get_reader_change_detection(env)?,
            connect_timeout: get_connect_timeout(env)?,
            call_timeout: get_call_timeout(env)?,
        })
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            change_detection: true,
            connect_timeout: Duration::from_secs(5),
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Everything a reader holds across its lifecycle calls: the opened source, the client for the
/// driver's Store-Query service and the token that stops its serving loop.
pub struct ReaderContext {
    lifecycle: Mutex<Lifecycle>,
    store: RwLock<Option<StoreQueryClient<Channel>>>,
    shutdown: CancellationToken,
    options: ReaderOptions,
}

impl ReaderContext {
    pub fn new(options: ReaderOptions) -> Self {
        Self {
            lifecycle: Mutex::new(Lifecycle::Created),
            store: RwLock::new(None),
            shutdown: CancellationToken::new(),
            options,
        }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn phase(&self) -> ReaderPhase {
        self.lifecycle().phase()
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        // A panic while holding the lock leaves the lifecycle itself consistent
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open the source. A reader that finished (or failed) a run may be initialized again; a
    /// failed open leaves the reader without a source, so a following `getData` is rejected.
    ///
    /// Opening may read the whole source, so it runs on the blocking pool without holding the
    /// lifecycle lock.
    pub async fn initialize(
        &self,
        locator: &str,
        scope_id: &str,
        opener: Arc<dyn SourceOpener>,
    ) -> Result<(), ReaderError> {
        {
            let mut lifecycle = self.lifecycle();
            lifecycle.accepts_initialize()?;
            *lifecycle = Lifecycle::Created;
        }

        let source = {
            let locator = locator.to_string();
            let scope_id = scope_id.to_string();
            tokio::task::spawn_blocking(move || opener.open(&locator, &scope_id)).await??
        };

        // Shutdown or another stream may have got in while the source was opening
        let mut lifecycle = self.lifecycle();
        lifecycle.accepts_initialize()?;
        *lifecycle = Lifecycle::Initialized(source);

        info!(locator, scope_id, "Reader initialized");
        Ok(())
    }

    /// Remember the Store-Query address. The channel connects on first use, so an address that
    /// cannot be reached only degrades the lookups made while streaming.
    pub async fn store_service_available(&self, address: &str) -> Result<(), ReaderError> {
        if self.phase() == ReaderPhase::Terminated {
            return Err(ReaderError::Terminated);
        }

        let uri = common::address::to_endpoint_uri(address);
        let channel = Endpoint::from_shared(uri)
            .map_err(|source| ReaderError::InvalidStoreAddress {
                address: address.to_string(),
                source,
            })?
            .connect_timeout(self.options.connect_timeout)
            .timeout(self.options.call_timeout)
            .connect_lazy();

        *self.store.write().await = Some(StoreQueryClient::new(channel));
        info!(address, "Store-Query service available");
        Ok(())
    }

    /// A client for the Store-Query service, if its address is known.
    pub async fn store_client(&self) -> Option<StoreQueryClient<Channel>> {
        self.store.read().await.clone()
    }

    /// Take the source for a record stream. The returned guard returns the reader to `Created`
    /// when the stream ends or is dropped, unless it was shut down in the meantime.
    pub fn begin_streaming(
        self: &Arc<Self>,
    ) -> Result<(Box<dyn RecordSource>, StreamingGuard), ReaderError> {
        let mut lifecycle = self.lifecycle();
        match std::mem::replace(&mut *lifecycle, Lifecycle::Streaming) {
            Lifecycle::Initialized(source) => Ok((
                source,
                StreamingGuard {
                    context: self.clone(),
                },
            )),
            other => {
                let error = match other {
                    Lifecycle::Streaming => ReaderError::AlreadyStreaming,
                    Lifecycle::Terminated => ReaderError::Terminated,
                    _ => ReaderError::NotInitialized,
                };
                *lifecycle = other;
                Err(error)
            }
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Resolves once `shutdown` has been called.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Release the source and stop the serving loop. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.lifecycle(), Lifecycle::Terminated);
        if matches!(previous, Lifecycle::Terminated) {
            return;
        }
        if matches!(previous, Lifecycle::Streaming) {
            warn!("Shutting down while a record stream is in progress");
        }
        drop(previous);

        self.store.write().await.take();
        self.shutdown.cancel();
        info!("Reader shut down");
    }
}

/// Ends the streaming phase when dropped.
pub struct StreamingGuard {
    context: Arc<ReaderContext>,
}

impl Drop for StreamingGuard {
    fn drop(&mut self) {
        let mut lifecycle = self.context.lifecycle();
        if matches!(*lifecycle, Lifecycle::Streaming) {
            *lifecycle = Lifecycle::Created;
        }
    }
}
