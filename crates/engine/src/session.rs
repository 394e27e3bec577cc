// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session creation, destruction and keep-alive

use lr_adapters::{BackendError, CoordinationBackend};
use lr_core::{CancellationToken, SessionConfig, SessionId, WorkerId};
use std::time::Duration;
use tokio_util::sync::DropGuard;

/// Creates and destroys worker sessions from one shared config
#[derive(Clone, Debug)]
pub struct SessionManager {
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Session config for one worker; unnamed configs get `lockrace-worker-{id}`
    pub fn config_for(&self, worker: WorkerId) -> SessionConfig {
        let mut config = self.config.clone();
        if config.name.is_none() {
            config.name = Some(format!("lockrace-worker-{worker}"));
        }
        config
    }

    /// Create a session, aborting if `process` fires while the call is in flight
    pub async fn create<B: CoordinationBackend>(
        &self,
        backend: &B,
        worker: WorkerId,
        process: &CancellationToken,
    ) -> Result<SessionId, BackendError> {
        let id = backend
            .create_session(&self.config_for(worker), process)
            .await?;
        tracing::debug!(worker, session = %id, "session created");
        Ok(id)
    }

    /// Destroy a session, releasing every lock it holds.
    ///
    /// Callers own the at-most-once guarantee; see the worker's session slot.
    pub async fn destroy<B: CoordinationBackend>(
        &self,
        backend: &B,
        id: &SessionId,
    ) -> Result<(), BackendError> {
        backend.destroy_session(id).await
    }

    /// Start renewing `id` if a renew interval is configured.
    ///
    /// Renewal stops when the returned guard is dropped.
    pub fn keep_alive<B: CoordinationBackend>(
        &self,
        backend: &B,
        id: &SessionId,
    ) -> Option<KeepAlive> {
        let interval = self.config.renew_interval?;
        let stop = CancellationToken::new();
        tokio::spawn(renew_loop(
            backend.clone(),
            id.clone(),
            interval,
            stop.clone(),
        ));
        Some(KeepAlive {
            _guard: stop.drop_guard(),
        })
    }
}

/// Keeps a session renewed until dropped
#[derive(Debug)]
pub struct KeepAlive {
    _guard: DropGuard,
}

async fn renew_loop<B: CoordinationBackend>(
    backend: B,
    id: SessionId,
    interval: Duration,
    stop: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; the session was just created
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = ticker.tick() => {}
        }
        match backend.renew_session(&id).await {
            Ok(()) => tracing::trace!(session = %id, "session renewed"),
            Err(e) if e.is_not_found() => {
                tracing::warn!(session = %id, "session gone, renewal stopped");
                return;
            }
            Err(e) => tracing::warn!(session = %id, error = %e, "session renew failed"),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
