// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced backend wrappers for consistent observability

use crate::backend::{BackendError, Connector, CoordinationBackend};
use async_trait::async_trait;
use lr_core::{CancellationToken, LockKey, LockLost, SessionConfig, SessionId};
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any CoordinationBackend
#[derive(Clone)]
pub struct TracedBackend<B> {
    inner: B,
}

impl<B> TracedBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: CoordinationBackend> CoordinationBackend for TracedBackend<B> {
    async fn create_session(
        &self,
        config: &SessionConfig,
        cancel: &CancellationToken,
    ) -> Result<SessionId, BackendError> {
        let span = tracing::info_span!(
            "backend.create_session",
            name = config.name.as_deref().unwrap_or_default(),
            ttl = ?config.ttl,
        );
        async {
            tracing::debug!(behavior = config.behavior.as_str(), "starting");

            let start = Instant::now();
            let result = self.inner.create_session(config, cancel).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(id) => tracing::debug!(session = %id, elapsed_ms, "session created"),
                Err(BackendError::Cancelled) => {
                    tracing::debug!(elapsed_ms, "session create cancelled")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "session create failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn destroy_session(&self, id: &SessionId) -> Result<(), BackendError> {
        let span = tracing::info_span!("backend.destroy_session", session = %id);
        async {
            let start = Instant::now();
            let result = self.inner.destroy_session(id).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            // A missing session is expected after TTL expiry or external invalidation
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "session destroyed"),
                Err(e) if e.is_not_found() => tracing::warn!(error = %e, "session already gone"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "session destroy failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn renew_session(&self, id: &SessionId) -> Result<(), BackendError> {
        let result = self.inner.renew_session(id).await;
        tracing::trace!(session = %id, ok = result.is_ok(), "renewed");
        result
    }

    async fn acquire_lock(
        &self,
        key: &LockKey,
        session: &SessionId,
        stop: &CancellationToken,
    ) -> Result<Option<LockLost>, BackendError> {
        let span = tracing::info_span!("backend.acquire_lock", key = %key, session = %session);
        async {
            // Precondition: a lock is always taken on behalf of a session
            if session.as_str().is_empty() {
                tracing::error!("empty session id");
                return Err(BackendError::InvalidSession {
                    key: key.path(),
                    session: String::new(),
                });
            }

            tracing::debug!("waiting for lock");

            let start = Instant::now();
            let result = self.inner.acquire_lock(key, session, stop).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(Some(_)) => tracing::debug!(elapsed_ms, "lock granted"),
                Ok(None) => tracing::debug!(elapsed_ms, "lock wait stopped"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "lock acquire failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any Connector; its backends are traced too
#[derive(Clone)]
pub struct TracedConnector<C> {
    inner: C,
}

impl<C> TracedConnector<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: Connector> Connector for TracedConnector<C> {
    type Backend = TracedBackend<C::Backend>;

    async fn connect(&self) -> Result<Self::Backend, BackendError> {
        let span = tracing::info_span!("backend.connect");
        async {
            tracing::info!("connecting");

            let start = Instant::now();
            let result = self.inner.connect().await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "connected"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "connect failed"),
            }
            result.map(TracedBackend::new)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
