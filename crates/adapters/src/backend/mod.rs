// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination backend adapters
//!
//! A backend offers two primitives: sessions (leases with a TTL) and locks
//! (keys held by at most one session). Destroying a session releases every
//! lock it holds, which is the only release path the harness uses.

mod consul;
mod memory;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use consul::{ConsulBackend, ConsulConnector, LOCK_FLAG_VALUE};
pub use memory::{MemoryBackend, MemoryConnector};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{BackendCall, FakeBackend, FakeConnector};

use async_trait::async_trait;
use lr_core::{CancellationToken, LockKey, LockLost, SessionConfig, SessionId};
use thiserror::Error;

/// Errors from coordination backend operations
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session {session} cannot lock {key}: invalid session")]
    InvalidSession { key: String, session: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// The session is already gone on the backend
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::SessionNotFound(_))
    }
}

/// Session and lock operations against a coordination backend
#[async_trait]
pub trait CoordinationBackend: Clone + Send + Sync + 'static {
    /// Create a session; aborts with [`BackendError::Cancelled`] once `cancel` fires.
    async fn create_session(
        &self,
        config: &SessionConfig,
        cancel: &CancellationToken,
    ) -> Result<SessionId, BackendError>;

    /// Invalidate a session, releasing every lock it holds.
    async fn destroy_session(&self, id: &SessionId) -> Result<(), BackendError>;

    /// Extend a session's TTL.
    async fn renew_session(&self, id: &SessionId) -> Result<(), BackendError>;

    /// Block until `key` is held by `session`.
    ///
    /// Returns `Ok(None)` when `stop` fires before the lock is granted. A
    /// grant that races with `stop` is still returned as held.
    async fn acquire_lock(
        &self,
        key: &LockKey,
        session: &SessionId,
        stop: &CancellationToken,
    ) -> Result<Option<LockLost>, BackendError>;
}

/// Creates the backend connection
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Backend: CoordinationBackend;

    async fn connect(&self) -> Result<Self::Backend, BackendError>;
}
