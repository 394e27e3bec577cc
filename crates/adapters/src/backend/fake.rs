// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake coordination backend for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{BackendError, Connector, CoordinationBackend, MemoryBackend};
use async_trait::async_trait;
use lr_core::{CancellationToken, LockKey, LockLost, SessionConfig, SessionId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateSession { name: Option<String> },
    DestroySession { id: SessionId },
    RenewSession { id: SessionId },
    AcquireLock { key: String, session: SessionId },
}

#[derive(Default)]
struct Failures {
    create_session: Option<String>,
    acquire: Option<String>,
    destroy: Option<String>,
}

/// Records every call and delegates to a [`MemoryBackend`]
#[derive(Clone, Default)]
pub struct FakeBackend {
    memory: MemoryBackend,
    calls: Arc<Mutex<Vec<BackendCall>>>,
    failures: Arc<Mutex<Failures>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of destroy calls made for `id`
    pub fn destroy_calls(&self, id: &SessionId) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, BackendCall::DestroySession { id: d } if d == id))
            .count()
    }

    /// Number of `create_session` calls, failed ones included
    pub fn create_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, BackendCall::CreateSession { .. }))
            .count()
    }

    /// The backing store, for inspecting holders and invalidating sessions
    pub fn memory(&self) -> &MemoryBackend {
        &self.memory
    }

    /// Make every following `create_session` fail
    pub fn fail_create_session(&self, message: impl Into<String>) {
        self.failures().create_session = Some(message.into());
    }

    /// Make every following `acquire_lock` fail
    pub fn fail_acquire(&self, message: impl Into<String>) {
        self.failures().acquire = Some(message.into());
    }

    /// Make every following `destroy_session` fail after recording the call
    pub fn fail_destroy(&self, message: impl Into<String>) {
        self.failures().destroy = Some(message.into());
    }

    fn failures(&self) -> std::sync::MutexGuard<'_, Failures> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: BackendCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

#[async_trait]
impl CoordinationBackend for FakeBackend {
    async fn create_session(
        &self,
        config: &SessionConfig,
        cancel: &CancellationToken,
    ) -> Result<SessionId, BackendError> {
        self.record(BackendCall::CreateSession {
            name: config.name.clone(),
        });
        let failure = self.failures().create_session.clone();
        if let Some(message) = failure {
            return Err(BackendError::Other(message));
        }
        self.memory.create_session(config, cancel).await
    }

    async fn destroy_session(&self, id: &SessionId) -> Result<(), BackendError> {
        self.record(BackendCall::DestroySession { id: id.clone() });
        let failure = self.failures().destroy.clone();
        if let Some(message) = failure {
            return Err(BackendError::Other(message));
        }
        self.memory.destroy_session(id).await
    }

    async fn renew_session(&self, id: &SessionId) -> Result<(), BackendError> {
        self.record(BackendCall::RenewSession { id: id.clone() });
        self.memory.renew_session(id).await
    }

    async fn acquire_lock(
        &self,
        key: &LockKey,
        session: &SessionId,
        stop: &CancellationToken,
    ) -> Result<Option<LockLost>, BackendError> {
        self.record(BackendCall::AcquireLock {
            key: key.path(),
            session: session.clone(),
        });
        let failure = self.failures().acquire.clone();
        if let Some(message) = failure {
            return Err(BackendError::Other(message));
        }
        self.memory.acquire_lock(key, session, stop).await
    }
}

/// Fake connector that counts connection attempts
#[derive(Clone, Default)]
pub struct FakeConnector {
    backend: FakeBackend,
    connects: Arc<AtomicUsize>,
    failure: Arc<Mutex<Option<String>>>,
    delay: Option<Duration>,
}

impl FakeConnector {
    pub fn new(backend: FakeBackend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Slow every connection attempt down by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make connection attempts fail
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    pub fn backend(&self) -> &FakeBackend {
        &self.backend
    }

    /// Number of connection attempts so far
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Backend = FakeBackend;

    async fn connect(&self) -> Result<FakeBackend, BackendError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self
            .failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match failure {
            Some(message) => Err(BackendError::Connect(message)),
            None => Ok(self.backend.clone()),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
