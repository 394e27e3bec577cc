// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process coordination backend
//!
//! Implements the session/lock contract without an external service:
//!
//! - sessions expire once twice their TTL elapses unrenewed (one timer task
//!   each), the latest point at which Consul invalidates a session
//! - invalidating a session releases or deletes its keys, fires their
//!   lock-lost signals and starts the key's lock-delay
//! - waiters are woken on every change and race for the key

use super::{BackendError, Connector, CoordinationBackend};
use async_trait::async_trait;
use lr_core::{
    CancellationToken, LockKey, LockLost, SessionBehavior, SessionConfig, SessionId, Signal,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::Instant;

/// Consul invalidates a lapsed session lazily, up to twice its TTL later
const TTL_GRACE_FACTOR: u32 = 2;

fn expiry(config: &SessionConfig, from: Instant) -> Instant {
    from + config.ttl * TTL_GRACE_FACTOR
}

struct SessionEntry {
    config: SessionConfig,
    expires_at: Instant,
    held: HashSet<String>,
}

struct Holder {
    session: SessionId,
    lost: Signal,
}

#[derive(Default)]
struct KeyEntry {
    holder: Option<Holder>,
    /// Number of times the key has been acquired
    lock_index: u64,
}

enum Attempt {
    Granted(LockLost),
    Held,
    Delayed(Instant),
}

#[derive(Default)]
struct State {
    sessions: HashMap<SessionId, SessionEntry>,
    keys: HashMap<String, KeyEntry>,
    lock_delays: HashMap<String, Instant>,
}

impl State {
    fn try_acquire(&mut self, path: &str, session: &SessionId, now: Instant) -> Attempt {
        if let Some(until) = self.lock_delays.get(path).copied() {
            if until > now {
                return Attempt::Delayed(until);
            }
            self.lock_delays.remove(path);
        }

        let entry = self.keys.entry(path.to_string()).or_default();
        match &entry.holder {
            Some(holder) if &holder.session == session => Attempt::Granted(holder.lost.observer()),
            Some(_) => Attempt::Held,
            None => {
                let lost = Signal::new();
                entry.holder = Some(Holder {
                    session: session.clone(),
                    lost: lost.clone(),
                });
                entry.lock_index += 1;
                if let Some(owner) = self.sessions.get_mut(session) {
                    owner.held.insert(path.to_string());
                }
                Attempt::Granted(lost.observer())
            }
        }
    }

    /// Remove a session and let go of its keys. Returns false if unknown.
    fn invalidate(&mut self, id: &SessionId, now: Instant) -> bool {
        let Some(session) = self.sessions.remove(id) else {
            return false;
        };

        for path in session.held {
            let held_by_session = self
                .keys
                .get(&path)
                .and_then(|entry| entry.holder.as_ref())
                .is_some_and(|holder| &holder.session == id);
            if !held_by_session {
                continue;
            }

            match session.config.behavior {
                SessionBehavior::Release => {
                    if let Some(entry) = self.keys.get_mut(&path) {
                        if let Some(holder) = entry.holder.take() {
                            holder.lost.fire();
                        }
                    }
                }
                SessionBehavior::Delete => {
                    if let Some(holder) = self.keys.remove(&path).and_then(|e| e.holder) {
                        holder.lost.fire();
                    }
                }
            }

            if !session.config.lock_delay.is_zero() {
                self.lock_delays
                    .insert(path, now + session.config.lock_delay);
            }
        }
        true
    }
}

struct Inner {
    state: Mutex<State>,
    changed: Notify,
}

/// In-memory backend shared by clones
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                changed: Notify::new(),
            }),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Session currently holding `key`
    pub fn holder(&self, key: &LockKey) -> Option<SessionId> {
        self.state()
            .keys
            .get(&key.path())
            .and_then(|entry| entry.holder.as_ref())
            .map(|holder| holder.session.clone())
    }

    /// Whether the key exists (deleted keys vanish under `delete` behavior)
    pub fn key_exists(&self, key: &LockKey) -> bool {
        self.state().keys.contains_key(&key.path())
    }

    /// How many times `key` has been granted
    pub fn lock_index(&self, key: &LockKey) -> u64 {
        self.state()
            .keys
            .get(&key.path())
            .map_or(0, |entry| entry.lock_index)
    }

    pub fn session_exists(&self, id: &SessionId) -> bool {
        self.state().sessions.contains_key(id)
    }

    pub fn session_count(&self) -> usize {
        self.state().sessions.len()
    }

    /// Invalidate a session from outside its owner, as an operator or a
    /// partition would. Returns false if the session was already gone.
    pub fn invalidate_session(&self, id: &SessionId) -> bool {
        let removed = self.state().invalidate(id, Instant::now());
        if removed {
            tracing::debug!(session = %id, "session invalidated externally");
            self.inner.changed.notify_waiters();
        }
        removed
    }

    async fn expire_when_due(self, id: SessionId) {
        loop {
            let deadline = match self.state().sessions.get(&id) {
                Some(session) => session.expires_at,
                None => return,
            };
            tokio::time::sleep_until(deadline).await;

            let expired = {
                let mut state = self.state();
                let now = Instant::now();
                match state.sessions.get(&id).map(|s| s.expires_at <= now) {
                    None => return,
                    Some(true) => state.invalidate(&id, now),
                    Some(false) => false,
                }
            };
            if expired {
                tracing::debug!(session = %id, "session ttl expired");
                self.inner.changed.notify_waiters();
                return;
            }
        }
    }
}

#[async_trait]
impl CoordinationBackend for MemoryBackend {
    async fn create_session(
        &self,
        config: &SessionConfig,
        cancel: &CancellationToken,
    ) -> Result<SessionId, BackendError> {
        if cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let id = SessionId::new(uuid::Uuid::new_v4().to_string());
        self.state().sessions.insert(
            id.clone(),
            SessionEntry {
                config: config.clone(),
                expires_at: expiry(config, Instant::now()),
                held: HashSet::new(),
            },
        );
        tokio::spawn(self.clone().expire_when_due(id.clone()));

        Ok(id)
    }

    async fn destroy_session(&self, id: &SessionId) -> Result<(), BackendError> {
        if !self.state().invalidate(id, Instant::now()) {
            return Err(BackendError::SessionNotFound(id.to_string()));
        }
        self.inner.changed.notify_waiters();
        Ok(())
    }

    async fn renew_session(&self, id: &SessionId) -> Result<(), BackendError> {
        let mut state = self.state();
        match state.sessions.get_mut(id) {
            Some(session) => {
                session.expires_at = expiry(&session.config, Instant::now());
                Ok(())
            }
            None => Err(BackendError::SessionNotFound(id.to_string())),
        }
    }

    async fn acquire_lock(
        &self,
        key: &LockKey,
        session: &SessionId,
        stop: &CancellationToken,
    ) -> Result<Option<LockLost>, BackendError> {
        let path = key.path();
        loop {
            if stop.is_cancelled() {
                return Ok(None);
            }

            // Register for wake-ups before inspecting state so no release is missed
            let changed = self.inner.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            let delayed_until = {
                let mut state = self.state();
                if !state.sessions.contains_key(session) {
                    return Err(BackendError::InvalidSession {
                        key: path,
                        session: session.to_string(),
                    });
                }
                match state.try_acquire(&path, session, Instant::now()) {
                    Attempt::Granted(lost) => return Ok(Some(lost)),
                    Attempt::Held => None,
                    Attempt::Delayed(until) => Some(until),
                }
            };

            match delayed_until {
                Some(until) => {
                    tokio::select! {
                        _ = stop.cancelled() => return Ok(None),
                        _ = &mut changed => {}
                        _ = tokio::time::sleep_until(until) => {}
                    }
                }
                None => {
                    tokio::select! {
                        _ = stop.cancelled() => return Ok(None),
                        _ = &mut changed => {}
                    }
                }
            }
        }
    }
}

/// Hands out clones of one shared [`MemoryBackend`]
#[derive(Clone, Default)]
pub struct MemoryConnector {
    backend: MemoryBackend,
}

impl MemoryConnector {
    pub fn new(backend: MemoryBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Backend = MemoryBackend;

    async fn connect(&self) -> Result<MemoryBackend, BackendError> {
        Ok(self.backend.clone())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
