// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock acquisition and loss detection
//!
//! Acquisition is stopped through a dedicated token fed by a forwarder task,
//! so the backend sees one plain stop signal no matter which scope fired.
//! Release has no call of its own here: destroying the session releases the
//! lock (see [`crate::SessionManager::destroy`]).

use lr_adapters::{BackendError, CoordinationBackend};
use lr_core::{CancellationToken, LockKey, LockLost, MergedCancellation, SessionId, WorkerId};
use tokio::task::JoinHandle;

#[derive(Clone, Debug)]
pub struct LockCoordinator {
    key: LockKey,
}

impl LockCoordinator {
    pub fn new(key: LockKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// Block until the lock is held by `session` or `merged` fires.
    ///
    /// `Ok(None)` means acquisition was stopped and the caller must not
    /// proceed. A grant that races with the stop is returned as held.
    pub async fn acquire<B: CoordinationBackend>(
        &self,
        backend: &B,
        worker: WorkerId,
        session: &SessionId,
        merged: &MergedCancellation,
    ) -> Result<Option<LockLost>, BackendError> {
        let stop = CancellationToken::new();
        let forwarder = tokio::spawn(forward_stop(worker, merged.clone(), stop.clone()));

        let result = backend.acquire_lock(&self.key, session, &stop).await;
        forwarder.abort();
        result
    }

    /// Cancel `lock_scope` once `lost` fires.
    ///
    /// The task also ends when `lock_scope` is cancelled for any other reason.
    pub fn watch_lost(
        worker: WorkerId,
        lost: LockLost,
        lock_scope: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                _ = lock_scope.cancelled() => {}
                _ = lost.wait() => {
                    tracing::info!(worker, "lock lost");
                    lock_scope.cancel();
                }
            }
        })
    }
}

async fn forward_stop(worker: WorkerId, merged: MergedCancellation, stop: CancellationToken) {
    let cause = merged.cancelled().await;
    tracing::info!(worker, %cause, "notifying lock to stop");
    stop.cancel();
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
