// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker routine
//!
//! One worker takes the shared connection, creates a session, waits for the
//! lock, works while holding it and releases it by destroying the session.
//! Every exit path ends in [`Worker::teardown`], which destroys the session
//! if the slot still holds one. The slot is emptied by whichever destroy runs
//! first, so a session is destroyed at most once.

use crate::lock::LockCoordinator;
use crate::provider::ClientProvider;
use crate::session::{KeepAlive, SessionManager};
use crate::workload::simulate_work;
use lr_adapters::{Connector, CoordinationBackend};
use lr_core::{
    CancellationToken, MergedCancellation, SessionId, WorkerId, WorkerLifecycle, WorkerState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

/// Everything workers share
pub struct WorkerContext<C: Connector> {
    pub provider: Arc<ClientProvider<C>>,
    pub sessions: SessionManager,
    pub lock: LockCoordinator,
    pub work_duration: Duration,
    /// Process-wide shutdown scope
    pub process: CancellationToken,
}

/// Interval during which a worker held the lock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HoldInterval {
    pub acquired_at: Instant,
    /// Taken before the release call, or when the backend invalidated the lock
    pub released_at: Instant,
}

impl HoldInterval {
    pub fn overlaps(&self, other: &HoldInterval) -> bool {
        self.acquired_at < other.released_at && other.acquired_at < self.released_at
    }

    pub fn duration(&self) -> Duration {
        self.released_at.duration_since(self.acquired_at)
    }
}

/// What a worker hands back to the harness
#[derive(Clone, Debug)]
pub struct WorkerReport {
    pub id: WorkerId,
    /// Outcome state (never `Done`; see `history` for the full path)
    pub state: WorkerState,
    pub history: Vec<WorkerState>,
    pub failure: Option<String>,
    pub hold: Option<HoldInterval>,
    /// Destroy calls issued for this worker's session: 0 or 1
    pub destroy_calls: usize,
}

impl WorkerReport {
    pub fn did_work(&self) -> bool {
        self.history.contains(&WorkerState::Working)
    }
}

/// Run one worker to completion
pub async fn run_worker<C: Connector>(id: WorkerId, ctx: Arc<WorkerContext<C>>) -> WorkerReport {
    let span = tracing::info_span!("worker", id);
    async move {
        let mut worker = Worker::new(id, &ctx);
        worker.run().await;
        worker.teardown().await;
        worker.into_report()
    }
    .instrument(span)
    .await
}

struct Worker<'a, C: Connector> {
    ctx: &'a WorkerContext<C>,
    lifecycle: WorkerLifecycle,
    lock_scope: CancellationToken,
    merged: MergedCancellation,
    backend: Option<C::Backend>,
    /// Emptied by the first destroy
    session: Option<SessionId>,
    keep_alive: Option<KeepAlive>,
    lost_watcher: Option<JoinHandle<()>>,
    acquired_at: Option<Instant>,
    released_at: Option<Instant>,
    failure: Option<String>,
    destroy_calls: usize,
}

impl<'a, C: Connector> Worker<'a, C> {
    fn new(id: WorkerId, ctx: &'a WorkerContext<C>) -> Self {
        // Independent of the process scope: lock loss must stay local
        let lock_scope = CancellationToken::new();
        let merged = MergedCancellation::new(&ctx.process, &lock_scope);
        Self {
            ctx,
            lifecycle: WorkerLifecycle::new(id),
            lock_scope,
            merged,
            backend: None,
            session: None,
            keep_alive: None,
            lost_watcher: None,
            acquired_at: None,
            released_at: None,
            failure: None,
            destroy_calls: 0,
        }
    }

    fn id(&self) -> WorkerId {
        self.lifecycle.id()
    }

    fn advance(&mut self, next: WorkerState) {
        // Transitions below follow the lifecycle table; a rejection is a bug
        if let Err(e) = self.lifecycle.advance(next) {
            tracing::error!(error = %e, "worker state machine violated");
        }
    }

    fn fail(&mut self, message: String) {
        self.failure = Some(message);
        self.advance(WorkerState::Failed);
    }

    async fn run(&mut self) {
        let id = self.id();
        let started = Instant::now();

        let backend = match self.ctx.provider.get().await {
            Ok(backend) => backend,
            Err(e) => {
                tracing::error!(error = %e, "error getting client");
                return self.fail(format!("error getting client: {e}"));
            }
        };
        self.backend = Some(backend.clone());
        self.advance(WorkerState::ClientReady);

        let session = match self
            .ctx
            .sessions
            .create(&backend, id, &self.ctx.process)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "error creating session");
                return self.fail(format!("error creating session: {e}"));
            }
        };
        self.session = Some(session.clone());
        self.keep_alive = self.ctx.sessions.keep_alive(&backend, &session);
        self.advance(WorkerState::SessionUp);

        self.advance(WorkerState::Acquiring);
        let lost = match self
            .ctx
            .lock
            .acquire(&backend, id, &session, &self.merged)
            .await
        {
            Ok(Some(lost)) => lost,
            Ok(None) => {
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "lock acquisition stopped"
                );
                return self.advance(WorkerState::Aborted);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to acquire lock");
                return self.fail(format!("failed to acquire lock: {e}"));
            }
        };
        self.acquired_at = Some(Instant::now());
        self.advance(WorkerState::Held);

        self.lost_watcher = Some(LockCoordinator::watch_lost(
            id,
            lost.clone(),
            self.lock_scope.clone(),
        ));

        if self.merged.is_cancelled() {
            tracing::info!("lock acquire interrupted {:?}", started.elapsed());
            self.released_at = Some(Instant::now());
            return self.advance(WorkerState::SkippedWork);
        }
        tracing::info!(session = %session, "acquired lock in {:?}", started.elapsed());
        self.advance(WorkerState::Working);

        if let Some(cause) = simulate_work(self.ctx.work_duration, &self.merged).await {
            tracing::debug!(%cause, "work cut short");
        }

        if self.lock_scope.is_cancelled() {
            let lost_at = lost.lost_at().unwrap_or_else(Instant::now);
            // A loss reported before the grant returned still ends the hold at the grant
            self.released_at = Some(self.acquired_at.map_or(lost_at, |at| lost_at.max(at)));
            tracing::info!("lock cancelled");
            return self.advance(WorkerState::LockLostExit);
        }

        // Our own release fires lock-lost too; that is not a loss
        if let Some(watcher) = self.lost_watcher.take() {
            watcher.abort();
        }
        let release_start = Instant::now();
        self.released_at = Some(release_start);
        self.destroy_session(&backend).await;
        tracing::info!("released lock in {:?}", release_start.elapsed());
        self.advance(WorkerState::Released);
    }

    /// Destroy the session in the slot, if any, and empty the slot
    async fn destroy_session(&mut self, backend: &C::Backend) {
        let Some(session) = self.session.take() else {
            return;
        };
        // Renewing a session that is being destroyed only produces noise
        self.keep_alive = None;
        self.destroy_calls += 1;
        if let Err(e) = self.ctx.sessions.destroy(backend, &session).await {
            tracing::warn!(session = %session, error = %e, "error destroying session");
        }
    }

    async fn teardown(&mut self) {
        self.lock_scope.cancel();
        if let Some(watcher) = self.lost_watcher.take() {
            // Ends on its own once the lock scope is cancelled
            let _ = watcher.await;
        }
        if let Some(backend) = self.backend.clone() {
            self.destroy_session(&backend).await;
        }
        self.keep_alive = None;
        self.advance(WorkerState::Done);
        tracing::debug!(outcome = ?self.lifecycle.outcome(), "worker done");
    }

    fn into_report(self) -> WorkerReport {
        let hold = match (self.acquired_at, self.released_at) {
            (Some(acquired_at), Some(released_at)) => Some(HoldInterval {
                acquired_at,
                released_at,
            }),
            _ => None,
        };
        WorkerReport {
            id: self.lifecycle.id(),
            state: self.lifecycle.outcome().unwrap_or(self.lifecycle.state()),
            history: self.lifecycle.history().to_vec(),
            failure: self.failure,
            hold,
            destroy_calls: self.destroy_calls,
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
