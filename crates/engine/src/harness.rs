// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harness: warm-up, worker pool, shutdown watcher

use crate::error::HarnessError;
use crate::lock::LockCoordinator;
use crate::provider::ClientProvider;
use crate::session::SessionManager;
use crate::watcher::watch_signals;
use crate::worker::{run_worker, HoldInterval, WorkerContext, WorkerReport};
use lr_adapters::Connector;
use lr_core::{CancellationToken, HarnessConfig, WorkerState};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Outcome of one harness run
#[derive(Clone, Debug)]
pub struct HarnessSummary {
    /// One report per worker, ordered by worker id
    pub reports: Vec<WorkerReport>,
    /// Termination signal received, if any
    pub signal: Option<String>,
    pub elapsed: Duration,
}

impl HarnessSummary {
    pub fn count(&self, state: WorkerState) -> usize {
        self.reports.iter().filter(|r| r.state == state).count()
    }

    /// Any two workers' hold intervals overlap
    pub fn holds_overlap(&self) -> bool {
        let holds: Vec<HoldInterval> = self.reports.iter().filter_map(|r| r.hold).collect();
        holds
            .iter()
            .enumerate()
            .any(|(i, a)| holds[i + 1..].iter().any(|b| a.overlaps(b)))
    }
}

pub struct Harness<C: Connector> {
    config: HarnessConfig,
    provider: Arc<ClientProvider<C>>,
}

impl<C: Connector> Harness<C> {
    pub fn new(config: HarnessConfig, connector: C) -> Self {
        Self {
            config,
            provider: Arc::new(ClientProvider::new(connector)),
        }
    }

    /// Run the worker pool until every worker is done.
    ///
    /// `signal` resolves when a termination signal arrives. Fails only when
    /// the config is invalid or the first connection cannot be made.
    pub async fn run<S>(&self, signal: S) -> Result<HarnessSummary, HarnessError>
    where
        S: Future<Output = String> + Send + 'static,
    {
        self.config.validate()?;
        let started = Instant::now();

        // Warm the client; no worker starts without it
        self.provider.get().await.map_err(HarnessError::Connect)?;

        let process = CancellationToken::new();
        let ctx = Arc::new(WorkerContext {
            provider: Arc::clone(&self.provider),
            sessions: SessionManager::new(self.config.session.clone()),
            lock: LockCoordinator::new(self.config.lock_key()),
            work_duration: self.config.work_duration,
            process: process.clone(),
        });

        tracing::info!(
            concurrency = self.config.concurrency,
            key = %ctx.lock.key(),
            "starting workers"
        );
        let mut workers = JoinSet::new();
        for id in 0..self.config.concurrency {
            workers.spawn(run_worker(id, Arc::clone(&ctx)));
        }
        let watcher = tokio::spawn(watch_signals(process.clone(), signal));

        let mut reports = Vec::with_capacity(self.config.concurrency);
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => {
                    tracing::debug!(worker = report.id, outcome = %report.state, "worker finished");
                    reports.push(report);
                }
                Err(e) => tracing::error!(error = %e, "worker task failed"),
            }
        }
        reports.sort_by_key(|r| r.id);

        process.cancel();
        let signal = match watcher.await {
            Ok(signal) => signal,
            Err(e) => {
                tracing::error!(error = %e, "signal watcher failed");
                None
            }
        };

        let summary = HarnessSummary {
            reports,
            signal,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            released = summary.count(WorkerState::Released),
            skipped = summary.count(WorkerState::SkippedWork),
            aborted = summary.count(WorkerState::Aborted),
            lock_lost = summary.count(WorkerState::LockLostExit),
            failed = summary.count(WorkerState::Failed),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "all workers done"
        );
        tracing::info!("exited");
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "harness_tests.rs"]
mod tests;
