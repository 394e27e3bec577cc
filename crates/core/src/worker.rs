// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle state machine
//!
//! Each worker walks one acquire → work → release cycle:
//!
//! ```text
//! Init -> ClientReady -> SessionUp -> Acquiring -> Held -> Working -> Released
//!                                        |           |        \
//!                                        |           |         -> LockLostExit
//!                                        |           -> SkippedWork
//!                                        -> Aborted
//! (Init | ClientReady | Acquiring) -> Failed
//! (Released | SkippedWork | Aborted | LockLostExit | Failed) -> Done
//! ```
//!
//! [`WorkerLifecycle`] validates every step and keeps the history so the
//! harness can report how each worker ended.

use thiserror::Error;

/// Ordinal index of a worker within a run
pub type WorkerId = usize;

/// Worker lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkerState {
    Init,
    /// Shared backend connection obtained
    ClientReady,
    /// Session created
    SessionUp,
    /// Blocked on lock acquisition
    Acquiring,
    /// Lock granted by the backend
    Held,
    /// Running the lock-protected workload
    Working,
    /// Work ended with the lock scope live; session destroyed
    Released,
    /// Lock held but cancellation had already fired
    SkippedWork,
    /// Stop fired before acquisition completed
    Aborted,
    /// Lock lost while working
    LockLostExit,
    Failed,
    Done,
}

impl WorkerState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkerState::Init => "init",
            WorkerState::ClientReady => "client_ready",
            WorkerState::SessionUp => "session_up",
            WorkerState::Acquiring => "acquiring",
            WorkerState::Held => "held",
            WorkerState::Working => "working",
            WorkerState::Released => "released",
            WorkerState::SkippedWork => "skipped_work",
            WorkerState::Aborted => "aborted",
            WorkerState::LockLostExit => "lock_lost_exit",
            WorkerState::Failed => "failed",
            WorkerState::Done => "done",
        }
    }

    /// States that lead directly to `Done`
    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            WorkerState::Released
                | WorkerState::SkippedWork
                | WorkerState::Aborted
                | WorkerState::LockLostExit
                | WorkerState::Failed
        )
    }

    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Init, ClientReady)
                | (Init, Failed)
                | (ClientReady, SessionUp)
                | (ClientReady, Failed)
                | (SessionUp, Acquiring)
                | (Acquiring, Held)
                | (Acquiring, Aborted)
                | (Acquiring, Failed)
                | (Held, Working)
                | (Held, SkippedWork)
                | (Working, Released)
                | (Working, LockLostExit)
        ) || (self.is_outcome() && next == Done)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid worker transition {from} -> {to}")]
pub struct TransitionError {
    pub from: WorkerState,
    pub to: WorkerState,
}

/// Tracks one worker's walk through [`WorkerState`]
#[derive(Clone, Debug)]
pub struct WorkerLifecycle {
    id: WorkerId,
    state: WorkerState,
    history: Vec<WorkerState>,
}

impl WorkerLifecycle {
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            state: WorkerState::Init,
            history: vec![WorkerState::Init],
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn history(&self) -> &[WorkerState] {
        &self.history
    }

    /// The state held just before `Done`, once the worker has an outcome
    pub fn outcome(&self) -> Option<WorkerState> {
        self.history.iter().rev().copied().find(|s| s.is_outcome())
    }

    /// Move to `next`, rejecting transitions the machine does not allow
    pub fn advance(&mut self, next: WorkerState) -> Result<WorkerState, TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(worker = self.id, from = %self.state, to = %next, "transition");
        self.state = next;
        self.history.push(next);
        Ok(next)
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
