// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merged cancellation view
//!
//! A worker lives under two independent cancellation scopes: the process
//! scope (shutdown) and its own lock scope (lock lost, teardown). Deciding
//! whether to proceed must be a single check, so [`MergedCancellation`]
//! folds both into one read-only view that is cancelled as soon as either
//! source is.
//!
//! The view latches the first source it observes as the cause. When both
//! sources are already cancelled at the first observation, the process scope
//! is reported.

use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// Which scope cancelled a merged view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CancelCause {
    /// Process-wide shutdown
    Process,
    /// The worker's own lock scope (lock lost or teardown)
    LockScope,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelCause::Process => write!(f, "process scope cancelled"),
            CancelCause::LockScope => write!(f, "lock scope cancelled"),
        }
    }
}

/// Read-only union of the process scope and a lock scope
#[derive(Clone, Debug)]
pub struct MergedCancellation {
    process: CancellationToken,
    lock: CancellationToken,
    cause: Arc<OnceLock<CancelCause>>,
}

impl MergedCancellation {
    pub fn new(process: &CancellationToken, lock: &CancellationToken) -> Self {
        Self {
            process: process.clone(),
            lock: lock.clone(),
            cause: Arc::new(OnceLock::new()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cause().is_some()
    }

    /// The source that cancelled this view, or `None` while still live.
    pub fn cause(&self) -> Option<CancelCause> {
        if let Some(cause) = self.cause.get() {
            return Some(*cause);
        }
        let observed = if self.process.is_cancelled() {
            CancelCause::Process
        } else if self.lock.is_cancelled() {
            CancelCause::LockScope
        } else {
            return None;
        };
        Some(*self.cause.get_or_init(|| observed))
    }

    /// Wait until either source is cancelled and return the cause.
    pub async fn cancelled(&self) -> CancelCause {
        if let Some(cause) = self.cause() {
            return cause;
        }
        let observed = tokio::select! {
            biased;
            _ = self.process.cancelled() => CancelCause::Process,
            _ = self.lock.cancelled() => CancelCause::LockScope,
        };
        *self.cause.get_or_init(|| observed)
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
