// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot signals
//!
//! A [`Signal`] completes at most once. The first [`Signal::fire`] wins and
//! reports `true`; every later call is a no-op that reports `false`. Waiters
//! observe completion through [`Signal::fired`].
//!
//! [`LockLost`] is the read-only view handed to the owner of a held lock: it
//! can wait for the loss but cannot cause it. The instant of the first fire is
//! kept, so a loss noticed late can still be dated.

use std::sync::{Arc, OnceLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A complete-once notification
#[derive(Clone, Debug, Default)]
pub struct Signal {
    token: CancellationToken,
    fired_at: Arc<OnceLock<Instant>>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete the signal. Returns `true` only for the call that completed it.
    pub fn fire(&self) -> bool {
        let first = self.fired_at.set(Instant::now()).is_ok();
        if first {
            self.token.cancel();
        }
        first
    }

    pub fn has_fired(&self) -> bool {
        self.fired_at.get().is_some()
    }

    /// When the first fire happened
    pub fn fired_at(&self) -> Option<Instant> {
        self.fired_at.get().copied()
    }

    /// Wait until the signal fires. Returns immediately if it already has.
    pub async fn fired(&self) {
        self.token.cancelled().await
    }

    /// Read-only view for lock holders
    pub fn observer(&self) -> LockLost {
        LockLost {
            signal: self.clone(),
        }
    }
}

/// Fires when a held lock is invalidated by the backend
#[derive(Clone, Debug)]
pub struct LockLost {
    signal: Signal,
}

impl LockLost {
    pub fn has_fired(&self) -> bool {
        self.signal.has_fired()
    }

    /// When the backend invalidated the lock
    pub fn lost_at(&self) -> Option<Instant> {
        self.signal.fired_at()
    }

    pub async fn wait(&self) {
        self.signal.fired().await
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
