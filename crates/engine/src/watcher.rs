// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shutdown watcher

use lr_core::CancellationToken;
use std::future::Future;

/// Wait for the first termination signal and cancel the process scope.
///
/// `signal` resolves to the signal's name. Returns `None` without cancelling
/// anything if the process scope is cancelled first.
pub async fn watch_signals<S>(process: CancellationToken, signal: S) -> Option<String>
where
    S: Future<Output = String>,
{
    tokio::select! {
        biased;
        _ = process.cancelled() => None,
        name = signal => {
            tracing::info!(signal = %name, "exiting received signal {name}");
            process.cancel();
            Some(name)
        }
    }
}
