// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lock-protected workload

use lr_core::{CancelCause, MergedCancellation};
use std::time::Duration;

/// Sleep for `duration` or until `merged` fires, whichever comes first.
///
/// Returns the cancellation cause when the work was cut short.
pub async fn simulate_work(duration: Duration, merged: &MergedCancellation) -> Option<CancelCause> {
    tokio::select! {
        cause = merged.cancelled() => Some(cause),
        _ = tokio::time::sleep(duration) => None,
    }
}
