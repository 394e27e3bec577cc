// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS termination signals

use std::future::Future;
use tokio::signal::unix::{signal, SignalKind};

/// Register for SIGINT, SIGTERM and SIGQUIT.
///
/// Handlers are installed immediately; the returned future resolves with the
/// name of the first signal received. SIGKILL cannot be caught.
pub fn termination() -> std::io::Result<impl Future<Output = String> + Send + 'static> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    Ok(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
            _ = quit.recv() => "SIGQUIT",
        };
        name.to_string()
    })
}
