// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lr-core: Core types for the lockrace harness
//!
//! This crate provides:
//! - Cancellation primitives (merged view, one-shot signals)
//! - Session and lock-key value types
//! - The pure worker lifecycle state machine
//! - Harness configuration

pub mod cancel;
pub mod config;
pub mod lock;
pub mod session;
pub mod signal;
pub mod worker;

// Re-exports
pub use cancel::{CancelCause, MergedCancellation};
pub use config::{BackendKind, ConfigError, ConsulSettings, HarnessConfig, LockSettings};
pub use lock::LockKey;
pub use session::{SessionBehavior, SessionConfig, SessionId};
pub use signal::{LockLost, Signal};
pub use worker::{TransitionError, WorkerId, WorkerLifecycle, WorkerState};

pub use tokio_util::sync::CancellationToken;
