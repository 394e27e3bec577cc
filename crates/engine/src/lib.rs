// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lockrace engine: workers racing for one lock

mod error;
mod harness;
mod lock;
mod provider;
mod session;
mod watcher;
mod worker;
mod workload;

pub use error::HarnessError;
pub use harness::{Harness, HarnessSummary};
pub use lock::LockCoordinator;
pub use provider::ClientProvider;
pub use session::{KeepAlive, SessionManager};
pub use watcher::watch_signals;
pub use worker::{run_worker, HoldInterval, WorkerContext, WorkerReport};
pub use workload::simulate_work;
