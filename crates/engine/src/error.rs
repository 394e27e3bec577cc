// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the harness

use lr_adapters::BackendError;
use lr_core::ConfigError;
use thiserror::Error;

/// Errors that stop the harness before any worker starts
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("error getting client: {0}")]
    Connect(#[source] BackendError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
