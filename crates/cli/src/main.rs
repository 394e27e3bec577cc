// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lockrace - concurrent workers racing for one distributed lock

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod args;
mod logging;
mod signals;

use anyhow::{Context, Result};
use clap::Parser;
use lr_adapters::{ConsulConnector, Connector, MemoryConnector, TracedConnector};
use lr_core::{BackendKind, HarnessConfig};
use lr_engine::{Harness, HarnessSummary};

use crate::args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::setup(cli.log_file.as_deref())?;

    let config = cli.load_config()?;
    match config.backend {
        BackendKind::Consul => {
            let connector = ConsulConnector::new(config.consul.clone());
            run(config, connector).await?;
        }
        BackendKind::Memory => {
            run(config, MemoryConnector::default()).await?;
        }
    }
    Ok(())
}

async fn run<C: Connector>(config: HarnessConfig, connector: C) -> Result<HarnessSummary> {
    let signal = signals::termination().context("failed to install signal handlers")?;
    let harness = Harness::new(config, TracedConnector::new(connector));
    Ok(harness.run(signal).await?)
}
