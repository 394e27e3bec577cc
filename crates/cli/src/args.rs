// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line arguments and config overrides

use clap::Parser;
use lr_core::{BackendKind, ConfigError, HarnessConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "lockrace",
    version,
    about = "Race concurrent workers for one distributed lock"
)]
pub struct Cli {
    /// TOML config file; flags and environment override its values
    #[arg(long, short, env = "LOCKRACE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Coordination backend (consul or memory)
    #[arg(long, env = "LOCKRACE_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Number of concurrent workers
    #[arg(long, short = 'n', env = "LOCKRACE_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Lock key namespace
    #[arg(long, env = "LOCKRACE_NAMESPACE")]
    pub namespace: Option<String>,

    /// Lock id within the namespace
    #[arg(long, env = "LOCKRACE_LOCK_ID")]
    pub lock_id: Option<String>,

    /// How long each worker holds the lock (e.g. 3s, 250ms)
    #[arg(long, env = "LOCKRACE_WORK", value_parser = humantime::parse_duration)]
    pub work: Option<Duration>,

    /// Consul agent address (host:port)
    #[arg(long, env = "LOCKRACE_CONSUL_ADDRESS")]
    pub address: Option<String>,

    /// Consul ACL token
    #[arg(long, env = "LOCKRACE_CONSUL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Write logs to this file instead of stdout
    #[arg(long, env = "LOCKRACE_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Load the config file (or defaults) and apply overrides
    pub fn load_config(&self) -> Result<HarnessConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut HarnessConfig) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(namespace) = &self.namespace {
            config.lock.namespace = namespace.clone();
        }
        if let Some(id) = &self.lock_id {
            config.lock.id = id.clone();
        }
        if let Some(work) = self.work {
            config.work_duration = work;
        }
        if let Some(address) = &self.address {
            config.consul.address = address.clone();
        }
        if let Some(token) = &self.token {
            config.consul.token = Some(token.clone());
        }
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
