// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harness configuration
//!
//! Every field has a default, so an empty file (or no file at all) runs the
//! stock scenario: five workers racing for `test1/1` on a local Consul agent,
//! each holding the lock for three seconds.
//!
//! ```toml
//! concurrency = 5
//! work_duration = "3s"
//! backend = "consul"
//!
//! [lock]
//! namespace = "test1"
//! id = "1"
//!
//! [session]
//! ttl = "10s"
//! lock_delay = "1ms"
//! behavior = "release"
//!
//! [consul]
//! address = "127.0.0.1:8500"
//! ```

use crate::lock::{LockKey, DEFAULT_LOCK_ID, DEFAULT_NAMESPACE, KEY_PATH_DELIM};
use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Consul accepts lock delays up to one minute
pub const MAX_LOCK_DELAY: Duration = Duration::from_secs(60);
/// Consul's lower TTL bound
pub const CONSUL_MIN_TTL: Duration = Duration::from_secs(10);
/// Consul's upper TTL bound
pub const CONSUL_MAX_TTL: Duration = Duration::from_secs(86_400);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which coordination backend the harness talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Consul,
    /// In-process backend, no external service needed
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "consul" => Ok(BackendKind::Consul),
            "memory" => Ok(BackendKind::Memory),
            other => Err(ConfigError::Invalid(format!("unknown backend: {other}"))),
        }
    }
}

/// The contended key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockSettings {
    pub namespace: String,
    pub id: String,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            id: DEFAULT_LOCK_ID.to_string(),
        }
    }
}

/// Consul agent connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsulSettings {
    /// `host:port` of the agent
    pub address: String,
    pub scheme: String,
    /// ACL token sent as `X-Consul-Token`
    pub token: Option<String>,
    /// Blocking-query wait while another session holds the key
    #[serde(with = "humantime_serde")]
    pub wait_time: Duration,
    /// Pause after a failed acquire before retrying
    #[serde(with = "humantime_serde")]
    pub lock_retry: Duration,
    /// Consecutive monitor errors tolerated before the lock counts as lost
    pub monitor_retries: u32,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ConsulSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8500".to_string(),
            scheme: "http".to_string(),
            token: None,
            wait_time: Duration::from_secs(15),
            lock_retry: Duration::from_secs(5),
            monitor_retries: 0,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ConsulSettings {
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.address)
    }
}

/// Top-level harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Number of concurrent workers
    pub concurrency: usize,
    /// How long each worker holds the lock
    #[serde(with = "humantime_serde")]
    pub work_duration: Duration,
    pub backend: BackendKind,
    pub lock: LockSettings,
    pub session: SessionConfig,
    pub consul: ConsulSettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            work_duration: Duration::from_secs(3),
            backend: BackendKind::Consul,
            lock: LockSettings::default(),
            session: SessionConfig::default(),
            consul: ConsulSettings::default(),
        }
    }
}

impl HarnessConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_toml(&content)
    }

    pub fn lock_key(&self) -> LockKey {
        LockKey::new(&self.lock.namespace, &self.lock.id)
    }

    /// Check the values the backend and workers rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.lock.namespace.is_empty() || self.lock.id.is_empty() {
            return Err(ConfigError::Invalid(
                "lock namespace and id must not be empty".to_string(),
            ));
        }
        if self.lock.id.contains(KEY_PATH_DELIM) {
            return Err(ConfigError::Invalid(format!(
                "lock id must not contain '{KEY_PATH_DELIM}': {}",
                self.lock.id
            )));
        }
        if self.session.ttl.is_zero() {
            return Err(ConfigError::Invalid("session ttl must be non-zero".to_string()));
        }
        if self.session.lock_delay > MAX_LOCK_DELAY {
            return Err(ConfigError::Invalid(format!(
                "session lock_delay must be at most {}",
                humantime::format_duration(MAX_LOCK_DELAY)
            )));
        }
        if let Some(interval) = self.session.renew_interval {
            if interval.is_zero() || interval >= self.session.ttl {
                return Err(ConfigError::Invalid(
                    "session renew_interval must be non-zero and shorter than ttl".to_string(),
                ));
            }
        }
        if self.backend == BackendKind::Consul
            && !(CONSUL_MIN_TTL..=CONSUL_MAX_TTL).contains(&self.session.ttl)
        {
            return Err(ConfigError::Invalid(format!(
                "consul session ttl must be between {} and {}",
                humantime::format_duration(CONSUL_MIN_TTL),
                humantime::format_duration(CONSUL_MAX_TTL)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
