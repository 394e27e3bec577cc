// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session value types
//!
//! A session is an ephemeral lease issued by the coordination backend. Locks
//! are bound to sessions: when a session is invalidated (destroyed, or its
//! TTL runs out) the backend releases every lock it holds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend-issued session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the backend does with held keys when a session is invalidated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBehavior {
    /// Clear the holder, keep the key
    #[default]
    Release,
    /// Delete the held keys
    Delete,
}

impl SessionBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionBehavior::Release => "release",
            SessionBehavior::Delete => "delete",
        }
    }
}

/// Parameters for creating a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Human-readable session name, shown by the backend
    pub name: Option<String>,
    /// Lease duration; the session is invalidated when it elapses unrenewed
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Minimum time before a key released by invalidation can be re-acquired
    #[serde(with = "humantime_serde")]
    pub lock_delay: Duration,
    pub behavior: SessionBehavior,
    /// Keep-alive period; `None` lets the session expire on its TTL
    #[serde(with = "humantime_serde")]
    pub renew_interval: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: None,
            ttl: Duration::from_secs(10),
            lock_delay: Duration::from_millis(1),
            behavior: SessionBehavior::Release,
            renew_interval: None,
        }
    }
}

impl SessionConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_lock_delay(mut self, lock_delay: Duration) -> Self {
        self.lock_delay = lock_delay;
        self
    }

    pub fn with_behavior(mut self, behavior: SessionBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_renew_interval(mut self, interval: Duration) -> Self {
        self.renew_interval = Some(interval);
        self
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
