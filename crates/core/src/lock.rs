// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock keys
//!
//! A lock is a key in the backend's key space, namespaced as
//! `{namespace}/{id}`. Every worker in a run contends for the same key.

use serde::{Deserialize, Serialize};

/// Path delimiter between namespace and identifier
pub const KEY_PATH_DELIM: &str = "/";

/// Namespace shared by all harness workers
pub const DEFAULT_NAMESPACE: &str = "test1";

/// Identifier contended for by default
pub const DEFAULT_LOCK_ID: &str = "1";

/// A namespaced lock key
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockKey {
    namespace: String,
    id: String,
}

impl LockKey {
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
        }
    }

    /// Key in the default test namespace
    pub fn test(id: impl Into<String>) -> Self {
        Self::new(DEFAULT_NAMESPACE, id)
    }

    /// Split a full path at its last delimiter
    pub fn parse(path: &str) -> Option<Self> {
        let (namespace, id) = path.rsplit_once(KEY_PATH_DELIM)?;
        if namespace.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(namespace, id))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full key path as stored in the backend
    pub fn path(&self) -> String {
        format!("{}{}{}", self.namespace, KEY_PATH_DELIM, self.id)
    }
}

impl Default for LockKey {
    fn default() -> Self {
        Self::test(DEFAULT_LOCK_ID)
    }
}

impl std::fmt::Display for LockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.namespace, KEY_PATH_DELIM, self.id)
    }
}
