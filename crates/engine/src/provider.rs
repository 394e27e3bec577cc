// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared backend connection
//!
//! One connection serves every worker. It is created on first demand and
//! cached for the life of the provider; concurrent first callers wait on the
//! write lock and the loser of the race reuses the winner's connection.

use lr_adapters::{BackendError, Connector};
use tokio::sync::RwLock;

pub struct ClientProvider<C: Connector> {
    connector: C,
    client: RwLock<Option<C::Backend>>,
}

impl<C: Connector> ClientProvider<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            client: RwLock::new(None),
        }
    }

    /// Return the shared connection, creating it if this is the first use.
    ///
    /// A failed creation leaves the provider empty; the next caller tries again.
    pub async fn get(&self) -> Result<C::Backend, BackendError> {
        if let Some(client) = self.client.read().await.as_ref() {
            return Ok(client.clone());
        }

        let mut slot = self.client.write().await;
        // Recheck: another caller may have connected while we waited
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        let client = self.connector.connect().await?;
        *slot = Some(client.clone());
        Ok(client)
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
