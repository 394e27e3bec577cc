// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lr_adapters::FakeConnector;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn first_get_connects_then_caches() {
    let connector = FakeConnector::default();
    let provider = ClientProvider::new(connector.clone());
    assert!(!provider.is_connected().await);

    provider.get().await.unwrap();
    provider.get().await.unwrap();

    assert!(provider.is_connected().await);
    assert_eq!(connector.connects(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_use_creates_one_connection() {
    let connector = FakeConnector::default().with_delay(Duration::from_millis(50));
    let provider = Arc::new(ClientProvider::new(connector.clone()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.get().await.map(|_| ()) })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(connector.connects(), 1);
}

#[tokio::test]
async fn failed_connect_is_reported_and_not_cached() {
    let connector = FakeConnector::default();
    connector.fail_with("connection refused");
    let provider = ClientProvider::new(connector.clone());

    let err = provider.get().await.err().unwrap();
    assert!(err.to_string().contains("connection refused"));
    assert!(!provider.is_connected().await);
    assert_eq!(connector.connects(), 1);
}
