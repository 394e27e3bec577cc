// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lr_adapters::{BackendCall, FakeConnector};
use lr_core::BackendKind;

fn config(work: Duration) -> HarnessConfig {
    HarnessConfig {
        backend: BackendKind::Memory,
        work_duration: work,
        ..HarnessConfig::default()
    }
}

fn no_signal() -> std::future::Pending<String> {
    std::future::pending()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn five_workers_take_turns() {
    let connector = FakeConnector::default();
    let backend = connector.backend().clone();
    let work = Duration::from_millis(40);
    let harness = Harness::new(config(work), connector.clone());

    let summary = harness.run(no_signal()).await.unwrap();

    assert_eq!(summary.reports.len(), 5);
    assert_eq!(summary.count(WorkerState::Released), 5);
    assert!(!summary.holds_overlap());
    assert!(summary.elapsed >= work * 5, "holds are serialized");
    assert_eq!(summary.signal, None);
    assert!(summary.reports.iter().all(|r| r.destroy_calls == 1));
    assert_eq!(
        summary.reports.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 4]
    );

    assert_eq!(connector.connects(), 1, "one shared connection");
    assert_eq!(backend.memory().session_count(), 0);
}

#[tokio::test]
async fn connect_failure_starts_no_workers() {
    let connector = FakeConnector::default();
    connector.fail_with("connection refused");
    let backend = connector.backend().clone();
    let harness = Harness::new(config(Duration::from_millis(10)), connector);

    let err = harness.run(no_signal()).await.unwrap_err();

    assert!(matches!(err, HarnessError::Connect(_)));
    assert!(err.to_string().starts_with("error getting client"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let connector = FakeConnector::default();
    let harness = Harness::new(
        HarnessConfig {
            concurrency: 0,
            ..config(Duration::from_millis(10))
        },
        connector.clone(),
    );

    let err = harness.run(no_signal()).await.unwrap_err();
    assert!(matches!(err, HarnessError::Config(_)));
    assert_eq!(connector.connects(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn signal_mid_acquisition_stops_every_worker() {
    let connector = FakeConnector::default();
    let backend = connector.backend().clone();
    let harness = Harness::new(config(Duration::from_secs(30)), connector);

    let signal = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        "SIGINT".to_string()
    };
    let summary = tokio::time::timeout(Duration::from_secs(5), harness.run(signal))
        .await
        .expect("signal must end the run")
        .unwrap();

    assert_eq!(summary.signal.as_deref(), Some("SIGINT"));
    assert_eq!(summary.reports.len(), 5);
    // One worker was holding the lock; the rest were still waiting
    assert_eq!(summary.count(WorkerState::Released), 1);
    assert_eq!(summary.count(WorkerState::Aborted), 4);
    assert!(summary
        .reports
        .iter()
        .all(|r| r.history.last() == Some(&WorkerState::Done)));

    let destroys = backend
        .calls()
        .iter()
        .filter(|call| matches!(call, BackendCall::DestroySession { .. }))
        .count();
    assert_eq!(destroys, 5, "each session destroyed exactly once");
    assert_eq!(backend.memory().session_count(), 0);
}

#[tokio::test]
async fn custom_lock_key_is_used() {
    let connector = FakeConnector::default();
    let backend = connector.backend().clone();
    let mut config = config(Duration::from_millis(5));
    config.concurrency = 1;
    config.lock.namespace = "orders".to_string();
    config.lock.id = "42".to_string();

    Harness::new(config, connector)
        .run(no_signal())
        .await
        .unwrap();

    assert!(backend.calls().iter().any(|call| matches!(
        call,
        BackendCall::AcquireLock { key, .. } if key == "orders/42"
    )));
}

#[tokio::test(start_paused = true)]
async fn stock_scenario_outlives_session_ttl() {
    // Five workers holding for 3s each on 10s sessions, no renewal
    let connector = FakeConnector::default();
    let backend = connector.backend().clone();
    let config = HarnessConfig {
        backend: BackendKind::Memory,
        ..HarnessConfig::default()
    };
    assert_eq!(config.session.renew_interval, None);

    let summary = Harness::new(config, connector).run(no_signal()).await.unwrap();

    assert_eq!(summary.count(WorkerState::Released), 5);
    assert!(!summary.holds_overlap());
    assert!(summary.elapsed >= Duration::from_secs(15));
    assert_eq!(backend.memory().session_count(), 0);
}
