// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use std::time::Duration;

fn scopes() -> (CancellationToken, CancellationToken) {
    (CancellationToken::new(), CancellationToken::new())
}

#[test]
fn live_sources_give_live_view() {
    let (process, lock) = scopes();
    let merged = MergedCancellation::new(&process, &lock);

    assert!(!merged.is_cancelled());
    assert_eq!(merged.cause(), None);
}

#[test]
fn process_cancel_cancels_view() {
    let (process, lock) = scopes();
    let merged = MergedCancellation::new(&process, &lock);

    process.cancel();

    assert!(merged.is_cancelled());
    assert_eq!(merged.cause(), Some(CancelCause::Process));
    assert!(!lock.is_cancelled(), "merge must not cancel its sources");
}

#[test]
fn lock_cancel_cancels_view() {
    let (process, lock) = scopes();
    let merged = MergedCancellation::new(&process, &lock);

    lock.cancel();

    assert_eq!(merged.cause(), Some(CancelCause::LockScope));
    assert!(!process.is_cancelled(), "merge must not cancel its sources");
}

#[test]
fn first_observed_cause_is_final() {
    let (process, lock) = scopes();
    let merged = MergedCancellation::new(&process, &lock);

    lock.cancel();
    assert_eq!(merged.cause(), Some(CancelCause::LockScope));

    process.cancel();
    assert_eq!(merged.cause(), Some(CancelCause::LockScope));
}

#[test]
fn both_cancelled_before_observation_reports_process() {
    let (process, lock) = scopes();
    lock.cancel();
    process.cancel();

    let merged = MergedCancellation::new(&process, &lock);
    assert_eq!(merged.cause(), Some(CancelCause::Process));
}

#[test]
fn clones_share_the_latched_cause() {
    let (process, lock) = scopes();
    let merged = MergedCancellation::new(&process, &lock);
    let view = merged.clone();

    lock.cancel();
    assert_eq!(view.cause(), Some(CancelCause::LockScope));

    process.cancel();
    assert_eq!(merged.cause(), Some(CancelCause::LockScope));
}

#[tokio::test]
async fn already_cancelled_source_resolves_without_blocking() {
    let (process, lock) = scopes();
    process.cancel();
    let merged = MergedCancellation::new(&process, &lock);

    let cause = tokio::time::timeout(Duration::from_millis(50), merged.cancelled())
        .await
        .expect("merge with a cancelled scope must resolve immediately");
    assert_eq!(cause, CancelCause::Process);
}

#[tokio::test]
async fn cancelled_wakes_on_lock_scope() {
    let (process, lock) = scopes();
    let merged = MergedCancellation::new(&process, &lock);

    let waiter = {
        let merged = merged.clone();
        tokio::spawn(async move { merged.cancelled().await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    lock.cancel();

    assert_eq!(waiter.await.unwrap(), CancelCause::LockScope);
    assert!(merged.is_cancelled());
}

proptest! {
    #[test]
    fn view_is_union_of_sources(cancel_process in any::<bool>(), cancel_lock in any::<bool>()) {
        let (process, lock) = scopes();
        let merged = MergedCancellation::new(&process, &lock);
        if cancel_process {
            process.cancel();
        }
        if cancel_lock {
            lock.cancel();
        }
        prop_assert_eq!(merged.is_cancelled(), cancel_process || cancel_lock);
    }
}
