//! Registry bookkeeping: slot presence, start convergence, escalation.

use super::*;
use crate::fleet::FleetError;
use crate::ClientIdentity;

#[tokio::test]
async fn start_missing_converges_to_client_count() {
    let h = harness();

    h.manager.start_missing().await.expect("start_missing");

    assert_eq!(h.manager.clients().await.len(), 2, "default count is 2");
    assert!(h.manager.get_client(0).await.is_some());
    assert!(h.manager.get_client(1).await.is_some());
    assert_eq!(h.launcher.launches(), vec![(0, 1), (1, 1)]);
}

#[tokio::test]
async fn start_missing_skips_live_slots() {
    let h = harness();

    h.manager.start_missing().await.expect("first pass");
    h.manager.start_missing().await.expect("second pass");

    assert_eq!(h.manager.clients().await.len(), 2);
    assert_eq!(h.launcher.launches().len(), 2, "no relaunch for live slots");
}

#[tokio::test]
async fn get_client_on_empty_fleet_is_none() {
    let h = harness();
    assert!(h.manager.get_client(5).await.is_none());
}

#[tokio::test]
async fn launch_failure_leaves_slot_absent() {
    let h = harness();
    h.launcher.fail_slot(0);

    let err = h.manager.start_missing().await.expect_err("slot 0 fails");
    match err {
        FleetError::StartFailed { failures } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, 0);
        }
        other => panic!("expected StartFailed, got {other:?}"),
    }

    assert!(h.manager.get_client(0).await.is_none());
    assert!(h.manager.get_client(1).await.is_some(), "slot 1 proceeds");
}

#[tokio::test]
async fn quit_absent_slot_is_a_noop() {
    let h = harness();
    h.manager.quit(5).await;
    assert!(h.manager.clients().await.is_empty());
}

#[tokio::test]
async fn escalation_removes_slot_from_registry() {
    let h = harness();
    let mut events = h.manager.subscribe();

    h.manager.start(0).await.expect("start");
    assert_eq!(
        next_fleet_event(&mut events).await,
        FleetEvent::Joined(ClientIdentity::Slot(0))
    );

    h.remote.fail_remaining_fetches();

    assert_eq!(
        next_fleet_event(&mut events).await,
        FleetEvent::Quit(ClientIdentity::Slot(0))
    );
    assert!(h.manager.get_client(0).await.is_none());
}
