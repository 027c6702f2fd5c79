//! Fleet-level event republishing.

use super::*;
use crate::ClientIdentity;

#[tokio::test]
async fn joined_event_carries_slot_identity() {
    let h = harness();
    let mut events = h.manager.subscribe();

    h.manager.start(3).await.expect("start");

    assert_eq!(
        next_fleet_event(&mut events).await,
        FleetEvent::Joined(ClientIdentity::Slot(3))
    );
}

#[tokio::test]
async fn explicit_quit_is_republished() {
    let h = harness();
    let mut events = h.manager.subscribe();

    h.manager.start(0).await.expect("start");
    assert_eq!(
        next_fleet_event(&mut events).await,
        FleetEvent::Joined(ClientIdentity::Slot(0))
    );

    h.manager.quit(0).await;
    assert_eq!(
        next_fleet_event(&mut events).await,
        FleetEvent::Quit(ClientIdentity::Slot(0))
    );
}

#[tokio::test]
async fn each_slot_reports_its_own_identity() {
    let h = harness();
    let mut events = h.manager.subscribe();

    h.manager.start_missing().await.expect("bring up");

    let mut joined: Vec<FleetEvent> = vec![
        next_fleet_event(&mut events).await,
        next_fleet_event(&mut events).await,
    ];
    joined.sort_by_key(|event| match event {
        FleetEvent::Joined(ClientIdentity::Slot(slot)) => *slot,
        other => panic!("expected Joined, got {other:?}"),
    });

    assert_eq!(
        joined,
        vec![
            FleetEvent::Joined(ClientIdentity::Slot(0)),
            FleetEvent::Joined(ClientIdentity::Slot(1)),
        ]
    );
}
