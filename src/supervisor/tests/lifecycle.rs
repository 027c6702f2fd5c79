//! Connect/quit lifecycle behavior.

use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::sleep;

use super::*;
use crate::testing::RecordedCommand;
use crate::ClientIdentity;

#[tokio::test]
async fn connect_emits_exactly_one_event() {
    let remote = ScriptedRemote::new();
    let snapshot = ClientSnapshot {
        score: 42,
        ..ClientSnapshot::default()
    };
    let (supervisor, mut rx) = connected_supervisor(&remote, snapshot.clone()).await;

    assert!(supervisor.is_connected());
    assert_eq!(supervisor.snapshot(), snapshot);
    assert_eq!(supervisor.identity(), &ClientIdentity::Slot(0));

    // Staying connected produces no further events.
    sleep(SETTLE).await;
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn failed_connect_attempts_emit_no_events() {
    let remote = ScriptedRemote::new();
    remote.connect_not_ready();
    remote.connect_not_ready();
    // Queue drained: stays unreachable.

    let supervisor = supervisor_with(&remote);
    let mut rx = supervisor.subscribe();
    supervisor.start();

    sleep(SETTLE).await;
    assert!(!supervisor.is_connected());
    assert!(supervisor.is_alive());
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    assert!(remote.connect_attempts() >= 2, "worker should keep retrying");
}

#[tokio::test]
async fn connects_after_initial_failures() {
    let remote = ScriptedRemote::new();
    remote.connect_unreachable();
    remote.connect_not_ready();
    remote.connect_ready(ClientSnapshot::default());

    let supervisor = supervisor_with(&remote);
    let mut rx = supervisor.subscribe();
    supervisor.start();

    expect_kind(&mut rx, LinkEventKind::Connected).await;
    assert!(supervisor.is_connected());
    assert_eq!(remote.connect_attempts(), 3);
}

#[tokio::test]
async fn quit_is_idempotent() {
    let remote = ScriptedRemote::new();
    let (supervisor, mut rx) = connected_supervisor(&remote, ClientSnapshot::default()).await;

    supervisor.quit().await;
    supervisor.quit().await;
    supervisor.quit().await;

    expect_kind(&mut rx, LinkEventKind::Disconnected).await;
    sleep(SETTLE).await;
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    assert!(!supervisor.is_alive());
    assert!(!supervisor.is_connected());

    let quits = remote
        .commands()
        .into_iter()
        .filter(|c| *c == RecordedCommand::Quit)
        .count();
    assert_eq!(quits, 1, "remote quit should be sent exactly once");
}

#[tokio::test]
async fn quit_before_connect_skips_remote_command() {
    let remote = ScriptedRemote::new();
    let supervisor = supervisor_with(&remote);
    let mut rx = supervisor.subscribe();

    supervisor.quit().await;

    expect_kind(&mut rx, LinkEventKind::Disconnected).await;
    assert!(!supervisor.is_alive());
    assert!(remote.commands().is_empty(), "no handle to send quit to");
}

#[tokio::test]
async fn snapshot_mirror_follows_polls() {
    let remote = ScriptedRemote::new();
    let (supervisor, _rx) = connected_supervisor(&remote, ClientSnapshot::default()).await;

    let updated = ClientSnapshot {
        score: 1_000_000,
        audio_time: 45_000,
        ..ClientSnapshot::default()
    };
    remote.always_ready(updated.clone());

    sleep(SETTLE).await;
    assert_eq!(supervisor.snapshot(), updated);
}

#[tokio::test]
async fn drop_still_emits_disconnect() {
    let remote = ScriptedRemote::new();
    let (supervisor, mut rx) = connected_supervisor(&remote, ClientSnapshot::default()).await;

    drop(supervisor);

    expect_kind(&mut rx, LinkEventKind::Disconnected).await;

    // The remote quit command goes out on a detached task.
    sleep(SETTLE).await;
    assert!(remote.commands().contains(&RecordedCommand::Quit));
}
