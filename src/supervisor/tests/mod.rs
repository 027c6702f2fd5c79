//! Supervisor test suite.
//!
//! All tests drive a real polling worker against a [`ScriptedRemote`], so
//! they exercise the same code paths as production, just over an in-memory
//! transport.

mod commands;
mod lifecycle;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::supervisor::{ConnectionSupervisor, LinkEvent, LinkEventKind};
use crate::testing::ScriptedRemote;
use crate::ClientSnapshot;

/// Upper bound for waiting on an event that should arrive promptly.
const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Long enough for several poll ticks to elapse.
const SETTLE: Duration = Duration::from_millis(100);

fn supervisor_with(remote: &ScriptedRemote) -> ConnectionSupervisor {
    ConnectionSupervisor::for_slot(0, Arc::new(remote.clone()))
}

async fn next_event(rx: &mut broadcast::Receiver<LinkEvent>) -> LinkEvent {
    timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a lifecycle event")
        .expect("event channel closed")
}

async fn expect_kind(rx: &mut broadcast::Receiver<LinkEvent>, kind: LinkEventKind) {
    let event = next_event(rx).await;
    assert_eq!(event.kind, kind);
}

/// Builds a supervisor that is already connected with `snapshot` as its
/// steady state, plus the subscribed event receiver.
async fn connected_supervisor(
    remote: &ScriptedRemote,
    snapshot: ClientSnapshot,
) -> (ConnectionSupervisor, broadcast::Receiver<LinkEvent>) {
    remote.always_ready(snapshot);
    let supervisor = supervisor_with(remote);
    let mut rx = supervisor.subscribe();
    supervisor.start();
    expect_kind(&mut rx, LinkEventKind::Connected).await;
    (supervisor, rx)
}
