//! Fleet manager test suite.
//!
//! Tests run the real manager against a [`ScriptedRemote`] transport and a
//! [`RecordingLauncher`], with the configuration file in a temp directory.

mod events;
mod registry;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::config::FleetConfig;
use crate::fleet::{FleetEvent, FleetManager, CONFIG_FILE};
use crate::testing::{RecordingLauncher, ScriptedRemote};
use crate::ClientSnapshot;

/// Upper bound for waiting on an event that should arrive promptly.
const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

struct Harness {
    manager: FleetManager,
    remote: ScriptedRemote,
    launcher: Arc<RecordingLauncher>,
    dir: tempfile::TempDir,
}

/// Manager over an always-connectable scripted remote, empty configuration.
fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = FleetConfig::load(dir.path().join(CONFIG_FILE)).expect("load");

    let remote = ScriptedRemote::new();
    remote.always_ready(ClientSnapshot::default());
    let launcher = Arc::new(RecordingLauncher::new());

    let manager = FleetManager::new(
        config,
        Arc::clone(&launcher) as Arc<dyn crate::fleet::launcher::ProcessLauncher>,
        Arc::new(remote.clone()),
    );

    Harness {
        manager,
        remote,
        launcher,
        dir,
    }
}

async fn next_fleet_event(rx: &mut broadcast::Receiver<FleetEvent>) -> FleetEvent {
    timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a fleet event")
        .expect("fleet event channel closed")
}
