//! Fleet manager owning a concurrent registry of connection supervisors.
//!
//! The manager keeps exactly `client_count` live supervisors, indexed by
//! slot `0..client_count`. Supervisors self-report lifecycle changes over
//! their event channels; a per-slot forwarding task removes quit slots from
//! the registry and republishes fleet-level join/quit events, so the manager
//! never polls supervisor state.
//!
//! Invariant: a slot is present in the registry iff its supervisor is
//! alive. A terminated supervisor is removed before its slot can be
//! restarted.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

use crate::config::{ConfigError, FleetConfig};
use crate::remote::unix::UnixConnector;
use crate::remote::RemoteConnector;
use crate::supervisor::{ConnectionSupervisor, LinkEventKind};
use crate::ClientIdentity;

pub mod launcher;

#[cfg(test)]
mod tests;

use launcher::{GameProcessLauncher, LaunchError, ProcessLauncher};

/// Configuration key for the per-team client group size.
pub const KEY_TEAM_SIZE: &str = "TeamSize";

/// Configuration key for the fleet's target client count.
pub const KEY_CLIENT_COUNT: &str = "FLEX_ClientCount";

/// File name of the fleet configuration inside the install directory.
pub const CONFIG_FILE: &str = "spectator.cfg";

/// File name of the game client executable inside the install directory.
pub const CLIENT_EXECUTABLE: &str = "spectator-client";

const DEFAULT_TEAM_SIZE: &str = "1";
const DEFAULT_CLIENT_COUNT: &str = "2";

/// Capacity of the fleet-level event channel.
const FLEET_EVENT_CAPACITY: usize = 64;

/// Fleet-level lifecycle notification, republished from supervisor events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetEvent {
    /// A supervised client connected.
    Joined(ClientIdentity),
    /// A supervised client quit (explicitly or through escalation).
    Quit(ClientIdentity),
}

/// Errors from fleet operations.
#[derive(Debug, Error)]
pub enum FleetError {
    /// Configuration could not be read or written.
    #[error("configuration error")]
    Config(#[from] ConfigError),

    /// A configuration value is not a valid number.
    #[error("invalid {key} value '{value}'")]
    InvalidConfigValue {
        /// The configuration key.
        key: &'static str,
        /// The offending value.
        value: String,
        /// Underlying parse error.
        #[source]
        source: std::num::ParseIntError,
    },

    /// The external client process could not be launched.
    #[error("failed to launch client process")]
    Launch(#[from] LaunchError),

    /// Some slots failed to start; the others proceeded.
    #[error("failed to start {} client(s)", failures.len())]
    StartFailed {
        /// Per-slot failures, in slot order.
        failures: Vec<(u32, FleetError)>,
    },
}

/// Owns the supervisor registry and the persisted fleet configuration.
pub struct FleetManager {
    config: StdMutex<FleetConfig>,
    launcher: Arc<dyn ProcessLauncher>,
    connector: Arc<dyn RemoteConnector>,
    clients: Arc<RwLock<HashMap<u32, Arc<ConnectionSupervisor>>>>,
    events: broadcast::Sender<FleetEvent>,
}

impl FleetManager {
    /// Creates a manager from explicit collaborators.
    pub fn new(
        config: FleetConfig,
        launcher: Arc<dyn ProcessLauncher>,
        connector: Arc<dyn RemoteConnector>,
    ) -> Self {
        let (events, _rx) = broadcast::channel(FLEET_EVENT_CAPACITY);
        Self {
            config: StdMutex::new(config),
            launcher,
            connector,
            clients: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    /// Opens a manager rooted at a game install directory, using the real
    /// process launcher and the Unix socket transport.
    pub fn open(
        install_dir: impl AsRef<Path>,
        socket_dir: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let dir = install_dir.as_ref();
        let config = FleetConfig::load(dir.join(CONFIG_FILE))?;
        let launcher = Arc::new(GameProcessLauncher::new(dir.join(CLIENT_EXECUTABLE)));
        let connector = Arc::new(UnixConnector::new(socket_dir.as_ref()));
        Ok(Self::new(config, launcher, connector))
    }

    fn config(&self) -> std::sync::MutexGuard<'_, FleetConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configured team size (default 1).
    pub fn team_size(&self) -> Result<u32, FleetError> {
        self.numeric_config(KEY_TEAM_SIZE, DEFAULT_TEAM_SIZE)
    }

    /// Sets the team size in memory; persisted on the next save.
    pub fn set_team_size(&self, team_size: u32) {
        self.config().set(KEY_TEAM_SIZE, team_size);
    }

    /// Configured target client count (default 2).
    pub fn client_count(&self) -> Result<u32, FleetError> {
        self.numeric_config(KEY_CLIENT_COUNT, DEFAULT_CLIENT_COUNT)
    }

    /// Sets the target client count in memory; persisted on the next save.
    pub fn set_client_count(&self, client_count: u32) {
        self.config().set(KEY_CLIENT_COUNT, client_count);
    }

    fn numeric_config(&self, key: &'static str, default: &str) -> Result<u32, FleetError> {
        let value = self.config().get_or(key, default).to_string();
        value
            .parse()
            .map_err(|source| FleetError::InvalidConfigValue { key, value, source })
    }

    /// Persists the in-memory configuration to disk.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        self.config().save()
    }

    /// Re-reads the configuration from disk, replacing the in-memory set.
    pub fn reload_config(&self) -> Result<(), ConfigError> {
        self.config().reload()
    }

    /// Subscribes to fleet-level join/quit events.
    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.events.subscribe()
    }

    /// Looks up the live supervisor for `slot`.
    ///
    /// An absent slot is a normal outcome, not an error.
    pub async fn get_client(&self, slot: u32) -> Option<Arc<ConnectionSupervisor>> {
        let clients = self.clients.read().await;
        clients
            .values()
            .find(|supervisor| supervisor.identity().slot() == Some(slot))
            .cloned()
    }

    /// All live supervisors, in no particular order.
    pub async fn clients(&self) -> Vec<Arc<ConnectionSupervisor>> {
        let clients = self.clients.read().await;
        clients.values().cloned().collect()
    }

    /// Launches the external process for `slot` and registers a fresh
    /// supervisor for it.
    ///
    /// The process is launched first: a launch failure leaves the slot
    /// absent from the registry.
    pub async fn start(&self, slot: u32) -> Result<(), FleetError> {
        tracing::info!(slot, "starting client");

        let team_size = self.team_size()?;
        self.launcher.launch(slot, team_size)?;

        let supervisor = Arc::new(ConnectionSupervisor::for_slot(
            slot,
            Arc::clone(&self.connector),
        ));
        let link_events = supervisor.subscribe();
        supervisor.start();

        self.clients.write().await.insert(slot, Arc::clone(&supervisor));
        self.spawn_presence_forwarder(slot, &supervisor, link_events);
        Ok(())
    }

    /// Starts every slot in `0..client_count` lacking a live supervisor.
    ///
    /// Slots are started in index order; a failure on one slot is recorded
    /// and the remaining slots still proceed.
    pub async fn start_missing(&self) -> Result<(), FleetError> {
        let count = self.client_count()?;

        let mut failures = Vec::new();
        for slot in 0..count {
            if self.get_client(slot).await.is_some() {
                continue;
            }
            if let Err(error) = self.start(slot).await {
                tracing::warn!(slot, %error, "failed to start client");
                failures.push((slot, error));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(FleetError::StartFailed { failures })
        }
    }

    /// Quits the supervisor for `slot` and removes it from the registry.
    ///
    /// Quitting an absent slot is a logged no-op.
    pub async fn quit(&self, slot: u32) {
        let Some(supervisor) = self.get_client(slot).await else {
            tracing::info!(slot, "client does not exist, ignoring quit");
            return;
        };

        tracing::info!(slot, "disconnecting client");
        supervisor.quit().await;

        // The slot may already hold a fresh supervisor if a racing start won;
        // only remove the one we just quit.
        let mut clients = self.clients.write().await;
        if let Some(registered) = clients.get(&slot) {
            if Arc::ptr_eq(registered, &supervisor) {
                clients.remove(&slot);
            }
        }
    }

    /// Quits every currently-registered slot, in slot order.
    pub async fn quit_all(&self) {
        // Snapshot the key set first: slots remove themselves while we walk.
        let mut slots: Vec<u32> = self.clients.read().await.keys().copied().collect();
        slots.sort_unstable();

        for slot in slots {
            self.quit(slot).await;
        }
    }

    /// Quits and restarts one slot.
    pub async fn restart(&self, slot: u32) -> Result<(), FleetError> {
        self.quit(slot).await;
        self.start(slot).await
    }

    /// Quits the whole fleet, persists the configuration, and brings every
    /// configured slot back up.
    pub async fn restart_all(&self) -> Result<(), FleetError> {
        self.quit_all().await;
        self.save_config()?;
        self.start_missing().await
    }

    /// Forwards one supervisor's lifecycle events into the fleet channel,
    /// removing the slot from the registry when it disconnects.
    fn spawn_presence_forwarder(
        &self,
        slot: u32,
        supervisor: &Arc<ConnectionSupervisor>,
        mut link_events: broadcast::Receiver<crate::supervisor::LinkEvent>,
    ) {
        let clients = Arc::clone(&self.clients);
        let fleet_events = self.events.clone();
        let supervisor = Arc::downgrade(supervisor);

        tokio::spawn(async move {
            loop {
                let event = match link_events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                match event.kind {
                    LinkEventKind::Connected => {
                        let _ = fleet_events.send(FleetEvent::Joined(event.identity));
                    }
                    LinkEventKind::Disconnected => {
                        // A restarted slot may already hold a fresh
                        // supervisor; remove only our own entry.
                        let mut registry = clients.write().await;
                        if let Some(registered) = registry.get(&slot) {
                            let ours = supervisor
                                .upgrade()
                                .is_some_and(|current| Arc::ptr_eq(&current, registered));
                            if ours {
                                registry.remove(&slot);
                            }
                        }
                        drop(registry);

                        let _ = fleet_events.send(FleetEvent::Quit(event.identity));
                        break;
                    }
                }
            }
        });
    }
}

impl std::fmt::Debug for FleetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetManager")
            .field("subscriber_count", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}
