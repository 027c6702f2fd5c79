//! Scripted in-memory remote implementations for tests.
//!
//! [`ScriptedRemote`] plays both sides of the transport seam: it is a
//! [`RemoteConnector`] whose connect attempts and snapshot fetches follow a
//! pre-loaded script, and every handle it produces records the commands it
//! receives. [`RecordingLauncher`] stands in for the external process
//! launcher.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::fleet::launcher::{LaunchError, ProcessLauncher};
use crate::remote::{ConnectError, RemoteClient, RemoteConnector, RemoteError};
use crate::{ClientSnapshot, GameMode};

/// One scripted reply to a connect attempt.
#[derive(Debug, Clone)]
pub enum ConnectScript {
    /// Succeed with this initial snapshot.
    Ready(ClientSnapshot),
    /// The remote object exists but has no bulk data yet.
    NotReady,
    /// The channel cannot be reached.
    Unreachable,
}

/// One scripted reply to a snapshot fetch.
#[derive(Debug, Clone)]
pub enum FetchScript {
    /// Succeed with this snapshot.
    Ok(ClientSnapshot),
    /// Fail the call.
    Fail,
}

/// A command observed by a scripted client, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// `set_spectate_target(user_id)`.
    SetSpectateTarget(i32),
    /// `set_beatmap(checksum)`.
    SetBeatmap(String),
    /// `set_dim_level(level)`.
    SetDimLevel(i32),
    /// `toggle_buffering()`.
    ToggleBuffering,
    /// `toggle_skip_calculations()`.
    ToggleSkipCalculations,
    /// `set_menu_time(time)`.
    SetMenuTime(i32),
    /// `play_audio()`.
    PlayAudio,
    /// `change_mode(mode)`.
    ChangeMode(GameMode),
    /// `wake_up()`.
    WakeUp,
    /// `quit()`.
    Quit,
}

#[derive(Debug)]
struct ScriptState {
    connects: VecDeque<ConnectScript>,
    /// Connect behavior once the queue is drained; `None` means unreachable.
    steady_connect: Option<ClientSnapshot>,
    fetches: VecDeque<FetchScript>,
    /// Fetch behavior once the queue is drained.
    steady_fetch: FetchScript,
    connect_attempts: usize,
    fetch_attempts: usize,
    commands: Vec<RecordedCommand>,
}

/// Shared scripted transport for connector and clients.
#[derive(Debug, Clone)]
pub struct ScriptedRemote {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedRemote {
    /// Creates a remote that is unreachable until scripted otherwise.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                connects: VecDeque::new(),
                steady_connect: None,
                fetches: VecDeque::new(),
                steady_fetch: FetchScript::Ok(ClientSnapshot::default()),
                connect_attempts: 0,
                fetch_attempts: 0,
                commands: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a successful connect producing `snapshot`; subsequent fetches
    /// keep returning the same snapshot until scripted otherwise.
    pub fn connect_ready(&self, snapshot: ClientSnapshot) {
        let mut state = self.lock();
        state.steady_fetch = FetchScript::Ok(snapshot.clone());
        state.connects.push_back(ConnectScript::Ready(snapshot));
    }

    /// Queues a not-ready connect outcome.
    pub fn connect_not_ready(&self) {
        self.lock().connects.push_back(ConnectScript::NotReady);
    }

    /// Queues an unreachable connect outcome.
    pub fn connect_unreachable(&self) {
        self.lock().connects.push_back(ConnectScript::Unreachable);
    }

    /// Makes every connect attempt succeed once the queue is drained.
    pub fn always_ready(&self, snapshot: ClientSnapshot) {
        let mut state = self.lock();
        state.steady_fetch = FetchScript::Ok(snapshot.clone());
        state.steady_connect = Some(snapshot);
    }

    /// Queues one successful fetch.
    pub fn push_fetch_ok(&self, snapshot: ClientSnapshot) {
        self.lock().fetches.push_back(FetchScript::Ok(snapshot));
    }

    /// Queues one failed fetch.
    pub fn push_fetch_failure(&self) {
        self.lock().fetches.push_back(FetchScript::Fail);
    }

    /// Makes every fetch fail once the queue is drained.
    pub fn fail_remaining_fetches(&self) {
        self.lock().steady_fetch = FetchScript::Fail;
    }

    /// Commands received so far, in order, across all produced handles.
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.lock().commands.clone()
    }

    /// Total connect attempts observed.
    pub fn connect_attempts(&self) -> usize {
        self.lock().connect_attempts
    }

    /// Total snapshot fetches attempted on established handles.
    pub fn fetch_attempts(&self) -> usize {
        self.lock().fetch_attempts
    }
}

impl Default for ScriptedRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteConnector for ScriptedRemote {
    async fn connect(
        &self,
        _channel: &str,
    ) -> Result<(Box<dyn RemoteClient>, ClientSnapshot), ConnectError> {
        let mut state = self.lock();
        state.connect_attempts += 1;

        let script = state.connects.pop_front().unwrap_or_else(|| {
            state
                .steady_connect
                .clone()
                .map_or(ConnectScript::Unreachable, ConnectScript::Ready)
        });
        drop(state);

        match script {
            ConnectScript::Ready(snapshot) => {
                let client = ScriptedClient {
                    state: Arc::clone(&self.state),
                };
                Ok((Box::new(client), snapshot))
            }
            ConnectScript::NotReady => Err(ConnectError::NotReady),
            ConnectScript::Unreachable => Err(ConnectError::Unreachable(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "scripted unreachable",
            ))),
        }
    }
}

/// Handle produced by [`ScriptedRemote`]; records commands and follows the
/// shared fetch script.
#[derive(Debug)]
struct ScriptedClient {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedClient {
    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, command: RecordedCommand) -> Result<(), RemoteError> {
        self.lock().commands.push(command);
        Ok(())
    }
}

#[async_trait]
impl RemoteClient for ScriptedClient {
    async fn fetch_snapshot(&self) -> Result<ClientSnapshot, RemoteError> {
        let mut state = self.lock();
        state.fetch_attempts += 1;
        let script = state
            .fetches
            .pop_front()
            .unwrap_or_else(|| state.steady_fetch.clone());
        match script {
            FetchScript::Ok(snapshot) => Ok(snapshot),
            FetchScript::Fail => Err(RemoteError::Rejected("scripted fetch failure".to_string())),
        }
    }

    async fn set_spectate_target(&self, user_id: i32) -> Result<(), RemoteError> {
        self.record(RecordedCommand::SetSpectateTarget(user_id))
    }

    async fn set_beatmap(&self, checksum: &str) -> Result<(), RemoteError> {
        self.record(RecordedCommand::SetBeatmap(checksum.to_string()))
    }

    async fn set_dim_level(&self, level: i32) -> Result<(), RemoteError> {
        self.record(RecordedCommand::SetDimLevel(level))
    }

    async fn toggle_buffering(&self) -> Result<(), RemoteError> {
        self.record(RecordedCommand::ToggleBuffering)
    }

    async fn toggle_skip_calculations(&self) -> Result<(), RemoteError> {
        self.record(RecordedCommand::ToggleSkipCalculations)
    }

    async fn set_menu_time(&self, time: i32) -> Result<(), RemoteError> {
        self.record(RecordedCommand::SetMenuTime(time))
    }

    async fn play_audio(&self) -> Result<(), RemoteError> {
        self.record(RecordedCommand::PlayAudio)
    }

    async fn change_mode(&self, mode: GameMode) -> Result<(), RemoteError> {
        self.record(RecordedCommand::ChangeMode(mode))
    }

    async fn wake_up(&self) -> Result<(), RemoteError> {
        self.record(RecordedCommand::WakeUp)
    }

    async fn quit(&self) -> Result<(), RemoteError> {
        self.record(RecordedCommand::Quit)
    }
}

/// Records launch requests instead of spawning processes.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    launches: Mutex<Vec<(u32, u32)>>,
    failing_slots: Mutex<HashSet<u32>>,
}

impl RecordingLauncher {
    /// Creates a launcher that records every request and always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes launches for `slot` fail from now on.
    pub fn fail_slot(&self, slot: u32) {
        self.failing_slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(slot);
    }

    /// Recorded `(slot, team_size)` launch requests, in order.
    pub fn launches(&self) -> Vec<(u32, u32)> {
        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&self, slot: u32, team_size: u32) -> Result<(), LaunchError> {
        let failing = self
            .failing_slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&slot);
        if failing {
            return Err(LaunchError::Spawn {
                path: "scripted-launcher".into(),
                source: std::io::Error::other("scripted launch failure"),
            });
        }
        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((slot, team_size));
        Ok(())
    }
}
