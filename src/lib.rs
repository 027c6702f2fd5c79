//! Spectator Fleet library
//!
//! This crate supervises a fleet of external game-client processes, each
//! exposing a small remote-procedure surface over a named inter-process
//! channel, and keeps a local mirror of each client's live state (playback
//! position, score, current map, mode) fresh enough to drive spectating and
//! broadcast tooling.
//!
//! The moving parts, leaf-first:
//! - [`remote`] — the capability traits for one remote client plus the Unix
//!   domain socket adapter.
//! - [`supervisor`] — the per-client connect/poll/retry state machine.
//! - [`fleet`] — the manager owning a concurrent registry of supervisors.
//!
//! # Platform Support
//!
//! This crate currently supports **Unix-like systems only** (Linux, macOS):
//! the bundled transport adapter uses Unix domain sockets.

use std::fmt;
use std::time::Duration;

/// Flat `key = value` configuration persistence.
pub mod config;

/// Fleet manager owning the supervisor registry.
pub mod fleet;

/// Tracing subscriber initialization.
pub mod logging;

/// Capability traits for a remote client, plus the Unix socket adapter.
pub mod remote;

/// Per-client connection supervisor and its polling worker.
pub mod supervisor;

/// Scripted in-memory remote implementations for tests.
pub mod testing;

/// IPC wire types for the JSON Lines protocol.
mod ipc;
pub use ipc::*;

/// Delay between supervisor polling iterations.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Game mode a client can be in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Main menu / idle.
    #[default]
    Menu,
    /// Actively playing or replaying a map.
    Play,
    /// Map editor.
    Edit,
    /// Post-play results screen.
    Results,
    /// Song select screen.
    SongSelect,
    /// Mode could not be determined by the remote client.
    Unknown,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameMode::Menu => "menu",
            GameMode::Play => "play",
            GameMode::Edit => "edit",
            GameMode::Results => "results",
            GameMode::SongSelect => "song_select",
            GameMode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Last replay action reported by a client's replay engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayAction {
    /// Ordinary frame playback.
    #[default]
    Standard,
    /// A new song started.
    NewSong,
    /// Intro skip.
    Skip,
    /// Replay ran to completion.
    Completion,
    /// Player failed the map.
    Fail,
    /// Playback paused.
    Pause,
    /// Playback resumed.
    Unpause,
    /// Returned to song select.
    SongSelect,
    /// Spectating another player.
    WatchingOther,
}

/// Internal replay-synchronization fields mirrored from a client.
///
/// These drive frame-accurate sync between broadcast clients; they are
/// replaced wholesale with the rest of [`ClientSnapshot`] on every poll.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReplaySync {
    /// Last action observed from the replay engine.
    pub last_action: ReplayAction,
    /// Next score value the replay will sync to.
    pub next_score_sync: i32,
    /// Whether the replay has been wound to its end.
    pub replay_to_end: bool,
    /// Whether the player instance finished loading.
    pub player_loaded: bool,
    /// Whether the client is in replay mode.
    pub replay_mode: bool,
    /// Whether replay frames are still streaming in.
    pub streaming: bool,
    /// Index of the replay frame currently being shown.
    pub current_frame: i32,
}

/// Point-in-time mirror of one remote client's observable state.
///
/// Immutable once produced: the supervisor replaces the whole value on each
/// successful poll and never mutates individual fields, so readers can take
/// a clone at any time and get a self-consistent record.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClientSnapshot {
    /// Current game mode.
    pub mode: GameMode,
    /// User id this client is spectating, `-1` when none.
    pub spectating_id: i32,
    /// Current score shown by this client.
    pub score: i32,
    /// Audio playback position in milliseconds.
    pub audio_time: i32,
    /// Replay playback position in milliseconds.
    pub replay_time: i32,
    /// Whether the client is buffering instead of rendering.
    pub buffering: bool,
    /// Whether expensive score recalculations are disabled.
    pub skip_calculations: bool,
    /// Checksum identifying the loaded beatmap.
    pub beatmap_checksum: String,
    /// Numeric id of the loaded beatmap.
    pub beatmap_id: i32,
    /// Background dim level, 0-100.
    pub dim_level: i32,
    /// Menu audio position in milliseconds.
    pub menu_time: i32,
    /// Whether audio is currently playing.
    pub audio_playing: bool,
    /// Replay-sync internals.
    pub replay_sync: ReplaySync,
}

/// Stable identity of one supervised connection.
///
/// Indexed fleet members get a numeric slot; a manually attached client
/// (outside any fleet) is identified by its channel name instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientIdentity {
    /// Fleet member with a stable slot index in `0..client_count`.
    Slot(u32),
    /// Non-indexed client addressed by a fixed channel name.
    Channel(String),
}

impl ClientIdentity {
    /// Returns the slot index, or `None` for channel-addressed clients.
    pub fn slot(&self) -> Option<u32> {
        match self {
            ClientIdentity::Slot(slot) => Some(*slot),
            ClientIdentity::Channel(_) => None,
        }
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientIdentity::Slot(slot) => write!(f, "{}", slot),
            ClientIdentity::Channel(name) => write!(f, "{}", name),
        }
    }
}
