//! Capability traits for one remote game client.
//!
//! A remote client is an out-of-process peer reached via a named channel.
//! It exposes exactly three things: a connect handshake, a bulk state fetch,
//! and a set of fire-and-forget commands. Call failure is the only failure
//! signal — the supervisor treats a failed command the same as a failed
//! poll.
//!
//! [`RemoteConnector`] is the factory seam: one implementation per actual
//! transport. The bundled adapter ([`unix::UnixConnector`]) speaks JSON
//! Lines over Unix domain sockets.

use async_trait::async_trait;
use thiserror::Error;

use crate::{ClientSnapshot, GameMode};

pub mod unix;

/// Channel name for the default, non-indexed client.
pub const DEFAULT_CHANNEL: &str = "spectator";

/// Returns the channel name for an indexed fleet slot.
///
/// The name is derived deterministically so the launched client process and
/// its supervisor agree without any rendezvous step.
pub fn slot_channel(slot: u32) -> String {
    format!("spectator-client-{}", slot)
}

/// Errors from calls on an established remote handle.
///
/// Every variant is treated identically by the supervisor: it counts against
/// the per-iteration retry budget and, if the budget is exhausted while
/// connected, triggers link abandonment.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The underlying channel failed mid-call (peer exited, pipe broke).
    #[error("remote call failed")]
    Io(#[from] std::io::Error),

    /// The peer answered with something the protocol does not allow.
    #[error("remote returned a malformed reply: {0}")]
    Protocol(String),

    /// The peer answered with an explicit error.
    #[error("remote rejected the call: {0}")]
    Rejected(String),

    /// No live handle — the supervisor is not connected.
    #[error("not connected to the remote client")]
    NotConnected,
}

/// Non-fatal outcomes of a connect attempt.
///
/// Both variants mean "not connected yet, try again next tick"; the
/// supervisor never distinguishes them beyond logging.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The remote object exists but has not produced bulk data yet.
    #[error("remote client is not ready yet")]
    NotReady,

    /// The channel cannot be reached at all.
    #[error("channel unreachable")]
    Unreachable(#[source] std::io::Error),
}

/// Typed proxy to one external client's exposed operations.
///
/// All command operations are best-effort: the remote process may have
/// exited between poll ticks, in which case the call fails with
/// [`RemoteError::Io`] and the caller decides what that means.
#[async_trait]
pub trait RemoteClient: Send + Sync + std::fmt::Debug {
    /// Fetches a fresh bulk snapshot of the client's observable state.
    async fn fetch_snapshot(&self) -> Result<ClientSnapshot, RemoteError>;

    /// Points the client at a user to spectate.
    async fn set_spectate_target(&self, user_id: i32) -> Result<(), RemoteError>;

    /// Loads the beatmap with the given checksum.
    async fn set_beatmap(&self, checksum: &str) -> Result<(), RemoteError>;

    /// Sets the background dim level (0-100).
    async fn set_dim_level(&self, level: i32) -> Result<(), RemoteError>;

    /// Flips the client's buffering state.
    async fn toggle_buffering(&self) -> Result<(), RemoteError>;

    /// Flips whether the client skips score recalculations.
    async fn toggle_skip_calculations(&self) -> Result<(), RemoteError>;

    /// Seeks the menu audio to the given time in milliseconds.
    async fn set_menu_time(&self, time: i32) -> Result<(), RemoteError>;

    /// Starts audio playback.
    async fn play_audio(&self) -> Result<(), RemoteError>;

    /// Switches the client to another game mode.
    async fn change_mode(&self, mode: GameMode) -> Result<(), RemoteError>;

    /// Pokes a client that may have gone idle.
    async fn wake_up(&self) -> Result<(), RemoteError>;

    /// Asks the client process to exit.
    async fn quit(&self) -> Result<(), RemoteError>;
}

/// Transport seam: connects to a remote client over a named channel.
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    /// Attempts to reach the client behind `channel`.
    ///
    /// On success returns the live handle together with the initial bulk
    /// snapshot produced during the handshake.
    async fn connect(
        &self,
        channel: &str,
    ) -> Result<(Box<dyn RemoteClient>, ClientSnapshot), ConnectError>;
}
