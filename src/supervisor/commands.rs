//! Write-through command surface of the supervisor.
//!
//! Setters issue the remote command immediately but never wait for the
//! mirror to catch up: the locally cached value only changes on the next
//! successful poll, so reads lag writes by up to one poll interval.
//! Boolean toggles are idempotent from the caller's perspective — setting
//! the value already observed issues no remote command.

use crate::remote::RemoteError;
use crate::supervisor::ConnectionSupervisor;
use crate::GameMode;

impl ConnectionSupervisor {
    /// Points the client at a user to spectate.
    pub async fn set_spectate_target(&self, user_id: i32) -> Result<(), RemoteError> {
        let client = self.inner.client.lock().await;
        client
            .as_deref()
            .ok_or(RemoteError::NotConnected)?
            .set_spectate_target(user_id)
            .await
    }

    /// Loads the beatmap with the given checksum.
    pub async fn set_beatmap(&self, checksum: &str) -> Result<(), RemoteError> {
        let client = self.inner.client.lock().await;
        client
            .as_deref()
            .ok_or(RemoteError::NotConnected)?
            .set_beatmap(checksum)
            .await
    }

    /// Sets the background dim level (0-100).
    pub async fn set_dim_level(&self, level: i32) -> Result<(), RemoteError> {
        let client = self.inner.client.lock().await;
        client
            .as_deref()
            .ok_or(RemoteError::NotConnected)?
            .set_dim_level(level)
            .await
    }

    /// Seeks the menu audio to the given time in milliseconds.
    pub async fn set_menu_time(&self, time: i32) -> Result<(), RemoteError> {
        let client = self.inner.client.lock().await;
        client
            .as_deref()
            .ok_or(RemoteError::NotConnected)?
            .set_menu_time(time)
            .await
    }

    /// Switches the client to another game mode.
    pub async fn set_mode(&self, mode: GameMode) -> Result<(), RemoteError> {
        let client = self.inner.client.lock().await;
        client
            .as_deref()
            .ok_or(RemoteError::NotConnected)?
            .change_mode(mode)
            .await
    }

    /// Pokes a client that may have gone idle.
    pub async fn wake_up(&self) -> Result<(), RemoteError> {
        let client = self.inner.client.lock().await;
        client
            .as_deref()
            .ok_or(RemoteError::NotConnected)?
            .wake_up()
            .await
    }

    /// Starts audio playback, unless the mirror already shows it playing.
    pub async fn play_audio(&self) -> Result<(), RemoteError> {
        if self.snapshot().audio_playing {
            return Ok(());
        }
        let client = self.inner.client.lock().await;
        client
            .as_deref()
            .ok_or(RemoteError::NotConnected)?
            .play_audio()
            .await
    }

    /// Sets the buffering flag. A no-op when the observed value already
    /// matches; otherwise issues exactly one toggle command.
    pub async fn set_buffering(&self, value: bool) -> Result<(), RemoteError> {
        if self.snapshot().buffering == value {
            return Ok(());
        }
        let client = self.inner.client.lock().await;
        client
            .as_deref()
            .ok_or(RemoteError::NotConnected)?
            .toggle_buffering()
            .await
    }

    /// Sets the skip-calculations flag, with the same toggle semantics as
    /// [`set_buffering`](Self::set_buffering).
    pub async fn set_skip_calculations(&self, value: bool) -> Result<(), RemoteError> {
        if self.snapshot().skip_calculations == value {
            return Ok(());
        }
        let client = self.inner.client.lock().await;
        client
            .as_deref()
            .ok_or(RemoteError::NotConnected)?
            .toggle_skip_calculations()
            .await
    }

    // Cached reads of the command properties. Each reflects the last poll,
    // not any command issued since.

    /// Last observed spectate target.
    pub fn spectating_id(&self) -> i32 {
        self.snapshot().spectating_id
    }

    /// Last observed menu audio position.
    pub fn menu_time(&self) -> i32 {
        self.snapshot().menu_time
    }

    /// Last observed dim level.
    pub fn dim_level(&self) -> i32 {
        self.snapshot().dim_level
    }

    /// Last observed game mode.
    pub fn mode(&self) -> GameMode {
        self.snapshot().mode
    }

    /// Last observed beatmap checksum.
    pub fn beatmap(&self) -> String {
        self.snapshot().beatmap_checksum
    }

    /// Whether audio was playing at the last poll.
    pub fn audio_playing(&self) -> bool {
        self.snapshot().audio_playing
    }

    /// Whether the client was buffering at the last poll.
    pub fn buffering(&self) -> bool {
        self.snapshot().buffering
    }

    /// Whether score recalculations were skipped at the last poll.
    pub fn skip_calculations(&self) -> bool {
        self.snapshot().skip_calculations
    }
}
