//! IPC wire types for the JSON Lines protocol over Unix domain sockets.

use crate::GameMode;

/// IPC protocol version. Included in every message for forward/backward
/// compatibility.
pub const IPC_VERSION: u32 = 1;

/// A single remote operation, internally tagged by `op`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum IpcOp {
    /// Fetch the full bulk snapshot.
    Snapshot,
    /// Spectate the given user.
    SetSpectateTarget {
        /// User id to spectate.
        user_id: i32,
    },
    /// Load the beatmap with this checksum.
    SetBeatmap {
        /// Beatmap checksum.
        checksum: String,
    },
    /// Set background dim (0-100).
    SetDim {
        /// Dim level.
        level: i32,
    },
    /// Flip the buffering flag.
    ToggleBuffering,
    /// Flip the skip-calculations flag.
    ToggleSkipCalculations,
    /// Seek the menu audio.
    SetMenuTime {
        /// Position in milliseconds.
        time: i32,
    },
    /// Start audio playback.
    PlayAudio,
    /// Switch game mode.
    ChangeMode {
        /// Target mode.
        mode: GameMode,
    },
    /// Poke an idle client.
    WakeUp,
    /// Ask the client process to exit.
    Quit,
}

/// Request envelope from supervisor to client.
///
/// Every message is a single JSON line:
/// `{"version": 1, "op": "snapshot"}\n`
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IpcRequest {
    /// Protocol version (must be [`IPC_VERSION`]).
    pub version: u32,
    /// The operation to perform.
    #[serde(flatten)]
    pub op: IpcOp,
}

impl IpcRequest {
    /// Wraps an operation in a versioned envelope.
    pub fn new(op: IpcOp) -> Self {
        Self {
            version: IPC_VERSION,
            op,
        }
    }

    /// Serializes to a JSON line (with trailing newline).
    pub fn to_json_line(&self) -> String {
        let json = serde_json::to_string(self).expect("failed to serialize IpcRequest");
        format!("{}\n", json)
    }
}

/// Response envelope from client to supervisor.
///
/// Sent as a single JSON line: `{"version": 1, "ok": true, ...}\n`.
/// A snapshot request answered with `ok` but no `data` means the client is
/// up but has not produced bulk data yet (the not-ready case).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IpcResponse {
    /// Protocol version.
    pub version: u32,
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Error message when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Operation-specific payload (the snapshot, for snapshot requests).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl IpcResponse {
    /// Creates a success response with optional data payload.
    pub fn success(data: Option<serde_json::Value>) -> Self {
        Self {
            version: IPC_VERSION,
            ok: true,
            error: None,
            data,
        }
    }

    /// Creates an error response with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            version: IPC_VERSION,
            ok: false,
            error: Some(message.into()),
            data: None,
        }
    }

    /// Serializes to a JSON line (with trailing newline).
    pub fn to_json_line(&self) -> String {
        let json = serde_json::to_string(self).expect("failed to serialize IpcResponse");
        format!("{}\n", json)
    }
}
