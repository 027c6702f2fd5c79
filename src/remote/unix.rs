//! Unix domain socket adapter for the remote client capability traits.
//!
//! Each client process listens on a socket named after its channel inside a
//! shared socket directory. Requests and responses are single JSON lines
//! ([`IpcRequest`] / [`IpcResponse`]); calls are strictly request/reply, so
//! one stream mutex is enough to serialize them.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufStream};
use tokio::net::UnixStream;
use tokio::sync::Mutex;

use crate::remote::{ConnectError, RemoteClient, RemoteConnector, RemoteError};
use crate::{ClientSnapshot, GameMode, IpcOp, IpcRequest, IpcResponse};

/// Connects to client processes over Unix domain sockets.
///
/// The socket for channel `c` lives at `<socket_dir>/<c>.sock`.
#[derive(Debug, Clone)]
pub struct UnixConnector {
    socket_dir: PathBuf,
}

impl UnixConnector {
    /// Creates a connector rooted at the given socket directory.
    pub fn new(socket_dir: impl Into<PathBuf>) -> Self {
        Self {
            socket_dir: socket_dir.into(),
        }
    }

    /// Returns the socket path for a channel name.
    pub fn socket_path(&self, channel: &str) -> PathBuf {
        self.socket_dir.join(format!("{}.sock", channel))
    }
}

#[async_trait]
impl RemoteConnector for UnixConnector {
    async fn connect(
        &self,
        channel: &str,
    ) -> Result<(Box<dyn RemoteClient>, ClientSnapshot), ConnectError> {
        let path = self.socket_path(channel);
        let stream = UnixStream::connect(&path)
            .await
            .map_err(ConnectError::Unreachable)?;

        let client = UnixClient::new(stream);

        // The handshake is a first snapshot fetch: a reply without bulk data
        // means the client is up but not ready to be mirrored yet.
        match client.try_snapshot().await {
            Ok(Some(snapshot)) => Ok((Box::new(client), snapshot)),
            Ok(None) => Err(ConnectError::NotReady),
            Err(RemoteError::Io(e)) => Err(ConnectError::Unreachable(e)),
            Err(e) => Err(ConnectError::Unreachable(io::Error::other(e))),
        }
    }
}

/// Live handle to one client over an established Unix socket.
pub struct UnixClient {
    stream: Mutex<BufStream<UnixStream>>,
}

impl UnixClient {
    /// Wraps an established stream.
    pub fn new(stream: UnixStream) -> Self {
        Self {
            stream: Mutex::new(BufStream::new(stream)),
        }
    }

    /// Sends one request line and reads one response line.
    async fn call(&self, op: IpcOp) -> Result<IpcResponse, RemoteError> {
        let mut stream = self.stream.lock().await;

        let line = IpcRequest::new(op).to_json_line();
        stream.write_all(line.as_bytes()).await?;
        stream.flush().await?;

        let mut reply = String::new();
        let n = stream.read_line(&mut reply).await?;
        if n == 0 {
            return Err(RemoteError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "remote closed the channel",
            )));
        }

        let response: IpcResponse =
            serde_json::from_str(reply.trim()).map_err(|e| RemoteError::Protocol(e.to_string()))?;
        if !response.ok {
            return Err(RemoteError::Rejected(
                response.error.unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }
        Ok(response)
    }

    /// Fire-and-forget command: any successful reply is discarded.
    async fn command(&self, op: IpcOp) -> Result<(), RemoteError> {
        self.call(op).await.map(|_| ())
    }

    /// Fetches a snapshot, distinguishing "no bulk data yet" from failure.
    pub(crate) async fn try_snapshot(&self) -> Result<Option<ClientSnapshot>, RemoteError> {
        let response = self.call(IpcOp::Snapshot).await?;
        match response.data {
            Some(value) => {
                let snapshot = serde_json::from_value(value)
                    .map_err(|e| RemoteError::Protocol(e.to_string()))?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RemoteClient for UnixClient {
    async fn fetch_snapshot(&self) -> Result<ClientSnapshot, RemoteError> {
        match self.try_snapshot().await? {
            Some(snapshot) => Ok(snapshot),
            // Established links are expected to keep producing bulk data.
            None => Err(RemoteError::Protocol(
                "snapshot missing from reply".to_string(),
            )),
        }
    }

    async fn set_spectate_target(&self, user_id: i32) -> Result<(), RemoteError> {
        self.command(IpcOp::SetSpectateTarget { user_id }).await
    }

    async fn set_beatmap(&self, checksum: &str) -> Result<(), RemoteError> {
        self.command(IpcOp::SetBeatmap {
            checksum: checksum.to_string(),
        })
        .await
    }

    async fn set_dim_level(&self, level: i32) -> Result<(), RemoteError> {
        self.command(IpcOp::SetDim { level }).await
    }

    async fn toggle_buffering(&self) -> Result<(), RemoteError> {
        self.command(IpcOp::ToggleBuffering).await
    }

    async fn toggle_skip_calculations(&self) -> Result<(), RemoteError> {
        self.command(IpcOp::ToggleSkipCalculations).await
    }

    async fn set_menu_time(&self, time: i32) -> Result<(), RemoteError> {
        self.command(IpcOp::SetMenuTime { time }).await
    }

    async fn play_audio(&self) -> Result<(), RemoteError> {
        self.command(IpcOp::PlayAudio).await
    }

    async fn change_mode(&self, mode: GameMode) -> Result<(), RemoteError> {
        self.command(IpcOp::ChangeMode { mode }).await
    }

    async fn wake_up(&self) -> Result<(), RemoteError> {
        self.command(IpcOp::WakeUp).await
    }

    async fn quit(&self) -> Result<(), RemoteError> {
        self.command(IpcOp::Quit).await
    }
}

impl std::fmt::Debug for UnixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixClient").finish_non_exhaustive()
    }
}

/// Socket path for a channel, matching [`UnixConnector::socket_path`].
///
/// Useful for test servers that need to bind where a connector will look.
pub fn socket_path_for(socket_dir: &Path, channel: &str) -> PathBuf {
    socket_dir.join(format!("{}.sock", channel))
}
