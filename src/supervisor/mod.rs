//! Per-client connection supervisor.
//!
//! A supervisor owns one remote client link and keeps its snapshot mirror
//! fresh from a dedicated polling worker. The worker connects, refreshes
//! state every [`POLL_INTERVAL`](crate::POLL_INTERVAL), and retries through
//! transient failures; a connected link that stays broken past the
//! per-iteration retry budget is abandoned with a single Disconnect event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock as StdRwLock};

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::remote::{slot_channel, RemoteClient, RemoteConnector, RemoteError, DEFAULT_CHANNEL};
use crate::{ClientIdentity, ClientSnapshot, POLL_INTERVAL};

mod commands;

#[cfg(test)]
mod tests;

/// Capacity of the per-supervisor lifecycle event channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// How many consecutive failures one polling iteration may absorb before
/// the link is considered unrecoverable. IPC can be unstable under high
/// load, so a single failed call is retried immediately within the tick.
const MAX_RETRIES_PER_TICK: u8 = 10;

/// Lifecycle transition of one supervised link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEventKind {
    /// The link transitioned from Disconnected to Connected.
    Connected,
    /// The link was terminated (explicit quit or escalation).
    Disconnected,
}

/// Event emitted by a supervisor on lifecycle transitions.
#[derive(Debug, Clone)]
pub struct LinkEvent {
    /// Identity of the supervised client.
    pub identity: ClientIdentity,
    /// Which transition occurred.
    pub kind: LinkEventKind,
}

/// Supervises one remote client connection.
///
/// State machine: `Disconnected` → `Connected` → `Terminated` (terminal).
/// The snapshot mirror is replaced wholesale on each successful poll and can
/// be read at any time; readers tolerate being one poll behind.
///
/// Dropping the supervisor is the safety net for a skipped explicit quit:
/// the worker is stopped and the Disconnect event still fires exactly once.
pub struct ConnectionSupervisor {
    inner: Arc<Inner>,
    worker: StdMutex<Option<JoinHandle<()>>>,
}

struct Inner {
    identity: ClientIdentity,
    channel: String,
    connector: Arc<dyn RemoteConnector>,
    /// Live handle, present only while connected. Released on quit.
    client: Mutex<Option<Box<dyn RemoteClient>>>,
    /// Last successfully fetched state mirror.
    snapshot: StdRwLock<ClientSnapshot>,
    connected: AtomicBool,
    alive: AtomicBool,
    events: broadcast::Sender<LinkEvent>,
}

impl ConnectionSupervisor {
    /// Creates a supervisor for an indexed fleet slot.
    ///
    /// The remote channel name is derived deterministically from the slot.
    pub fn for_slot(slot: u32, connector: Arc<dyn RemoteConnector>) -> Self {
        Self::with_identity(ClientIdentity::Slot(slot), slot_channel(slot), connector)
    }

    /// Creates a supervisor for the default, non-indexed client.
    pub fn for_default_channel(connector: Arc<dyn RemoteConnector>) -> Self {
        Self::with_channel(DEFAULT_CHANNEL, connector)
    }

    /// Creates a supervisor addressing an explicit channel name.
    pub fn with_channel(channel: impl Into<String>, connector: Arc<dyn RemoteConnector>) -> Self {
        let channel = channel.into();
        Self::with_identity(ClientIdentity::Channel(channel.clone()), channel, connector)
    }

    fn with_identity(
        identity: ClientIdentity,
        channel: String,
        connector: Arc<dyn RemoteConnector>,
    ) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                identity,
                channel,
                connector,
                client: Mutex::new(None),
                snapshot: StdRwLock::new(ClientSnapshot::default()),
                connected: AtomicBool::new(false),
                alive: AtomicBool::new(true),
                events,
            }),
            worker: StdMutex::new(None),
        }
    }

    /// Identity of the supervised client.
    pub fn identity(&self) -> &ClientIdentity {
        &self.inner.identity
    }

    /// Channel name this supervisor polls.
    pub fn channel(&self) -> &str {
        &self.inner.channel
    }

    /// Starts (or restarts) the polling worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = worker.take() {
            previous.abort();
        }
        *worker = Some(tokio::spawn(keep_alive(Arc::clone(&self.inner))));
    }

    /// Subscribes to this supervisor's Connect/Disconnect events.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.inner.events.subscribe()
    }

    /// Returns a clone of the last successfully fetched snapshot.
    pub fn snapshot(&self) -> ClientSnapshot {
        self.inner
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the link is currently established.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Whether the supervisor has not been terminated yet.
    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::Acquire)
    }

    /// Terminates the link: best-effort quit command to the remote client,
    /// one Disconnect event, polling loop stopped.
    ///
    /// Idempotent — later calls on a terminated supervisor are no-ops.
    pub async fn quit(&self) {
        self.inner.quit().await;
    }
}

impl Inner {
    /// One unit of work: connect when disconnected, otherwise poll.
    ///
    /// Failed connect attempts are not errors — the client may simply not
    /// be up yet. Only fetch failures on an established link count against
    /// the retry budget.
    async fn work(&self) -> Result<(), RemoteError> {
        if !self.connected.load(Ordering::Acquire) {
            self.try_connect().await;
            return Ok(());
        }

        let client = self.client.lock().await;
        let client = client.as_deref().ok_or(RemoteError::NotConnected)?;
        let bulk = client.fetch_snapshot().await?;
        self.store_snapshot(bulk);
        Ok(())
    }

    async fn try_connect(&self) {
        match self.connector.connect(&self.channel).await {
            Ok((client, bulk)) => {
                *self.client.lock().await = Some(client);
                self.store_snapshot(bulk);
                self.connected.store(true, Ordering::Release);
                tracing::info!(client = %self.identity, "now connected");
                let _ = self.events.send(LinkEvent {
                    identity: self.identity.clone(),
                    kind: LinkEventKind::Connected,
                });
            }
            Err(reason) => {
                // Not ready or unreachable: retried on the next tick.
                tracing::trace!(client = %self.identity, %reason, "connect attempt failed");
            }
        }
    }

    fn store_snapshot(&self, snapshot: ClientSnapshot) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    async fn quit(&self) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }

        // The client process may already be gone; a failed quit command is
        // expected in that case.
        if let Some(client) = self.client.lock().await.take() {
            let _ = client.quit().await;
        }
        self.connected.store(false, Ordering::Release);

        tracing::info!(client = %self.identity, "disconnected");
        let _ = self.events.send(LinkEvent {
            identity: self.identity.clone(),
            kind: LinkEventKind::Disconnected,
        });
    }
}

/// The polling worker. Runs until the supervisor is terminated.
async fn keep_alive(inner: Arc<Inner>) {
    while inner.alive.load(Ordering::Acquire) {
        sleep(POLL_INTERVAL).await;

        let mut errors: u8 = 0;
        loop {
            match inner.work().await {
                Ok(()) => errors = 0,
                Err(error) => {
                    errors += 1;
                    tracing::trace!(client = %inner.identity, %error, "poll attempt failed");
                }
            }
            if errors == 0 || errors > MAX_RETRIES_PER_TICK {
                break;
            }
        }

        // Any error count surviving the in-tick retries on a connected link
        // means the link is gone for good.
        if errors != 0 && inner.connected.load(Ordering::Acquire) {
            tracing::warn!(
                client = %inner.identity,
                "client has errored more than expected, quitting"
            );
            inner.quit().await;
        }
    }
}

impl Drop for ConnectionSupervisor {
    fn drop(&mut self) {
        // Safety net for a skipped explicit quit: terminate, release the
        // handle, and still emit the Disconnect event exactly once.
        if self.inner.alive.swap(false, Ordering::AcqRel) {
            self.inner.connected.store(false, Ordering::Release);

            let inner = Arc::clone(&self.inner);
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    if let Some(client) = inner.client.lock().await.take() {
                        let _ = client.quit().await;
                    }
                });
            }

            let _ = self.inner.events.send(LinkEvent {
                identity: self.inner.identity.clone(),
                kind: LinkEventKind::Disconnected,
            });
        }

        if let Some(worker) = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            worker.abort();
        }
    }
}

impl std::fmt::Debug for ConnectionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("identity", &self.inner.identity)
            .field("channel", &self.inner.channel)
            .field("connected", &self.is_connected())
            .field("alive", &self.is_alive())
            .finish()
    }
}
