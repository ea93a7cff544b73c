//! WebSocket transport and socket event loop.
//!
//! The transport owns at most one live socket at a time. `connect` on an
//! instance that already holds a socket tears the old one down before the
//! new one exists, and `disconnect` releases the handle and acknowledges
//! with a single [`TransportEvent::Closed`]. Events from a torn-down
//! socket are fenced by an epoch counter so stale loops can never speak
//! for the current connection.
//!
//! # Event Loop
//!
//! Each successful connect spawns a tokio task that handles:
//!
//! - Incoming frames from the preview process (parsed, malformed dropped)
//! - Outgoing frames from the session controller
//! - Orderly shutdown on command or remote close
//!
//! The transport performs no automatic retry; reconnect policy belongs to
//! the caller.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, warn};

use crate::endpoint::ConnectionEndpoint;
use crate::error::{Error, Result};
use crate::protocol::{InboundFrame, OutboundFrame};

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream type.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// TransportState
// ============================================================================

/// Lifecycle state of the transport's socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No socket exists.
    Disconnected,
    /// Handshake in flight.
    Connecting,
    /// Socket established, frames may be sent.
    Open,
    /// Orderly close requested.
    Closing,
}

// ============================================================================
// TransportEvent
// ============================================================================

/// Typed event feed emitted by the transport.
///
/// The Rust rendition of the open/message/close/error callback set: one
/// `mpsc` channel of typed events, consumed by the connection binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake succeeded; emitted exactly once per socket.
    Opened,
    /// A valid inbound status envelope arrived.
    Frame(InboundFrame),
    /// The socket closed, either remotely or as a teardown acknowledgement.
    Closed,
    /// Connection or protocol failure on the socket.
    Error(String),
}

// ============================================================================
// SocketCommand
// ============================================================================

/// Internal commands for the socket loop.
enum SocketCommand {
    /// Transmit serialized frame text.
    Send(String),
    /// Close the socket and stop the loop.
    Shutdown,
}

// ============================================================================
// Transport
// ============================================================================

/// Single-socket duplex channel to a theme's preview process.
///
/// # Thread Safety
///
/// `Transport` is `Send + Sync`; all operations are non-blocking except
/// the connect handshake itself.
pub struct Transport {
    /// Current socket state.
    state: Arc<Mutex<TransportState>>,
    /// Command channel of the live socket loop, if any.
    link: Mutex<Option<mpsc::UnboundedSender<SocketCommand>>>,
    /// Live socket generation; bumped on every teardown.
    epoch: Arc<AtomicU64>,
    /// Event feed consumed by the owning binding.
    events_tx: mpsc::UnboundedSender<TransportEvent>,
}

impl Transport {
    /// Creates a transport that reports on the given event feed.
    #[must_use]
    pub fn new(events_tx: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(TransportState::Disconnected)),
            link: Mutex::new(None),
            epoch: Arc::new(AtomicU64::new(0)),
            events_tx,
        }
    }

    /// Returns the current socket state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> TransportState {
        *self.state.lock()
    }

    /// Returns `true` if frames can currently be sent.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == TransportState::Open
    }

    /// Connects to the endpoint, tearing down any prior socket first.
    ///
    /// Emits [`TransportEvent::Opened`] exactly once on success. On
    /// failure emits [`TransportEvent::Error`] and returns the error. A
    /// `disconnect` issued while the handshake is in flight wins: the
    /// socket is discarded and the attempt emits no further events.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the handshake fails.
    pub async fn connect(&self, endpoint: &ConnectionEndpoint) -> Result<()> {
        self.teardown_current();

        // The attempt epoch is registered under the state lock, so any
        // disconnect either precedes this attempt entirely or bumps the
        // epoch past it.
        let attempt = {
            let mut state = self.state.lock();
            *state = TransportState::Connecting;
            self.epoch.load(Ordering::SeqCst)
        };
        debug!(url = %endpoint.url(), "Connecting preview channel");

        let ws_stream = match connect_async(endpoint.url().as_str()).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                let err = Error::connection(e.to_string());
                let mut state = self.state.lock();
                if self.epoch.load(Ordering::SeqCst) == attempt {
                    *state = TransportState::Disconnected;
                    let _ = self.events_tx.send(TransportEvent::Error(err.to_string()));
                }
                return Err(err);
            }
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let fence = EventFence {
            epoch: attempt,
            current: Arc::clone(&self.epoch),
            state: Arc::clone(&self.state),
            events_tx: self.events_tx.clone(),
        };

        {
            // Stale check and publication are one atomic step with
            // respect to `disconnect`, which bumps the epoch under this
            // same lock: a teardown that already returned can never be
            // followed by a live socket appearing.
            let mut state = self.state.lock();
            if self.epoch.load(Ordering::SeqCst) != attempt {
                // Torn down while the handshake was in flight; the
                // fresh socket closes when the stream drops here.
                debug!("Connect superseded by teardown, dropping socket");
                return Ok(());
            }

            *self.link.lock() = Some(command_tx);
            *state = TransportState::Open;
            tokio::spawn(run_socket_loop(ws_stream, command_rx, fence));
            let _ = self.events_tx.send(TransportEvent::Opened);
        }

        debug!(url = %endpoint.url(), "Preview channel open");
        Ok(())
    }

    /// Sends a frame, returning `false` if it was dropped.
    ///
    /// A drop is a logged diagnostic, not an error: the preview link is
    /// best-effort and the session controller retains the latest value
    /// for the next activation.
    pub fn send(&self, frame: &OutboundFrame) -> bool {
        if !self.is_open() {
            warn!(state = ?self.state(), "Transport not open, frame dropped");
            return false;
        }

        let text = match frame.to_text() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to serialize outbound frame");
                return false;
            }
        };

        let delivered = self
            .link
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(SocketCommand::Send(text)).is_ok());

        if !delivered {
            warn!("Socket loop gone, frame dropped");
        }
        delivered
    }

    /// Requests an orderly close and releases the socket handle.
    ///
    /// Always safe to call, including before any connect or while a
    /// handshake is in flight. When a socket existed, exactly one
    /// [`TransportEvent::Closed`] acknowledges the teardown; no further
    /// events from that socket are delivered afterwards.
    pub fn disconnect(&self) {
        // Everything happens under the state lock, the same lock the
        // connect tail publishes under: a handshake past its epoch check
        // has already published and gets torn down here, one before the
        // check gets fenced out. No third interleaving exists.
        let mut state = self.state.lock();
        let link = self.link.lock().take();
        let was_live = link.is_some() || *state == TransportState::Connecting;

        self.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(tx) = link {
            *state = TransportState::Closing;
            let _ = tx.send(SocketCommand::Shutdown);
        }

        *state = TransportState::Disconnected;

        if was_live {
            debug!("Preview channel disconnected");
            let _ = self.events_tx.send(TransportEvent::Closed);
        }
    }

    /// Tears down any live socket without emitting a close ack.
    ///
    /// Used by `connect` so the old socket is fully released before the
    /// new one is created.
    fn teardown_current(&self) {
        let mut state = self.state.lock();
        let link = self.link.lock().take();
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(tx) = link {
            debug!("Closing existing socket before reconnect");
            let _ = tx.send(SocketCommand::Shutdown);
        }

        *state = TransportState::Disconnected;
    }
}

// ============================================================================
// EventFence
// ============================================================================

/// Guards event emission from a socket loop.
///
/// A loop only speaks while its epoch matches the transport's live
/// generation; after a teardown its events go nowhere.
struct EventFence {
    epoch: u64,
    current: Arc<AtomicU64>,
    state: Arc<Mutex<TransportState>>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
}

impl EventFence {
    fn live(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.epoch
    }

    // Liveness checks hold the state lock, the lock teardown bumps the
    // epoch under, so an emission and a teardown serialize: either the
    // event lands before the close ack or not at all.

    fn emit(&self, event: TransportEvent) {
        let _state = self.state.lock();
        if self.live() {
            let _ = self.events_tx.send(event);
        }
    }

    fn mark_disconnected(&self) {
        let mut state = self.state.lock();
        if self.live() {
            *state = TransportState::Disconnected;
        }
    }
}

// ============================================================================
// Socket Loop
// ============================================================================

/// Pumps one socket until shutdown or remote close.
async fn run_socket_loop(
    ws_stream: WsStream,
    mut command_rx: mpsc::UnboundedReceiver<SocketCommand>,
    fence: EventFence,
) {
    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            // Incoming frames from the preview process
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        match InboundFrame::parse(text.as_str()) {
                            Some(frame) => fence.emit(TransportEvent::Frame(frame)),
                            None => warn!(payload = %text, "Dropping malformed inbound frame"),
                        }
                    }

                    Some(Ok(Message::Close(_))) => {
                        debug!("Socket closed by remote");
                        fence.mark_disconnected();
                        fence.emit(TransportEvent::Closed);
                        break;
                    }

                    Some(Err(e)) => {
                        error!(error = %e, "Socket error");
                        fence.mark_disconnected();
                        fence.emit(TransportEvent::Error(e.to_string()));
                        break;
                    }

                    None => {
                        debug!("Socket stream ended");
                        fence.mark_disconnected();
                        fence.emit(TransportEvent::Closed);
                        break;
                    }

                    // Ignore Binary, Ping, Pong
                    _ => {}
                }
            }

            // Outgoing frames and shutdown from the transport
            command = command_rx.recv() => {
                match command {
                    Some(SocketCommand::Send(text)) => {
                        if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                            warn!(error = %e, "Failed to send frame");
                        }
                    }

                    // The teardown path owns the close acknowledgement
                    Some(SocketCommand::Shutdown) | None => {
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }
        }
    }

    debug!("Socket loop terminated");
}

// ============================================================================
// Tests
// ============================================================================
