//! Per-view binding of one endpoint to one transport.
//!
//! The binding is the crate's rendition of the original connection hook:
//! it guarantees a re-rendering view can never end up with two sockets,
//! derives `connected`/`connecting` strictly from the transport's event
//! feed, and disconnects unconditionally when dropped so no socket
//! outlives its owning view.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::endpoint::ConnectionEndpoint;
use crate::error::Result;
use crate::protocol::OutboundFrame;

use super::socket::{Transport, TransportEvent, TransportState};

// ============================================================================
// ChannelBinding
// ============================================================================

/// Binds a preview endpoint to at most one [`Transport`].
///
/// Construction returns the binding together with the forwarded event
/// feed; the feed observes every transport event after the status flags
/// have been derived from it.
pub struct ChannelBinding {
    /// Endpoint all transports built by this binding connect to.
    endpoint: ConnectionEndpoint,
    /// The current transport, if one has been built.
    transport: Mutex<Option<Arc<Transport>>>,
    /// Raw feed handed to each transport this binding builds.
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    /// Derived from `Opened`/`Closed`/`Error` events, never polled.
    connected: Arc<AtomicBool>,
    /// Set while a handshake is in flight.
    connecting: Arc<AtomicBool>,
}

impl ChannelBinding {
    /// Creates a binding for the endpoint.
    ///
    /// Returns the binding and its event feed. No socket exists until
    /// [`connect`](Self::connect) is called.
    #[must_use]
    pub fn new(
        endpoint: ConnectionEndpoint,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel::<TransportEvent>();

        let connected = Arc::new(AtomicBool::new(false));
        let connecting = Arc::new(AtomicBool::new(false));

        // Derive status flags from the event feed, then pass it on.
        let connected_flag = Arc::clone(&connected);
        let connecting_flag = Arc::clone(&connecting);
        tokio::spawn(async move {
            while let Some(event) = raw_rx.recv().await {
                match &event {
                    TransportEvent::Opened => {
                        connected_flag.store(true, Ordering::SeqCst);
                        connecting_flag.store(false, Ordering::SeqCst);
                    }
                    TransportEvent::Closed | TransportEvent::Error(_) => {
                        connected_flag.store(false, Ordering::SeqCst);
                        connecting_flag.store(false, Ordering::SeqCst);
                    }
                    TransportEvent::Frame(_) => {}
                }

                if out_tx.send(event).is_err() {
                    break;
                }
            }
        });

        let binding = Self {
            endpoint,
            transport: Mutex::new(None),
            events_tx: raw_tx,
            connected,
            connecting,
        };
        (binding, out_rx)
    }

    /// Creates a binding and optionally connects it immediately.
    ///
    /// With `auto_connect` the socket is opened before this returns; a
    /// failed auto-connect is reported on the event feed, matching the
    /// hook it models. Preview channels pass `false` and connect only
    /// after the remote process has been started.
    pub async fn open(
        endpoint: ConnectionEndpoint,
        auto_connect: bool,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (binding, events) = Self::new(endpoint);
        if auto_connect
            && let Err(e) = binding.connect().await
        {
            warn!(error = %e, "Auto-connect failed");
        }
        (binding, events)
    }

    /// Returns `true` while the transport is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns `true` while a handshake is in flight.
    #[inline]
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    /// Connects the channel, building a fresh transport if needed.
    ///
    /// A no-op when a transport already exists and is connecting or open,
    /// so repeated calls from a re-rendering view cannot produce
    /// duplicate sockets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`](crate::Error::Connection) if the
    /// handshake fails.
    pub async fn connect(&self) -> Result<()> {
        {
            let guard = self.transport.lock();
            if let Some(transport) = guard.as_ref()
                && matches!(
                    transport.state(),
                    TransportState::Connecting | TransportState::Open
                )
            {
                debug!("Channel already live, connect ignored");
                return Ok(());
            }
        }

        self.connecting.store(true, Ordering::SeqCst);

        // A torn-down transport is never reused; build a fresh one.
        let transport = Arc::new(Transport::new(self.events_tx.clone()));
        *self.transport.lock() = Some(Arc::clone(&transport));

        let result = transport.connect(&self.endpoint).await;
        if result.is_err() {
            self.connecting.store(false, Ordering::SeqCst);
            *self.transport.lock() = None;
        }
        result
    }

    /// Sends a frame over the current transport.
    ///
    /// Returns `false` if the frame was dropped because no open transport
    /// exists.
    pub fn send(&self, frame: &OutboundFrame) -> bool {
        match self.transport.lock().as_ref() {
            Some(transport) => transport.send(frame),
            None => {
                warn!("Preview channel not built, frame dropped");
                false
            }
        }
    }

    /// Tears down and discards the transport.
    ///
    /// The next [`connect`](Self::connect) is guaranteed to build a fresh
    /// instance. Safe to call at any time, including mid-handshake.
    pub fn disconnect(&self) {
        if let Some(transport) = self.transport.lock().take() {
            transport.disconnect();
        }
        self.connected.store(false, Ordering::SeqCst);
        self.connecting.store(false, Ordering::SeqCst);
    }
}

impl Drop for ChannelBinding {
    fn drop(&mut self) {
        // The owning view is gone; no socket may outlive it.
        self.disconnect();
    }
}

// ============================================================================
// Tests
// ============================================================================
