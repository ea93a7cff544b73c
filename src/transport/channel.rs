//! Channel capability consumed by the session controller.
//!
//! The controller never touches sockets directly; it speaks to a
//! [`Channel`] built by a [`ChannelFactory`]. The production factory
//! hands out socket-backed [`ChannelBinding`]s, tests inject fakes.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::endpoint::ConnectionEndpoint;
use crate::error::Result;
use crate::protocol::OutboundFrame;

use super::binding::ChannelBinding;
use super::socket::TransportEvent;

// ============================================================================
// Channel
// ============================================================================

/// Operations the session controller issues against a preview channel.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Connects the channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`](crate::Error::Connection) if the
    /// handshake fails.
    async fn connect(&self) -> Result<()>;

    /// Sends a frame; returns `false` if it was dropped.
    fn send(&self, frame: &OutboundFrame) -> bool;

    /// Tears the channel down. Always safe to call.
    fn disconnect(&self);

    /// Returns `true` while the channel is open.
    fn is_connected(&self) -> bool;

    /// Returns `true` while a handshake is in flight.
    fn is_connecting(&self) -> bool;
}

#[async_trait]
impl Channel for ChannelBinding {
    async fn connect(&self) -> Result<()> {
        ChannelBinding::connect(self).await
    }

    fn send(&self, frame: &OutboundFrame) -> bool {
        ChannelBinding::send(self, frame)
    }

    fn disconnect(&self) {
        ChannelBinding::disconnect(self);
    }

    fn is_connected(&self) -> bool {
        ChannelBinding::is_connected(self)
    }

    fn is_connecting(&self) -> bool {
        ChannelBinding::is_connecting(self)
    }
}

// ============================================================================
// ChannelFactory
// ============================================================================

/// Builds a channel bound to one endpoint.
///
/// Returns the channel together with its event feed.
pub trait ChannelFactory: Send + Sync {
    /// Builds an unconnected channel for the endpoint.
    fn open(
        &self,
        endpoint: &ConnectionEndpoint,
    ) -> (Box<dyn Channel>, mpsc::UnboundedReceiver<TransportEvent>);
}

// ============================================================================
// SocketChannelFactory
// ============================================================================

/// Production factory: socket-backed bindings, explicit connect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketChannelFactory;

impl ChannelFactory for SocketChannelFactory {
    fn open(
        &self,
        endpoint: &ConnectionEndpoint,
    ) -> (Box<dyn Channel>, mpsc::UnboundedReceiver<TransportEvent>) {
        let (binding, events) = ChannelBinding::new(endpoint.clone());
        (Box::new(binding), events)
    }
}

// ============================================================================
// Tests
// ============================================================================
