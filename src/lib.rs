//! Live CSS theme preview synchronization client.
//!
//! This library keeps a remote theme preview session consistent with a
//! locally edited CSS buffer, despite network interruption, user
//! cancellation, and dropped messages.
//!
//! # Architecture
//!
//! Data flows one way in (editor changes, lifecycle commands) and one
//! way out (CSS frames, REST calls); the channel only carries status
//! signals back:
//!
//! - [`Transport`] owns exactly one WebSocket at a time and translates
//!   raw frames to and from typed messages
//! - [`ChannelBinding`] ties one transport to an owning view with
//!   derived status flags and cleanup-on-drop
//! - [`PreviewSession`] is the state machine coordinating the REST
//!   lifecycle calls with the channel so the two never diverge
//! - [`EditorBridge`] forwards editor change and save signals into the
//!   session at the editor's own cadence
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use theme_preview::{
//!     ConnectionEndpoint, HttpClient, LogNotifier, PreviewSession, Result, ThemeRoutes,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let endpoint = ConnectionEndpoint::new("127.0.0.1:8080", "midnight", false)?;
//!     let routes = ThemeRoutes::new("127.0.0.1:8080", "midnight", false)?;
//!
//!     let session = PreviewSession::new(
//!         endpoint,
//!         routes,
//!         Arc::new(HttpClient::new()),
//!         Arc::new(LogNotifier),
//!     );
//!
//!     // Start the remote preview, stream an edit, stop.
//!     session.start().await?;
//!     session.push_content("body { color: red; }");
//!     session.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`editor`] | Bridge from an injected editor widget to the session |
//! | [`endpoint`] | Endpoint and REST route resolution |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`notify`] | User notification capability |
//! | [`protocol`] | Channel frame types |
//! | [`rest`] | REST client capability |
//! | [`session`] | Preview session state machine |
//! | [`theme`] | Theme metadata and CSS access |
//! | [`transport`] | Single-socket channel transport |
//!
//! # Delivery Semantics
//!
//! The protocol has no acknowledgement or sequencing: CSS frames are
//! at-most-once with latest-value semantics. An edit made while the
//! channel is down is retained and delivered on the next activation;
//! earlier edits are never replayed.

// ============================================================================
// Modules
// ============================================================================

/// Bridge between an editor widget and the preview session.
pub mod editor;

/// Endpoint resolution for preview channels and REST routes.
pub mod endpoint;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// User notification capability.
pub mod notify;

/// Preview channel message types.
pub mod protocol;

/// REST client capability.
pub mod rest;

/// Preview session lifecycle.
pub mod session;

/// Theme metadata and CSS source access.
pub mod theme;

/// Preview channel transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Editor types
pub use editor::{EditorBridge, EditorCapability, SAVE_KEY_COMBO};

// Endpoint types
pub use endpoint::{ConnectionEndpoint, ThemeRoutes};

// Error types
pub use error::{Error, Result};

// Notification types
pub use notify::{LogNotifier, NoticeKind, Notifier};

// Protocol types
pub use protocol::{FrameStatus, InboundFrame, OutboundFrame};

// REST types
pub use rest::{HttpClient, Method, RestClient, RestResponse};

// Session types
pub use session::{PreviewSession, PreviewState};

// Theme types
pub use theme::{Theme, ThemeConfig};

// Transport types
pub use transport::{Channel, ChannelBinding, ChannelFactory, Transport, TransportEvent, TransportState};
