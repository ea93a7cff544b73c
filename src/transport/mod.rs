//! Preview channel transport layer.
//!
//! This module owns the duplex socket to a theme's preview process.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  Editor (Rust)   │                              │  Preview        │
//! │                  │         WebSocket            │  Process        │
//! │  ChannelBinding  │◄────────────────────────────►│                 │
//! │  → Transport     │   /themes/{name}/preview/ws  │  WebSocket      │
//! │                  │                              │  Server         │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. The session controller starts the remote preview over REST
//! 2. `ChannelBinding::connect` builds one `Transport` and connects it
//! 3. `Transport` streams CSS refresh frames, receives status envelopes
//! 4. `ChannelBinding::disconnect` (or drop) tears the socket down
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `socket` | Single-socket transport and event loop |
//! | `binding` | Per-view binding with derived status flags |
//! | `channel` | Channel capability consumed by the controller |

// ============================================================================
// Submodules
// ============================================================================

/// Single-socket transport and event loop.
pub mod socket;

/// Per-view binding of one endpoint to one transport.
pub mod binding;

/// Channel capability and factories.
pub mod channel;

// ============================================================================
// Re-exports
// ============================================================================

pub use binding::ChannelBinding;
pub use channel::{Channel, ChannelFactory, SocketChannelFactory};
pub use socket::{Transport, TransportEvent, TransportState};
