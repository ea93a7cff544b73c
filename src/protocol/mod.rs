//! Preview channel message types.
//!
//! Defines the frame format exchanged over the preview channel.
//!
//! # Wire Format
//!
//! All frames are UTF-8 JSON text. Outbound frames carry either the raw
//! CSS source (as a JSON string, not wrapped in an envelope) or a control
//! message. Inbound frames are status envelopes; any other shape is
//! dropped by the transport.
//!
//! | Direction | Shape | Purpose |
//! |-----------|-------|---------|
//! | Outbound | `"body { ... }"` | CSS refresh (latest value wins) |
//! | Outbound | `{"type":"ping"}` | Control ping |
//! | Inbound | `{"status":"ok"\|"error","message":...}` | Server status |

// ============================================================================
// Submodules
// ============================================================================

/// Frame types for the preview channel.
pub mod frame;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{FrameStatus, InboundFrame, OutboundFrame};
