//! Preview session lifecycle.
//!
//! The session controller is the only component that coordinates the
//! REST lifecycle calls with the preview channel, and the only writer of
//! [`PreviewState`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `state` | Lifecycle state machine states |
//! | `controller` | The [`PreviewSession`] controller |

// ============================================================================
// Submodules
// ============================================================================

/// Preview lifecycle states.
pub mod state;

/// Preview session controller.
pub mod controller;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use controller::PreviewSession;
pub use state::PreviewState;
