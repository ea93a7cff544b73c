//! Error types for the live preview client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use theme_preview::{Result, PreviewSession};
//!
//! async fn example(session: &PreviewSession) -> Result<()> {
//!     session.start().await?;
//!     session.save("body { color: red; }").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`] |
//! | Protocol | [`Error::Protocol`] |
//! | REST | [`Error::RestCall`] |
//! | Lifecycle | [`Error::StateViolation`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::session::PreviewState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when an endpoint or route cannot be resolved.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when the preview channel cannot be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected frame.
    ///
    /// Malformed inbound frames are absorbed inside the transport; this
    /// variant only surfaces for serialization failures on the send path.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // REST Errors
    // ========================================================================
    /// A theme lifecycle REST call failed.
    ///
    /// Covers both non-2xx statuses and network-level failures
    /// (status 0 means the request never produced a response).
    #[error("REST call failed ({status}): {message}")]
    RestCall {
        /// HTTP status code, 0 for network failures.
        status: u16,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// A session transition was requested from a state that does not
    /// permit it.
    ///
    /// Rejected rather than silently ignored so programming errors
    /// upstream are detectable in tests.
    #[error("Invalid transition: {requested} from {from}")]
    StateViolation {
        /// State the session was in when the request arrived.
        from: PreviewState,
        /// The requested operation.
        requested: &'static str,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a REST call error.
    #[inline]
    pub fn rest_call(status: u16, message: impl Into<String>) -> Self {
        Self::RestCall {
            status,
            message: message.into(),
        }
    }

    /// Creates a state violation error.
    #[inline]
    pub fn state_violation(from: PreviewState, requested: &'static str) -> Self {
        Self::StateViolation { from, requested }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Returns `true` if this is a REST call error.
    #[inline]
    #[must_use]
    pub fn is_rest_error(&self) -> bool {
        matches!(self, Self::RestCall { .. })
    }

    /// Returns `true` if this is a state violation.
    #[inline]
    #[must_use]
    pub fn is_state_violation(&self) -> bool {
        matches!(self, Self::StateViolation { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
