//! Outbound and inbound frame types.
//!
//! Frames are fire-and-forget: there is no acknowledgement or sequencing
//! in the protocol, so delivery is at-most-once with latest-value
//! semantics on reconnect.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// OutboundFrame
// ============================================================================

/// A frame sent from the editor side to the preview process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Full CSS source for the preview to apply.
    ///
    /// The raw text is the payload; the server consumes it as a JSON
    /// string without any further envelope.
    CssRefresh(String),

    /// Control ping, serialized as `{"type":"ping"}`.
    Ping,
}

/// Serialized shape of control messages.
#[derive(Debug, Serialize)]
struct ControlMessage<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

impl OutboundFrame {
    /// Serializes the frame to its wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`](crate::Error::Protocol) if
    /// serialization fails.
    pub fn to_text(&self) -> Result<String> {
        let text = match self {
            Self::CssRefresh(css) => serde_json::to_string(css),
            Self::Ping => serde_json::to_string(&ControlMessage { kind: "ping" }),
        };
        text.map_err(|e| Error::protocol(e.to_string()))
    }

    /// Returns `true` if this is a content refresh frame.
    #[inline]
    #[must_use]
    pub fn is_refresh(&self) -> bool {
        matches!(self, Self::CssRefresh(_))
    }
}

// ============================================================================
// InboundFrame
// ============================================================================

/// A status envelope received from the preview process.
///
/// # Format
///
/// ```json
/// { "status": "ok" | "error", "message": "optional detail" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundFrame {
    /// Status discriminator.
    pub status: FrameStatus,

    /// Optional human-readable detail.
    #[serde(default)]
    pub message: Option<String>,
}

impl InboundFrame {
    /// Parses an inbound payload, returning `None` for anything that is
    /// not a valid status envelope.
    ///
    /// Malformed payloads are dropped by the caller, never forwarded
    /// upward as if valid.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// Returns `true` if this is an error envelope.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == FrameStatus::Error
    }
}

// ============================================================================
// FrameStatus
// ============================================================================

/// Inbound status discriminator.
///
/// The server historically emitted `"success"` for some replies; it is
/// accepted as an alias of `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStatus {
    /// The preview applied the last frame.
    #[serde(alias = "success")]
    Ok,
    /// The preview rejected the last frame or hit an internal error.
    Error,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_refresh_is_raw_payload() {
        let frame = OutboundFrame::CssRefresh("body{color:red}".to_string());
        assert_eq!(frame.to_text().unwrap(), r#""body{color:red}""#);
        assert!(frame.is_refresh());
    }

    #[test]
    fn test_ping_wire_shape() {
        let frame = OutboundFrame::Ping;
        assert_eq!(frame.to_text().unwrap(), r#"{"type":"ping"}"#);
        assert!(!frame.is_refresh());
    }

    #[test]
    fn test_parse_ok_envelope() {
        let frame = InboundFrame::parse(r#"{"status":"ok"}"#).unwrap();
        assert_eq!(frame.status, FrameStatus::Ok);
        assert_eq!(frame.message, None);
        assert!(!frame.is_error());
    }

    #[test]
    fn test_parse_error_envelope() {
        let frame = InboundFrame::parse(r#"{"status":"error","message":"bad selector"}"#).unwrap();
        assert!(frame.is_error());
        assert_eq!(frame.message.as_deref(), Some("bad selector"));
    }

    #[test]
    fn test_parse_success_alias() {
        let frame = InboundFrame::parse(r#"{"status":"success","message":"applied"}"#).unwrap();
        assert_eq!(frame.status, FrameStatus::Ok);
    }

    #[test]
    fn test_parse_drops_malformed() {
        assert!(InboundFrame::parse("not json").is_none());
        assert!(InboundFrame::parse(r#"{"type":"pong"}"#).is_none());
        assert!(InboundFrame::parse(r#"{"status":"sideways"}"#).is_none());
        assert!(InboundFrame::parse("42").is_none());
    }
}
