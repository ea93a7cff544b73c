//! Preview lifecycle states.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// PreviewState
// ============================================================================

/// Lifecycle state of a preview session.
///
/// Owned exclusively by the session controller; no other component
/// writes it.
///
/// | State | Entry action | Valid transitions |
/// |-------|--------------|-------------------|
/// | `Idle` | — | → `Starting` |
/// | `Starting` | REST start call | → `Active`, → `Failed` |
/// | `Active` | connect channel | → `Stopping`, → `Failed` |
/// | `Stopping` | REST stop call, disconnect | → `Idle` (always) |
/// | `Failed` | disconnect, surface error | → `Starting` (retry) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    /// No preview session exists.
    Idle,
    /// REST start call in flight.
    Starting,
    /// Remote session running and channel open.
    Active,
    /// Optimistic teardown in progress; always lands in `Idle`.
    Stopping,
    /// Start failed or the channel was lost; retry with `start`.
    Failed,
}

impl PreviewState {
    /// Returns `true` if `start` is valid from this state.
    #[inline]
    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Failed)
    }

    /// Returns `true` if `stop` is valid from this state.
    ///
    /// `Starting` is included so `stop` works as the mid-flight
    /// cancellation primitive.
    #[inline]
    #[must_use]
    pub fn can_stop(&self) -> bool {
        matches!(self, Self::Active | Self::Starting)
    }

    /// Returns `true` if content frames are deliverable.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for PreviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Stopping => "stopping",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_start() {
        assert!(PreviewState::Idle.can_start());
        assert!(PreviewState::Failed.can_start());
        assert!(!PreviewState::Starting.can_start());
        assert!(!PreviewState::Active.can_start());
        assert!(!PreviewState::Stopping.can_start());
    }

    #[test]
    fn test_can_stop() {
        assert!(PreviewState::Active.can_stop());
        assert!(PreviewState::Starting.can_stop());
        assert!(!PreviewState::Idle.can_stop());
        assert!(!PreviewState::Stopping.can_stop());
        assert!(!PreviewState::Failed.can_stop());
    }

    #[test]
    fn test_display() {
        assert_eq!(PreviewState::Idle.to_string(), "idle");
        assert_eq!(PreviewState::Active.to_string(), "active");
        assert_eq!(PreviewState::Failed.to_string(), "failed");
    }
}
