//! User notification capability.
//!
//! All REST and transport failures surface as non-blocking notifications;
//! nothing in the session controller waits on the user seeing one. The
//! host application injects its own [`Notifier`] (toast, status bar, ...);
//! [`LogNotifier`] is the tracing-backed default.

// ============================================================================
// Imports
// ============================================================================

use tracing::{error, info};

// ============================================================================
// NoticeKind
// ============================================================================

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Neutral status update.
    Info,
    /// An operation completed.
    Success,
    /// An operation failed; the session may still be usable.
    Error,
}

// ============================================================================
// Notifier
// ============================================================================

/// Injected notification sink.
pub trait Notifier: Send + Sync {
    /// Surfaces a notice to the user. Must not block.
    fn notify(&self, kind: NoticeKind, text: &str);
}

// ============================================================================
// LogNotifier
// ============================================================================

/// Default notifier that routes notices into the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NoticeKind, text: &str) {
        match kind {
            NoticeKind::Info | NoticeKind::Success => info!(kind = ?kind, "{text}"),
            NoticeKind::Error => error!("{text}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
