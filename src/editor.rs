//! Bridge between an editor widget and the preview session.
//!
//! The editor itself is an opaque injected capability: it holds text,
//! emits change events, and fires a keybinding-triggered save. The
//! bridge forwards both signals to the session with no transformation,
//! debouncing, or diffing: the editor's native change cadence is the
//! synchronization cadence.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::debug;

use crate::session::PreviewSession;

// ============================================================================
// Constants
// ============================================================================

/// Key combination the bridge binds for saves.
pub const SAVE_KEY_COMBO: &str = "mod+s";

// ============================================================================
// EditorCapability
// ============================================================================

/// Injected text-editing capability.
///
/// Callbacks receive the full buffer contents at the time of the event.
pub trait EditorCapability {
    /// Returns the current buffer contents.
    fn value(&self) -> String;

    /// Registers the content-change callback.
    fn on_change(&mut self, callback: Box<dyn Fn(String) + Send + Sync>);

    /// Binds a key combination to a command callback.
    fn bind_key_command(&mut self, combo: &str, callback: Box<dyn Fn(String) + Send + Sync>);
}

// ============================================================================
// EditorBridge
// ============================================================================

/// Forwards editor events into a [`PreviewSession`].
pub struct EditorBridge {
    session: Arc<PreviewSession>,
}

impl EditorBridge {
    /// Creates a bridge for the session.
    #[inline]
    #[must_use]
    pub fn new(session: Arc<PreviewSession>) -> Self {
        Self { session }
    }

    /// Wires the editor's change and save signals into the session.
    ///
    /// Content changes go straight to
    /// [`push_content`](PreviewSession::push_content); the save
    /// keybinding issues [`save`](PreviewSession::save) on a spawned
    /// task (save is independent of the preview state and its failures
    /// surface through the session's notifier).
    pub fn attach<E: EditorCapability>(&self, editor: &mut E) {
        let session = Arc::clone(&self.session);
        editor.on_change(Box::new(move |css| {
            session.push_content(&css);
        }));

        let session = Arc::clone(&self.session);
        editor.bind_key_command(
            SAVE_KEY_COMBO,
            Box::new(move |css| {
                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    if let Err(e) = session.save(&css).await {
                        debug!(error = %e, "Keybinding save failed");
                    }
                });
            }),
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
