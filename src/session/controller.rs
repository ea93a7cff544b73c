//! Preview session controller.
//!
//! The controller owns [`PreviewState`] and is the only place where REST
//! lifecycle calls and channel connect/disconnect are coordinated, so
//! the two never diverge: the channel is opened only after the REST
//! start call succeeds, and a channel loss while active forces the state
//! out of `Active` (never the other way around).
//!
//! Concurrency is resolved by the state machine, not by locking across
//! awaits: a transition requested from an invalid state is rejected with
//! [`Error::StateViolation`], and `stop` is the cancellation primitive,
//! safe at any point after `start` was invoked.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::endpoint::{ConnectionEndpoint, ThemeRoutes};
use crate::error::{Error, Result};
use crate::notify::{NoticeKind, Notifier};
use crate::protocol::OutboundFrame;
use crate::rest::{Method, RestClient, RestResponse};
use crate::transport::{Channel, ChannelFactory, SocketChannelFactory, TransportEvent};

use super::state::PreviewState;

// ============================================================================
// SessionInner
// ============================================================================

/// Shared state behind a [`PreviewSession`].
struct SessionInner {
    /// Resolved channel endpoint for this theme.
    endpoint: ConnectionEndpoint,
    /// REST routes for this theme.
    routes: ThemeRoutes,
    /// Injected HTTP capability.
    rest: Arc<dyn RestClient>,
    /// Injected notification sink.
    notifier: Arc<dyn Notifier>,
    /// Builds preview channels; swapped for a fake in tests.
    factory: Box<dyn ChannelFactory>,
    /// Controller-owned lifecycle state.
    state: Mutex<PreviewState>,
    /// The live channel while `Active`.
    channel: Mutex<Option<Box<dyn Channel>>>,
    /// Newest edit; delivered on the next transition into `Active`.
    latest_css: Mutex<Option<String>>,
    /// Session generation; fences event pumps of torn-down channels.
    generation: AtomicU64,
}

impl SessionInner {
    /// Handles one transport event; returns `false` to stop pumping.
    fn handle_event(&self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::Frame(frame) => {
                // Content errors surface to the user but force no
                // transition on their own.
                if frame.is_error() {
                    let text = frame.message.as_deref().unwrap_or("Preview reported an error");
                    self.notifier.notify(NoticeKind::Error, text);
                }
                true
            }

            TransportEvent::Opened => true,

            TransportEvent::Closed | TransportEvent::Error(_) => {
                self.reconcile_lost_channel();
                false
            }
        }
    }

    /// Forces the state out of `Active` after a channel loss.
    fn reconcile_lost_channel(&self) {
        {
            let mut state = self.state.lock();
            if *state != PreviewState::Active {
                return;
            }
            *state = PreviewState::Failed;
        }

        if let Some(channel) = self.channel.lock().take() {
            channel.disconnect();
        }

        warn!(theme = self.endpoint.theme(), "Preview channel lost while active");
        self.notifier
            .notify(NoticeKind::Error, "Preview connection lost");
    }
}

// ============================================================================
// PreviewSession
// ============================================================================

/// State machine governing one theme's preview lifecycle.
///
/// # Invariant
///
/// The state is `Active` if and only if the REST start call succeeded
/// and the channel is open; while `Idle` or `Failed` no channel handle
/// is held.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use theme_preview::{
///     ConnectionEndpoint, HttpClient, LogNotifier, PreviewSession, Result, ThemeRoutes,
/// };
///
/// # async fn example() -> Result<()> {
/// let endpoint = ConnectionEndpoint::new("127.0.0.1:8080", "midnight", false)?;
/// let routes = ThemeRoutes::new("127.0.0.1:8080", "midnight", false)?;
/// let session = PreviewSession::new(
///     endpoint,
///     routes,
///     Arc::new(HttpClient::new()),
///     Arc::new(LogNotifier),
/// );
///
/// session.start().await?;
/// session.push_content("body { color: red; }");
/// session.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PreviewSession {
    inner: Arc<SessionInner>,
}

impl PreviewSession {
    /// Creates a session with the production socket channel factory.
    #[must_use]
    pub fn new(
        endpoint: ConnectionEndpoint,
        routes: ThemeRoutes,
        rest: Arc<dyn RestClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_factory(endpoint, routes, rest, notifier, Box::new(SocketChannelFactory))
    }

    /// Creates a session with an injected channel factory.
    #[must_use]
    pub fn with_factory(
        endpoint: ConnectionEndpoint,
        routes: ThemeRoutes,
        rest: Arc<dyn RestClient>,
        notifier: Arc<dyn Notifier>,
        factory: Box<dyn ChannelFactory>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                endpoint,
                routes,
                rest,
                notifier,
                factory,
                state: Mutex::new(PreviewState::Idle),
                channel: Mutex::new(None),
                latest_css: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> PreviewState {
        *self.inner.state.lock()
    }

    /// Returns the theme this session previews.
    #[inline]
    #[must_use]
    pub fn theme(&self) -> &str {
        self.inner.endpoint.theme()
    }

    /// Starts the remote preview and opens the channel.
    ///
    /// The REST start call goes first; the channel is opened only on
    /// success, so a socket can never exist without a corresponding
    /// server-side session. A `stop` issued while the start is in flight
    /// wins and the start settles without side effects.
    ///
    /// # Errors
    ///
    /// - [`Error::StateViolation`] unless the state is `Idle` or `Failed`
    /// - [`Error::RestCall`] if the start call fails (state → `Failed`,
    ///   no socket is opened)
    /// - [`Error::Connection`] if the channel handshake fails (state →
    ///   `Failed`)
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if !state.can_start() {
                return Err(Error::state_violation(*state, "start"));
            }
            *state = PreviewState::Starting;
        }

        debug!(theme = self.theme(), "Starting preview session");
        let started = self
            .inner
            .rest
            .request(Method::Post, self.inner.routes.preview_url(), None)
            .await
            .and_then(RestResponse::into_result);

        if let Err(e) = started {
            *self.inner.state.lock() = PreviewState::Failed;
            warn!(theme = self.theme(), error = %e, "REST start failed");
            self.inner
                .notifier
                .notify(NoticeKind::Error, "Failed to start preview");
            return Err(e);
        }

        if self.state() != PreviewState::Starting {
            // Cancelled mid-flight by stop(); the remote session was
            // already told to shut down.
            debug!(theme = self.theme(), "Preview start cancelled mid-flight");
            return Ok(());
        }

        let (channel, events) = self.inner.factory.open(&self.inner.endpoint);
        if let Err(e) = channel.connect().await {
            channel.disconnect();
            *self.inner.state.lock() = PreviewState::Failed;
            warn!(theme = self.theme(), error = %e, "Preview channel failed to connect");
            self.inner
                .notifier
                .notify(NoticeKind::Error, "Preview connection failed");
            return Err(e);
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.inner.state.lock();
            if *state != PreviewState::Starting {
                // stop() raced the handshake; it owns the outcome.
                drop(state);
                channel.disconnect();
                debug!(theme = self.theme(), "Preview start cancelled after connect");
                return Ok(());
            }
            // The handle is stored before the state flips so `Active`
            // always implies an open channel.
            *self.inner.channel.lock() = Some(channel);
            *state = PreviewState::Active;
        }

        tokio::spawn(Self::pump_events(
            Arc::clone(&self.inner),
            events,
            generation,
        ));

        info!(theme = self.theme(), "Preview session active");
        self.inner
            .notifier
            .notify(NoticeKind::Success, "Preview started");

        // Latest-value delivery: the newest edit made while inactive
        // goes out now; earlier edits are never replayed.
        let pending = self.inner.latest_css.lock().clone();
        if let Some(css) = pending {
            self.send_css(&css);
        }

        Ok(())
    }

    /// Stops the preview, optimistically.
    ///
    /// Disconnects the channel and issues the REST stop call; neither
    /// failing keeps the session out of `Idle`. A REST failure is
    /// surfaced as a notification, not as an error; a dangling remote
    /// session is possible in that case and accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateViolation`] unless the state is `Active` or
    /// `Starting`.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if !state.can_stop() {
                return Err(Error::state_violation(*state, "stop"));
            }
            *state = PreviewState::Stopping;
        }

        debug!(theme = self.theme(), "Stopping preview session");

        // The pump of the current channel no longer owns the state.
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(channel) = self.inner.channel.lock().take() {
            channel.disconnect();
        }

        let stopped = self
            .inner
            .rest
            .request(Method::Delete, self.inner.routes.preview_url(), None)
            .await
            .and_then(RestResponse::into_result);

        match stopped {
            Ok(_) => {
                self.inner
                    .notifier
                    .notify(NoticeKind::Success, "Preview stopped");
            }
            Err(e) => {
                warn!(theme = self.theme(), error = %e, "REST stop failed, forcing idle");
                self.inner
                    .notifier
                    .notify(NoticeKind::Error, "Failed to stop remote preview");
            }
        }

        *self.inner.state.lock() = PreviewState::Idle;
        info!(theme = self.theme(), "Preview session idle");
        Ok(())
    }

    /// Pushes the latest CSS to the preview.
    ///
    /// Only delivers while `Active`; otherwise the value is retained and
    /// the newest edit goes out on the next activation. At-most-once,
    /// latest-value; no queueing, no replay.
    pub fn push_content(&self, css: &str) {
        *self.inner.latest_css.lock() = Some(css.to_owned());

        if !self.state().is_active() {
            debug!(theme = self.theme(), "Preview not active, edit retained");
            return;
        }

        self.send_css(css);
    }

    /// Sends a control ping over the channel.
    ///
    /// Returns `false` when the session is not active or the frame was
    /// dropped.
    pub fn ping(&self) -> bool {
        if !self.state().is_active() {
            return false;
        }

        self.inner
            .channel
            .lock()
            .as_ref()
            .is_some_and(|channel| channel.send(&OutboundFrame::Ping))
    }

    /// Persists the CSS source.
    ///
    /// Independent of the preview state; the channel is not required.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RestCall`] if the save call fails; the failure
    /// is also surfaced as a notification.
    pub async fn save(&self, css: &str) -> Result<()> {
        let saved = self
            .inner
            .rest
            .request(
                Method::Put,
                self.inner.routes.css_url(),
                Some(css.to_owned()),
            )
            .await
            .and_then(RestResponse::into_result);

        match saved {
            Ok(_) => {
                debug!(theme = self.theme(), "Theme saved");
                self.inner.notifier.notify(NoticeKind::Success, "Theme saved");
                Ok(())
            }
            Err(e) => {
                warn!(theme = self.theme(), error = %e, "Save failed");
                self.inner
                    .notifier
                    .notify(NoticeKind::Error, "Failed to save theme");
                Err(e)
            }
        }
    }

    /// Delivers CSS over the current channel, if any.
    fn send_css(&self, css: &str) {
        let delivered = self
            .inner
            .channel
            .lock()
            .as_ref()
            .is_some_and(|channel| channel.send(&OutboundFrame::CssRefresh(css.to_owned())));

        if !delivered {
            debug!(theme = self.theme(), "CSS frame dropped, channel not open");
        }
    }

    /// Pumps channel events into the controller.
    ///
    /// Stops when the channel loses its feed, when an event forces a
    /// reconciliation, or when a newer session generation owns the state.
    async fn pump_events(
        inner: Arc<SessionInner>,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
        generation: u64,
    ) {
        while let Some(event) = events.recv().await {
            if inner.generation.load(Ordering::SeqCst) != generation {
                break;
            }
            if !inner.handle_event(event) {
                break;
            }
        }

        debug!("Session event pump terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::time::sleep;

    use crate::protocol::{FrameStatus, InboundFrame};
    use crate::session::testing::{FakeChannelState, FakeNotifier, FakeRest, fixture};

    /// Lets spawned pump tasks observe pending events.
    async fn settle() {
        sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_start_activates_session() {
        let (session, _rest, channel, _notifier) = fixture();

        session.start().await.expect("start");

        assert_eq!(session.state(), PreviewState::Active);
        assert_eq!(channel.connect_calls(), 1);
        assert!(channel.is_connected());
    }

    #[tokio::test]
    async fn test_start_rest_failure_goes_failed_without_socket() {
        let (session, rest, channel, notifier) = fixture();
        rest.fail_start(500);

        let err = session.start().await.unwrap_err();

        assert!(err.is_rest_error());
        assert_eq!(session.state(), PreviewState::Failed);
        // No channel connection attempt was made.
        assert_eq!(channel.connect_calls(), 0);
        assert!(notifier.saw_error("Failed to start preview"));
    }

    #[tokio::test]
    async fn test_start_connect_failure_goes_failed() {
        let (session, _rest, channel, notifier) = fixture();
        channel.fail_next_connect();

        let err = session.start().await.unwrap_err();

        assert!(err.is_connection_error());
        assert_eq!(session.state(), PreviewState::Failed);
        assert!(!channel.is_connected());
        assert!(notifier.saw_error("Preview connection failed"));
    }

    #[tokio::test]
    async fn test_start_from_active_is_rejected() {
        let (session, _rest, _channel, _notifier) = fixture();

        session.start().await.expect("start");
        let err = session.start().await.unwrap_err();

        assert!(err.is_state_violation());
        assert_eq!(session.state(), PreviewState::Active);
    }

    #[tokio::test]
    async fn test_retry_after_failed_start() {
        let (session, rest, channel, _notifier) = fixture();

        rest.fail_start(502);
        assert!(session.start().await.is_err());
        assert_eq!(session.state(), PreviewState::Failed);

        rest.allow_start();
        session.start().await.expect("retry");
        assert_eq!(session.state(), PreviewState::Active);
        assert_eq!(channel.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_round_trip_content_delivery() {
        let (session, rest, channel, _notifier) = fixture();

        session.start().await.expect("start");
        session.push_content("body{color:red}");

        assert_eq!(
            channel.sent(),
            vec![OutboundFrame::CssRefresh("body{color:red}".to_string())]
        );

        session.stop().await.expect("stop");

        assert_eq!(session.state(), PreviewState::Idle);
        assert!(!channel.is_connected());
        assert!(channel.disconnect_calls() >= 1);
        assert!(rest.saw(Method::Delete, "/preview"));
    }

    #[tokio::test]
    async fn test_stop_with_failing_rest_still_idle() {
        let (session, rest, channel, notifier) = fixture();
        rest.fail_stop(500);

        session.start().await.expect("start");
        session.stop().await.expect("stop");

        // State never stalls in Stopping.
        assert_eq!(session.state(), PreviewState::Idle);
        assert!(!channel.is_connected());
        assert!(notifier.saw_error("Failed to stop remote preview"));
    }

    #[tokio::test]
    async fn test_stop_from_idle_is_rejected() {
        let (session, _rest, _channel, _notifier) = fixture();

        let err = session.stop().await.unwrap_err();

        assert!(err.is_state_violation());
        assert_eq!(session.state(), PreviewState::Idle);
    }

    #[tokio::test]
    async fn test_push_while_idle_retains_latest_for_activation() {
        let (session, _rest, channel, _notifier) = fixture();

        session.push_content("a{}");
        session.push_content("b{}");
        assert!(channel.sent().is_empty());

        session.start().await.expect("start");

        // Only the newest edit goes out; earlier ones are never replayed.
        assert_eq!(
            channel.sent(),
            vec![OutboundFrame::CssRefresh("b{}".to_string())]
        );
    }

    #[tokio::test]
    async fn test_inbound_error_frame_notifies_without_transition() {
        let (session, _rest, channel, notifier) = fixture();

        session.start().await.expect("start");
        channel.emit(TransportEvent::Frame(InboundFrame {
            status: FrameStatus::Error,
            message: Some("bad selector".to_string()),
        }));
        settle().await;

        assert!(notifier.saw_error("bad selector"));
        assert_eq!(session.state(), PreviewState::Active);
    }

    #[tokio::test]
    async fn test_inbound_ok_frame_is_silent() {
        let (session, _rest, channel, notifier) = fixture();

        session.start().await.expect("start");
        channel.emit(TransportEvent::Frame(InboundFrame {
            status: FrameStatus::Ok,
            message: None,
        }));
        settle().await;

        assert!(notifier.errors().is_empty());
        assert_eq!(session.state(), PreviewState::Active);
    }

    #[tokio::test]
    async fn test_channel_loss_while_active_forces_failed() {
        let (session, _rest, channel, notifier) = fixture();

        session.start().await.expect("start");
        channel.emit(TransportEvent::Closed);
        settle().await;

        assert_eq!(session.state(), PreviewState::Failed);
        assert!(!channel.is_connected());
        assert!(notifier.saw_error("Preview connection lost"));
    }

    #[tokio::test]
    async fn test_close_after_stop_does_not_resurrect_failed() {
        let (session, _rest, channel, _notifier) = fixture();

        session.start().await.expect("start");
        session.stop().await.expect("stop");

        // Stale close events from the torn-down channel are fenced out.
        channel.emit(TransportEvent::Closed);
        settle().await;

        assert_eq!(session.state(), PreviewState::Idle);
    }

    #[tokio::test]
    async fn test_save_is_independent_of_preview_state() {
        let (session, rest, _channel, notifier) = fixture();

        session.save("body{}").await.expect("save");

        assert_eq!(session.state(), PreviewState::Idle);
        assert!(rest.saw(Method::Put, "/css"));
        assert!(notifier.saw_success("Theme saved"));
    }

    #[tokio::test]
    async fn test_save_failure_surfaces_notification() {
        let (session, rest, _channel, notifier) = fixture();
        rest.fail_save(500);

        let err = session.save("body{}").await.unwrap_err();

        assert!(err.is_rest_error());
        assert!(notifier.saw_error("Failed to save theme"));
    }

    #[tokio::test]
    async fn test_ping_only_while_active() {
        let (session, _rest, channel, _notifier) = fixture();

        assert!(!session.ping());

        session.start().await.expect("start");
        assert!(session.ping());
        assert_eq!(channel.sent(), vec![OutboundFrame::Ping]);
    }

    #[tokio::test]
    async fn test_sequences_always_settle_in_defined_states() {
        let (session, rest, _channel, _notifier) = fixture();

        let _ = session.start().await;
        let _ = session.start().await;
        let _ = session.stop().await;
        let _ = session.stop().await;
        rest.fail_start(500);
        let _ = session.start().await;
        rest.allow_start();
        let _ = session.start().await;
        let _ = session.stop().await;

        assert_eq!(session.state(), PreviewState::Idle);
    }

    // Keeps the fixture types exercised even if individual tests change.
    #[test]
    fn test_fixture_types() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FakeRest>();
        assert_send_sync::<FakeChannelState>();
        assert_send_sync::<FakeNotifier>();
    }
}
