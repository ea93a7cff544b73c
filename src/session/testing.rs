//! Scripted fakes for session, theme, and editor tests.
//!
//! The controller is exercised against an injected channel factory and
//! REST client, per the capability seams in `transport::channel` and
//! `rest`.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::endpoint::{ConnectionEndpoint, ThemeRoutes};
use crate::error::{Error, Result};
use crate::notify::{NoticeKind, Notifier};
use crate::protocol::OutboundFrame;
use crate::rest::{Method, RestClient, RestResponse};
use crate::transport::{Channel, ChannelFactory, TransportEvent};

use super::controller::PreviewSession;

// ============================================================================
// FakeRest
// ============================================================================

/// REST client with per-route scripted statuses.
pub(crate) struct FakeRest {
    start_status: AtomicU16,
    stop_status: AtomicU16,
    save_status: AtomicU16,
    get_status: AtomicU16,
    get_body: Mutex<String>,
    calls: Mutex<Vec<(Method, String)>>,
}

impl FakeRest {
    pub(crate) fn new() -> Self {
        Self {
            start_status: AtomicU16::new(200),
            stop_status: AtomicU16::new(200),
            save_status: AtomicU16::new(200),
            get_status: AtomicU16::new(200),
            get_body: Mutex::new("{}".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fail_start(&self, status: u16) {
        self.start_status.store(status, Ordering::SeqCst);
    }

    pub(crate) fn allow_start(&self) {
        self.start_status.store(200, Ordering::SeqCst);
    }

    pub(crate) fn fail_stop(&self, status: u16) {
        self.stop_status.store(status, Ordering::SeqCst);
    }

    pub(crate) fn fail_save(&self, status: u16) {
        self.save_status.store(status, Ordering::SeqCst);
    }

    pub(crate) fn fail_get(&self, status: u16) {
        self.get_status.store(status, Ordering::SeqCst);
    }

    /// Scripts the body returned to GET requests.
    pub(crate) fn set_get_body(&self, body: &str) {
        *self.get_body.lock() = body.to_string();
    }

    /// Returns `true` if a call with this method hit a URL ending in
    /// `suffix`.
    pub(crate) fn saw(&self, method: Method, suffix: &str) -> bool {
        self.calls
            .lock()
            .iter()
            .any(|(m, url)| *m == method && url.ends_with(suffix))
    }
}

#[async_trait]
impl RestClient for FakeRest {
    async fn request(
        &self,
        method: Method,
        url: &str,
        _body: Option<String>,
    ) -> Result<RestResponse> {
        self.calls.lock().push((method, url.to_string()));

        let status = match method {
            Method::Post => self.start_status.load(Ordering::SeqCst),
            Method::Delete => self.stop_status.load(Ordering::SeqCst),
            Method::Put => self.save_status.load(Ordering::SeqCst),
            Method::Get => self.get_status.load(Ordering::SeqCst),
        };

        let body = match method {
            Method::Get => self.get_body.lock().clone(),
            _ => "{}".to_string(),
        };

        Ok(RestResponse { status, body })
    }
}

// ============================================================================
// FakeChannel
// ============================================================================

/// Observable state shared between a test and its fake channels.
pub(crate) struct FakeChannelState {
    connected: AtomicBool,
    fail_next_connect: AtomicBool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    sent: Mutex<Vec<OutboundFrame>>,
    events_tx: Mutex<Option<mpsc::UnboundedSender<TransportEvent>>>,
}

impl FakeChannelState {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(false),
            fail_next_connect: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            events_tx: Mutex::new(None),
        })
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next_connect(&self) {
        self.fail_next_connect.store(true, Ordering::SeqCst);
    }

    pub(crate) fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn sent(&self) -> Vec<OutboundFrame> {
        self.sent.lock().clone()
    }

    /// Injects a transport event, as if the socket produced it.
    pub(crate) fn emit(&self, event: TransportEvent) {
        if let Some(tx) = self.events_tx.lock().as_ref() {
            let _ = tx.send(event);
        }
    }
}

/// Channel whose behavior is scripted through [`FakeChannelState`].
struct FakeChannel {
    state: Arc<FakeChannelState>,
}

#[async_trait]
impl Channel for FakeChannel {
    async fn connect(&self) -> Result<()> {
        self.state.connect_calls.fetch_add(1, Ordering::SeqCst);

        if self.state.fail_next_connect.swap(false, Ordering::SeqCst) {
            return Err(Error::connection("connection refused"));
        }

        self.state.connected.store(true, Ordering::SeqCst);
        self.state.emit(TransportEvent::Opened);
        Ok(())
    }

    fn send(&self, frame: &OutboundFrame) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.state.sent.lock().push(frame.clone());
        true
    }

    fn disconnect(&self) {
        self.state.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.connected.swap(false, Ordering::SeqCst) {
            self.state.emit(TransportEvent::Closed);
        }
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    fn is_connecting(&self) -> bool {
        false
    }
}

// ============================================================================
// FakeFactory
// ============================================================================

/// Factory handing out channels backed by one shared fake state.
pub(crate) struct FakeFactory {
    state: Arc<FakeChannelState>,
}

impl FakeFactory {
    pub(crate) fn new(state: Arc<FakeChannelState>) -> Self {
        Self { state }
    }
}

impl ChannelFactory for FakeFactory {
    fn open(
        &self,
        _endpoint: &ConnectionEndpoint,
    ) -> (Box<dyn Channel>, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.state.events_tx.lock() = Some(tx);

        let channel = FakeChannel {
            state: Arc::clone(&self.state),
        };
        (Box::new(channel), rx)
    }
}

// ============================================================================
// FakeNotifier
// ============================================================================

/// Notifier that records every notice.
pub(crate) struct FakeNotifier {
    notices: Mutex<Vec<(NoticeKind, String)>>,
}

impl FakeNotifier {
    pub(crate) fn new() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter(|(kind, _)| *kind == NoticeKind::Error)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub(crate) fn saw_error(&self, text: &str) -> bool {
        self.errors().iter().any(|t| t == text)
    }

    pub(crate) fn saw_success(&self, text: &str) -> bool {
        self.notices
            .lock()
            .iter()
            .any(|(kind, t)| *kind == NoticeKind::Success && t == text)
    }
}

impl Notifier for FakeNotifier {
    fn notify(&self, kind: NoticeKind, text: &str) {
        self.notices.lock().push((kind, text.to_string()));
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// Builds a session wired to fakes for the `midnight` theme.
pub(crate) fn fixture() -> (
    PreviewSession,
    Arc<FakeRest>,
    Arc<FakeChannelState>,
    Arc<FakeNotifier>,
) {
    let endpoint = ConnectionEndpoint::new("127.0.0.1:8080", "midnight", false).expect("endpoint");
    let routes = ThemeRoutes::new("127.0.0.1:8080", "midnight", false).expect("routes");

    let rest = Arc::new(FakeRest::new());
    let channel = FakeChannelState::new();
    let notifier = Arc::new(FakeNotifier::new());

    let session = PreviewSession::with_factory(
        endpoint,
        routes,
        Arc::clone(&rest) as Arc<dyn RestClient>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Box::new(FakeFactory::new(Arc::clone(&channel))),
    );

    (session, rest, channel, notifier)
}
