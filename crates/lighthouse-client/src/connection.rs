//! One logical session to one display destination.
//!
//! A `Connection` is created by the [`DisplayRegistry`](crate::DisplayRegistry)
//! and immediately starts connecting in a background task. The same task then
//! becomes the delivery context: it reads inbound messages, routes frame acks
//! and API errors to the log, and hands input-stream payloads to the hub.
//!
//! # State machine
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Closed
//! ```
//!
//! Connecting begins at construction. Reaching Connected stores the write
//! half, sends a deferred input subscription if one was requested, and starts
//! the keep-alive scheduler. A transport close or error, or an explicit
//! [`Connection::close`], moves to Closed; there is no way back. Reconnecting
//! means acquiring the destination again from the registry.
//!
//! # Error policy
//!
//! Validation failures (closed connection, unset credentials, wrong frame
//! length) surface synchronously as [`ClientError`] before any transport
//! interaction. Everything past that boundary is fire-and-forget: write and
//! connect failures are logged and observable only via [`Connection::is_connected`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use lighthouse_core::{
    decode_response, encode_request, Request, Response, FRAME_LEN, INPUT_STREAM_REQUEST_ID,
};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{
    connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::error::ClientError;
use crate::hub::{InputHub, InputListener};
use crate::keepalive;
use crate::registry::DisplayRegistry;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Per-connection transport settings, fixed at acquisition time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectOptions {
    /// Accept self-signed TLS certificates. The connection stays encrypted;
    /// only the validity check is skipped.
    pub allow_self_signed: bool,
    /// Diagnostic verbosity: 0 quiet, 1 lifecycle messages, 2 adds
    /// per-message traffic notes.
    pub debug: u8,
}

#[derive(Default)]
struct Credentials {
    username: Option<String>,
    token: Option<String>,
}

impl Credentials {
    /// Both credentials, or the error naming the first missing one.
    fn require(&self) -> Result<(String, String), ClientError> {
        let username = self
            .username
            .clone()
            .ok_or(ClientError::MissingCredential { field: "username" })?;
        let token = self
            .token
            .clone()
            .ok_or(ClientError::MissingCredential { field: "token" })?;
        Ok((username, token))
    }
}

/// A persistent session to one display destination.
///
/// All methods take `&self`; the connection is designed to live inside an
/// `Arc` shared between the caller, the registry, and its background tasks.
pub struct Connection {
    destination: String,
    options: ConnectOptions,
    registry: Weak<DisplayRegistry>,
    credentials: Mutex<Credentials>,
    closed: AtomicBool,
    connected: AtomicBool,
    /// `enable_key_inputs` was called; subscribe on (or after) connect.
    stream_requested: AtomicBool,
    /// The subscription request actually went out; guards idempotency.
    stream_sent: AtomicBool,
    /// Set by `send_frame`, cleared by every keep-alive tick.
    sent_since_tick: AtomicBool,
    last_frame: Mutex<Option<Vec<u8>>>,
    /// Single writer: caller sends and keep-alive resends serialize here.
    writer: AsyncMutex<Option<WsSink>>,
    hub: InputHub,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Connection {
    pub(crate) fn new(
        destination: String,
        options: ConnectOptions,
        registry: Weak<DisplayRegistry>,
    ) -> Arc<Self> {
        Arc::new(Self {
            destination,
            options,
            registry,
            credentials: Mutex::new(Credentials::default()),
            closed: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            stream_requested: AtomicBool::new(false),
            stream_sent: AtomicBool::new(false),
            sent_since_tick: AtomicBool::new(false),
            last_frame: Mutex::new(None),
            writer: AsyncMutex::new(None),
            hub: InputHub::default(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Creates the connection and starts its asynchronous connect task.
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn(
        destination: String,
        options: ConnectOptions,
        registry: Weak<DisplayRegistry>,
    ) -> Arc<Self> {
        let connection = Self::new(destination, options, registry);
        let task = tokio::spawn(Arc::clone(&connection).run());
        connection.tasks.lock().unwrap().push(task);
        connection
    }

    /// The destination URL this connection was acquired for.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    // ── Credentials ──────────────────────────────────────────────────────────

    /// Sets the username. May be changed at any time, including while
    /// connected; the next send or subscribe uses the latest value.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyCredential`] for an empty string.
    pub fn set_username(&self, username: &str) -> Result<(), ClientError> {
        if username.is_empty() {
            return Err(ClientError::EmptyCredential { field: "username" });
        }
        self.credentials.lock().unwrap().username = Some(username.to_owned());
        Ok(())
    }

    /// Sets the API token. Same replacement semantics as [`Connection::set_username`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyCredential`] for an empty string.
    pub fn set_token(&self, token: &str) -> Result<(), ClientError> {
        if token.is_empty() {
            return Err(ClientError::EmptyCredential { field: "token" });
        }
        self.credentials.lock().unwrap().token = Some(token.to_owned());
        Ok(())
    }

    /// The configured username, if any.
    pub fn username(&self) -> Option<String> {
        self.credentials.lock().unwrap().username.clone()
    }

    /// The configured token, if any.
    pub fn token(&self) -> Option<String> {
        self.credentials.lock().unwrap().token.clone()
    }

    // ── Public operations ────────────────────────────────────────────────────

    /// Requests the hardware input stream for the configured user.
    ///
    /// Idempotent. If the connection is still being established, the
    /// subscription is sent automatically once the connected state is
    /// reached; otherwise it goes out immediately. Transport failures while
    /// subscribing are logged, not raised.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectionClosed`] after [`Connection::close`],
    /// or [`ClientError::MissingCredential`] if username or token is unset.
    pub async fn enable_key_inputs(&self) -> Result<(), ClientError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::ConnectionClosed);
        }
        self.credentials.lock().unwrap().require()?;
        self.stream_requested.store(true, Ordering::SeqCst);
        if self.connected.load(Ordering::SeqCst) {
            self.request_input_stream().await;
        }
        Ok(())
    }

    /// Sends one frame to the display.
    ///
    /// `frame` must be exactly [`FRAME_LEN`] bytes: 14 rows by 28 columns,
    /// three bytes (R, G, B) per window, row-major from the top-left corner.
    ///
    /// The frame is stored as the keep-alive resend candidate regardless of
    /// connection state. If the connection is established it is also written
    /// out immediately; write failures are logged, not raised. A frame stored
    /// while disconnected is NOT flushed automatically when the connection
    /// comes up - only a later `send_frame` or keep-alive tick transmits it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectionClosed`],
    /// [`ClientError::MissingCredential`], or [`ClientError::FrameLength`];
    /// all checks happen before any transport interaction.
    pub async fn send_frame(&self, frame: &[u8]) -> Result<(), ClientError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::ConnectionClosed);
        }
        let (username, token) = self.credentials.lock().unwrap().require()?;
        if frame.len() != FRAME_LEN {
            return Err(ClientError::frame_length(frame.len()));
        }

        *self.last_frame.lock().unwrap() = Some(frame.to_vec());
        self.sent_since_tick.store(true, Ordering::SeqCst);

        if self.connected.load(Ordering::SeqCst) {
            match encode_request(&Request::frame_write(&username, &token, frame)) {
                Ok(bytes) => self.write_message(bytes, "frame").await,
                Err(e) => error!("encoding frame request failed: {e}"),
            }
        }
        Ok(())
    }

    /// Whether the transport session is currently open.
    ///
    /// Establishment and teardown are asynchronous, so this may read `false`
    /// right after acquisition and may briefly read stale during teardown.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.closed.load(Ordering::SeqCst)
    }

    /// Closes the connection and removes it from the registry.
    ///
    /// Idempotent and infallible: shutdown problems are logged, never raised.
    /// The keep-alive scheduler and the delivery task are cancelled here, not
    /// just asked to stop.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.connected.store(false, Ordering::SeqCst);
        if let Some(registry) = self.registry.upgrade() {
            registry.deregister(&self.destination, self);
        }
        for task in self.tasks.lock().unwrap().drain(..) {
            task.abort();
        }
        let mut writer = self.writer.lock().await;
        if let Some(mut sink) = writer.take() {
            if let Err(e) = sink.close().await {
                debug!("websocket close handshake failed: {e}");
            }
        }
        if self.options.debug > 0 {
            info!("connection to {} closed", self.destination);
        }
    }

    // ── Listeners ────────────────────────────────────────────────────────────

    /// Registers an input listener. Listeners run on the delivery task and
    /// must not block for long.
    pub fn add_input_listener(&self, listener: Arc<dyn InputListener>) {
        self.hub.add(listener);
    }

    /// Removes a previously registered listener (matched by `Arc` identity).
    pub fn remove_input_listener(&self, listener: &Arc<dyn InputListener>) {
        self.hub.remove(listener);
    }

    // ── Internals shared with the keep-alive scheduler ───────────────────────

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Reads and clears the sent-since-tick marker.
    pub(crate) fn take_sent_marker(&self) -> bool {
        self.sent_since_tick.swap(false, Ordering::SeqCst)
    }

    pub(crate) fn last_frame_snapshot(&self) -> Option<Vec<u8>> {
        self.last_frame.lock().unwrap().clone()
    }

    /// Re-encodes and writes the stored frame; called by the keep-alive
    /// scheduler only. Does not touch the sent-since-tick marker.
    pub(crate) async fn resend_last_frame(&self, frame: &[u8]) {
        let credentials = self.credentials.lock().unwrap().require();
        // A frame can only have been stored after the credential check in
        // send_frame, so this branch is unreachable in practice.
        let Ok((username, token)) = credentials else {
            return;
        };
        match encode_request(&Request::frame_write(&username, &token, frame)) {
            Ok(bytes) => self.write_message(bytes, "keep-alive frame").await,
            Err(e) => error!("encoding keep-alive frame failed: {e}"),
        }
    }

    // ── Transport ────────────────────────────────────────────────────────────

    /// Sends the input-stream subscription exactly once per connection.
    async fn request_input_stream(&self) {
        if !self.connected.load(Ordering::SeqCst) || self.stream_sent.swap(true, Ordering::SeqCst)
        {
            return;
        }
        let credentials = self.credentials.lock().unwrap().require();
        let Ok((username, token)) = credentials else {
            return;
        };
        match encode_request(&Request::input_stream(&username, &token)) {
            Ok(bytes) => self.write_message(bytes, "input stream subscription").await,
            Err(e) => error!("encoding input stream subscription failed: {e}"),
        }
    }

    /// Writes one binary message through the shared sink. Failures are
    /// logged; past the validation boundary nothing is raised.
    async fn write_message(&self, bytes: Vec<u8>, what: &'static str) {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(sink) => {
                if let Err(e) = sink.send(Message::Binary(bytes)).await {
                    warn!("sending {what} to {} failed: {e}", self.destination);
                }
            }
            None => debug!("dropping {what}: transport for {} is gone", self.destination),
        }
    }

    fn build_connector(&self) -> Result<Option<Connector>, native_tls::Error> {
        if !self.options.allow_self_signed {
            return Ok(None);
        }
        // A self-signed deployment cannot pass the validity check; the
        // connection stays encrypted with the check switched off.
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Some(Connector::NativeTls(tls)))
    }

    /// Connect task, then delivery context. Runs for the whole life of the
    /// transport session.
    async fn run(self: Arc<Self>) {
        let connector = match self.build_connector() {
            Ok(connector) => connector,
            Err(e) => {
                error!("building TLS connector for {} failed: {e}", self.destination);
                self.closed.store(true, Ordering::SeqCst);
                return;
            }
        };

        if self.options.debug > 0 {
            info!("connecting to {}", self.destination);
        }
        let stream =
            match connect_async_tls_with_config(self.destination.as_str(), None, false, connector)
                .await
            {
                Ok((stream, _response)) => stream,
                Err(e) => {
                    error!("connecting to {} failed: {e}", self.destination);
                    self.closed.store(true, Ordering::SeqCst);
                    return;
                }
            };

        let (sink, mut inbound) = stream.split();
        *self.writer.lock().await = Some(sink);
        self.connected.store(true, Ordering::SeqCst);
        if self.options.debug > 0 {
            info!("connected to {}", self.destination);
        }

        // A subscription requested while the handshake was in flight goes
        // out now, with the credentials configured at this moment.
        if self.stream_requested.load(Ordering::SeqCst) {
            self.request_input_stream().await;
        }

        let keepalive_task = keepalive::spawn(Arc::clone(&self));
        self.tasks.lock().unwrap().push(keepalive_task);

        // Delivery context: inbound messages, including listener dispatch,
        // are handled here strictly in arrival order.
        while let Some(message) = inbound.next().await {
            match message {
                Ok(Message::Binary(bytes)) => self.handle_binary(&bytes),
                Ok(Message::Text(text)) => {
                    if self.options.debug > 1 {
                        debug!("ignoring text message from {}: {text}", self.destination);
                    }
                }
                Ok(Message::Close(frame)) => {
                    if self.options.debug > 0 {
                        info!("{} closed the connection: {frame:?}", self.destination);
                    }
                    break;
                }
                // Protocol-level ping/pong is answered by tungstenite itself.
                Ok(_) => {}
                Err(e) => {
                    warn!("websocket error on {}: {e}", self.destination);
                    break;
                }
            }
        }

        // Transport teardown ends the session for good; a fresh registry
        // acquisition is required to reach this destination again.
        self.connected.store(false, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Routes one inbound binary message.
    fn handle_binary(&self, bytes: &[u8]) {
        if self.options.debug > 1 {
            debug!("received {} bytes from {}", bytes.len(), self.destination);
        }
        match decode_response(bytes) {
            Ok(Response::Ack {
                request_id: INPUT_STREAM_REQUEST_ID,
                payload,
            }) => self.hub.dispatch_payload(&payload),
            Ok(Response::Ack { request_id, .. }) => {
                debug!("request {request_id} acknowledged by {}", self.destination);
            }
            Ok(Response::Error { status, message }) => {
                error!("display API error ({status}): {message}");
            }
            // Malformed inbound data drops this one message only; the
            // connection stays up.
            Err(e) => warn!("dropping malformed message from {}: {e}", self.destination),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
