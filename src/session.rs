//! Client session
//!
//! Owns one connection to the chat server: claims a username, runs the
//! inbound read loop, writes outbound requests and tears the connection down.
//!
//! # Concurrency
//! Exactly one background task per session reads from the server. All
//! other calls come from the control path. Both sides race to end the
//! session through a single atomic state cell; whoever wins reports the
//! disconnection, so it is reported exactly once. Reads have no timeout;
//! the only way to stop a parked reader is to close the transport.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};

use crate::error::{ClientError, ProtocolError};
use crate::message::{Codec, Outbound};
use crate::presentation::{connected_title, DisconnectReason, Presentation, NO_CONNECTION_TITLE};
use crate::router::Router;
use crate::types::{SessionId, SessionState, StateCell, Username};

/// Write half of a transport
pub type WireSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;
/// Read half of a transport
pub type WireStream = Pin<Box<dyn Stream<Item = Result<Message, WsError>> + Send>>;

/// An open, framed connection to the server
pub struct Transport {
    sink: WireSink,
    stream: WireStream,
}

impl Transport {
    pub fn new(sink: WireSink, stream: WireStream) -> Self {
        Self { sink, stream }
    }

    /// Split a WebSocket over any byte stream
    pub fn from_websocket<S>(ws: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, stream) = ws.split();
        Self::new(Box::pin(sink), Box::pin(stream))
    }
}

/// Opens transports
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = Result<Transport, WsError>> + Send;
}

/// Dials `ws://host:port/`
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Transport, WsError> {
        let url = format!("ws://{}:{}/", host, port);
        debug!("Dialing {}", url);
        let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
        Ok(Transport::from_websocket(ws))
    }
}

/// State shared between the control path and the read task
struct Shared {
    id: SessionId,
    state: StateCell,
    router: Mutex<Router>,
    presentation: Arc<dyn Presentation>,
    /// Flips to `true` once the disconnection has been reported
    announced: watch::Sender<bool>,
}

impl Shared {
    /// Clear session state and report the disconnection
    ///
    /// Only the caller that won `state.shut_down()` may call this. The
    /// report runs on its own task so aborting or dropping the caller
    /// cannot cut it short.
    fn spawn_announce(self: &Arc<Self>, reason: DisconnectReason) -> JoinHandle<()> {
        let shared = self.clone();
        tokio::spawn(async move {
            info!("Session {} disconnected: {}", shared.id, reason);
            shared.router.lock().await.clear();
            shared.presentation.notify_title(NO_CONNECTION_TITLE);
            shared.presentation.disconnected(&reason);
            shared.announced.send_replace(true);
        })
    }

    async fn announce(self: &Arc<Self>, reason: DisconnectReason) {
        if let Err(e) = self.spawn_announce(reason).await {
            error!("Session {} disconnect report failed: {}", self.id, e);
        }
    }

    async fn finish(self: &Arc<Self>, reason: DisconnectReason) {
        if self.state.shut_down() {
            self.announce(reason).await;
        }
    }

    /// Wait until whoever ended the session has reported it
    async fn wait_announced(&self) {
        let mut announced = self.announced.subscribe();
        let _ = announced.wait_for(|done| *done).await;
    }
}

/// One live connection
pub struct Session {
    shared: Arc<Shared>,
    codec: Codec,
    addr: String,
    sink: Mutex<WireSink>,
    read_task: JoinHandle<()>,
}

/// A dialed connection whose username has not been announced yet
///
/// Dropping it closes the transport without touching the presentation.
pub struct PendingSession {
    username: Username,
    host: String,
    port: u16,
    transport: Transport,
}

impl PendingSession {
    /// Write the join announcement, go active and start the read loop
    pub async fn start(self, presentation: Arc<dyn Presentation>) -> Result<Session, ClientError> {
        let PendingSession {
            username,
            host,
            port,
            transport: Transport { mut sink, stream },
        } = self;

        let addr = format!("{}:{}", host, port);
        let id = SessionId::new();
        info!("Session {} connected to {} as {}", id, addr, username);

        let codec = Codec::new(username.clone());
        let shared = Arc::new(Shared {
            id,
            state: StateCell::new(),
            router: Mutex::new(Router::new(username.clone(), presentation.clone())),
            presentation,
            announced: watch::channel(false).0,
        });

        // Join announcement
        if let Err(e) = write(&mut sink, &codec.join()).await {
            warn!("Session {} failed to announce join: {}", id, e);
            shared.state.shut_down();
            let _ = sink.close().await;
            return Err(e);
        }

        if shared.state.activate() {
            shared
                .presentation
                .notify_title(&connected_title(&host, port, username.as_str()));
        }

        let read_task = tokio::spawn(read_loop(shared.clone(), codec.clone(), stream));

        Ok(Session {
            shared,
            codec,
            addr,
            sink: Mutex::new(sink),
            read_task,
        })
    }
}

impl Session {
    /// Validate `raw_username` and open a transport, without claiming it yet
    ///
    /// The username is filtered and validated before dialing, so a rejected
    /// name never reaches the wire.
    pub async fn dial<C: Connector>(
        connector: &C,
        host: &str,
        port: u16,
        raw_username: &str,
    ) -> Result<PendingSession, ClientError> {
        let username = Username::parse(raw_username).inspect_err(|e| {
            warn!("Rejected username '{}': {}", raw_username, e);
        })?;

        let transport = connector
            .connect(host, port)
            .await
            .map_err(|source| ClientError::Connection {
                addr: format!("{}:{}", host, port),
                source,
            })?;

        Ok(PendingSession {
            username,
            host: host.to_string(),
            port,
            transport,
        })
    }

    /// Open a connection and claim `raw_username`
    ///
    /// On success the join announcement has been written, the title
    /// updated and the read loop started.
    pub async fn connect<C: Connector>(
        connector: &C,
        host: &str,
        port: u16,
        raw_username: &str,
        presentation: Arc<dyn Presentation>,
    ) -> Result<Session, ClientError> {
        Self::dial(connector, host, port, raw_username)
            .await?
            .start(presentation)
            .await
    }

    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    pub fn username(&self) -> &Username {
        self.codec.username()
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// `host:port` this session is connected to
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn state(&self) -> SessionState {
        self.shared.state.load()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Roster and conversation state of this session
    pub fn router(&self) -> &Mutex<Router> {
        &self.shared.router
    }

    /// Encode and write one request
    ///
    /// A failed write is reported to the presentation and returned, but the
    /// session stays up. After disconnect this returns `NotConnected`
    /// without touching the transport.
    pub async fn send(&self, request: Outbound) -> Result<(), ClientError> {
        if self.shared.state.is_disconnected() {
            debug!("Session {} is disconnected, not sending", self.shared.id);
            return Err(ClientError::NotConnected);
        }

        let mut sink = self.sink.lock().await;

        // disconnect() flips the state before it takes the sink
        if self.shared.state.is_disconnected() {
            return Err(ClientError::NotConnected);
        }

        if let Err(e) = write(&mut sink, &request).await {
            warn!("Session {} write failed: {}", self.shared.id, e);
            self.shared
                .presentation
                .show_error(&format!("Failed to send message: {}", e));
            return Err(e);
        }

        debug!("Session {} sent {:?}", self.shared.id, request);
        Ok(())
    }

    /// Send the control byte, close the transport and end the session
    ///
    /// Idempotent, and safe to race with the read loop ending on its own.
    /// Returns once the disconnection has been reported, whichever side
    /// ended the session.
    pub async fn disconnect(&self) {
        if !self.shared.state.shut_down() {
            debug!("Session {} already disconnected", self.shared.id);
            self.shared.wait_announced().await;
            return;
        }

        {
            let mut sink = self.sink.lock().await;
            if let Err(e) = write(&mut sink, &Outbound::Disconnect).await {
                debug!("Session {} could not send disconnect byte: {}", self.shared.id, e);
            }
            if let Err(e) = sink.close().await {
                debug!("Session {} close failed: {}", self.shared.id, e);
            }
        }

        // Dropping the read half finishes closing the transport
        self.read_task.abort();

        self.shared.announce(DisconnectReason::UserRequested).await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.read_task.abort();

        // Dropped while still up: report it like a local disconnect
        if self.shared.state.shut_down() {
            if tokio::runtime::Handle::try_current().is_ok() {
                let _ = self.shared.spawn_announce(DisconnectReason::UserRequested);
            } else {
                warn!("Session {} dropped outside a runtime, not reported", self.shared.id);
            }
        }
    }
}

async fn write(sink: &mut WireSink, request: &Outbound) -> Result<(), ClientError> {
    let msg = request.to_message()?;
    sink.send(msg).await?;
    Ok(())
}

/// Read values until the stream ends, routing each decoded event
async fn read_loop(shared: Arc<Shared>, codec: Codec, mut stream: WireStream) {
    let id = shared.id;

    let reason = loop {
        match stream.next().await {
            Some(Ok(Message::Text(payload))) => match codec.decode_text(&payload) {
                Ok(inbound) => {
                    debug!("Session {} received {:?}", id, inbound);
                    let mut router = shared.router.lock().await;
                    // Checked under the router lock so nothing is routed
                    // after the session state has been cleared
                    if shared.state.is_disconnected() {
                        debug!("Read task for {} stopping, session closed", id);
                        return;
                    }
                    router.route(inbound);
                }
                Err(e) => warn!("Session {} dropped inbound value: {}", id, e),
            },
            Some(Ok(Message::Binary(_))) => {
                warn!(
                    "Session {} dropped inbound value: {}",
                    id,
                    ProtocolError::UnexpectedFrame("binary")
                );
            }
            Some(Ok(Message::Close(frame))) => {
                debug!("Server sent close frame to {}: {:?}", id, frame);
                break DisconnectReason::ServerClosed;
            }
            Some(Ok(_)) => {
                // Ping/Pong are answered by tungstenite
            }
            Some(Err(e)) => {
                error!("Read failed for {}: {}", id, e);
                break DisconnectReason::TransportFailed(e.to_string());
            }
            None => break DisconnectReason::ServerClosed,
        }
    };

    shared.finish(reason).await;
    debug!("Read task ended for {}", id);
}
