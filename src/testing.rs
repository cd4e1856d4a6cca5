//! Test doubles shared by the unit tests
//!
//! - `RecordingPresentation` records every callback and lets a test await
//!   a condition on the recorded events
//! - `MemoryConnector` / `MemoryPeer` wire a session to in-process channels
//! - `FakeServer` is a scripted WebSocket server on a real TCP socket

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::WebSocketStream;

use crate::message::WireValue;
use crate::presentation::{DisconnectReason, Presentation};
use crate::session::{Connector, Transport};
use crate::types::ConversationKey;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// One recorded presentation callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Line(ConversationKey, String),
    Roster(Vec<String>),
    Title(String),
    Error(String),
    Opened(ConversationKey),
    Disconnected(DisconnectReason),
}

#[derive(Debug, Default)]
pub struct RecordingPresentation {
    events: Mutex<Vec<Event>>,
    notify: Notify,
}

impl RecordingPresentation {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(*e)).count()
    }

    /// Wait until `pred` holds for the recorded events
    pub async fn wait_for(&self, pred: impl Fn(&[Event]) -> bool) -> Vec<Event> {
        tokio::time::timeout(WAIT_TIMEOUT, async {
            loop {
                let events = self.events();
                if pred(events.as_slice()) {
                    return events;
                }
                self.notify.notified().await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out; events so far: {:?}", self.events()))
    }

    pub async fn wait_disconnected(&self) -> Vec<Event> {
        self.wait_for(|events| {
            events
                .iter()
                .any(|e| matches!(e, Event::Disconnected(_)))
        })
        .await
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
        self.notify.notify_one();
    }
}

impl Presentation for RecordingPresentation {
    fn render_line(&self, conversation: &ConversationKey, text: &str) {
        self.push(Event::Line(conversation.clone(), text.to_string()));
    }

    fn show_roster(&self, names: &[String]) {
        self.push(Event::Roster(names.to_vec()));
    }

    fn notify_title(&self, text: &str) {
        self.push(Event::Title(text.to_string()));
    }

    fn show_error(&self, message: &str) {
        self.push(Event::Error(message.to_string()));
    }

    fn conversation_opened(&self, conversation: &ConversationKey) {
        self.push(Event::Opened(conversation.clone()));
    }

    fn disconnected(&self, reason: &DisconnectReason) {
        self.push(Event::Disconnected(reason.clone()));
    }
}

/// Decode the JSON string inside a Text frame
pub fn frame_text(msg: &Message) -> Option<String> {
    match msg {
        Message::Text(payload) => match serde_json::from_str::<WireValue>(payload).ok()? {
            WireValue::Text(text) => Some(text),
            WireValue::List(_) => None,
        },
        _ => None,
    }
}

fn text_frame(value: WireValue) -> Message {
    Message::Text(serde_json::to_string(&value).unwrap().into())
}

/// Sink half of an in-memory transport
struct MemorySink {
    tx: mpsc::UnboundedSender<Message>,
    fail: Arc<AtomicBool>,
}

impl Sink<Message> for MemorySink {
    type Error = WsError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), WsError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(WsError::Io(std::io::ErrorKind::BrokenPipe.into()));
        }
        self.tx.send(item).map_err(|_| WsError::AlreadyClosed)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }
}

/// Server end of an in-memory transport
pub struct MemoryPeer {
    written: mpsc::UnboundedReceiver<Message>,
    inbound: Option<mpsc::UnboundedSender<Result<Message, WsError>>>,
    fail: Arc<AtomicBool>,
}

impl MemoryPeer {
    pub fn send_text(&self, text: &str) {
        self.send(text_frame(WireValue::Text(text.to_string())));
    }

    pub fn send_roster(&self, names: &[&str]) {
        let names = names.iter().map(|s| s.to_string()).collect();
        self.send(text_frame(WireValue::List(names)));
    }

    pub fn send(&self, msg: Message) {
        if let Some(tx) = &self.inbound {
            let _ = tx.send(Ok(msg));
        }
    }

    pub fn send_error(&self, err: WsError) {
        if let Some(tx) = &self.inbound {
            let _ = tx.send(Err(err));
        }
    }

    /// End the client's inbound stream
    pub fn close(&mut self) {
        self.inbound = None;
    }

    /// Make every further client write fail
    pub fn fail_writes(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Everything the client wrote so far
    pub fn written(&mut self) -> Vec<Message> {
        let mut out = Vec::new();
        while let Ok(msg) = self.written.try_recv() {
            out.push(msg);
        }
        out
    }

    pub fn written_texts(&mut self) -> Vec<String> {
        self.written().iter().filter_map(frame_text).collect()
    }
}

pub fn memory_transport() -> (Transport, MemoryPeer) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<Result<Message, WsError>>();
    let fail = Arc::new(AtomicBool::new(false));

    let sink = MemorySink {
        tx: out_tx,
        fail: fail.clone(),
    };
    let stream = futures_util::stream::unfold(in_rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });

    let transport = Transport::new(Box::pin(sink), Box::pin(stream));
    let peer = MemoryPeer {
        written: out_rx,
        inbound: Some(in_tx),
        fail,
    };
    (transport, peer)
}

/// Hands out one prepared transport, then refuses
#[derive(Default)]
pub struct MemoryConnector {
    slot: Mutex<Option<Transport>>,
}

impl MemoryConnector {
    pub fn pair() -> (Self, MemoryPeer) {
        let (transport, peer) = memory_transport();
        let connector = Self {
            slot: Mutex::new(Some(transport)),
        };
        (connector, peer)
    }

    /// Connector whose every attempt is refused
    pub fn refusing() -> Self {
        Self::default()
    }

    /// Queue a fresh transport for the next attempt
    pub fn rearm(&self) -> MemoryPeer {
        let (transport, peer) = memory_transport();
        *self.slot.lock().unwrap() = Some(transport);
        peer
    }

    pub fn is_spent(&self) -> bool {
        self.slot.lock().unwrap().is_none()
    }
}

impl Connector for MemoryConnector {
    async fn connect(&self, _host: &str, _port: u16) -> Result<Transport, WsError> {
        let transport = self.slot.lock().unwrap().take();
        transport.ok_or_else(|| WsError::Io(std::io::ErrorKind::ConnectionRefused.into()))
    }
}

/// Bind a listener on an ephemeral localhost port
pub async fn listen() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// Scripted WebSocket server for one client
pub struct FakeServer {
    ws: WebSocketStream<TcpStream>,
}

impl FakeServer {
    pub async fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        Self { ws }
    }

    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(text_frame(WireValue::Text(text.to_string())))
            .await
            .unwrap();
    }

    pub async fn send_roster(&mut self, names: &[&str]) {
        let names = names.iter().map(|s| s.to_string()).collect();
        self.ws
            .send(text_frame(WireValue::List(names)))
            .await
            .unwrap();
    }

    /// Next data or close frame from the client, skipping ping/pong
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            let msg = tokio::time::timeout(WAIT_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for client frame")?
                .ok()?;
            match msg {
                Message::Ping(_) | Message::Pong(_) => continue,
                other => return Some(other),
            }
        }
    }

    pub async fn recv_text(&mut self) -> String {
        let msg = self.recv().await.expect("client closed");
        frame_text(&msg).unwrap_or_else(|| panic!("expected text value, got {:?}", msg))
    }

    /// Close from the server side and let the handshake finish
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
        let _ = tokio::time::timeout(Duration::from_millis(500), async {
            while let Some(Ok(_)) = self.ws.next().await {}
        })
        .await;
    }
}
