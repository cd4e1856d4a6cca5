//! Chat client controller
//!
//! The surface the front end calls into: connect, disconnect, focus a
//! conversation, submit typed text. Holds at most one session at a time.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{parse_address, ClientConfig};
use crate::error::ClientError;
use crate::presentation::Presentation;
use crate::session::{Connector, Session, WsConnector};
use crate::types::{ConversationKey, SessionState};

/// Front-end facing controller
///
/// Outbound text goes wherever focus points: the room is a broadcast,
/// a peer conversation is a private message to that peer.
pub struct ChatClient<C = WsConnector> {
    connector: C,
    presentation: Arc<dyn Presentation>,
    config: ClientConfig,
    session: Option<Session>,
    /// Consecutive failed writes on the current session
    send_failures: usize,
}

impl ChatClient<WsConnector> {
    /// Create a client that dials real WebSocket servers
    pub fn new(presentation: Arc<dyn Presentation>, config: ClientConfig) -> Self {
        Self::with_connector(WsConnector, presentation, config)
    }
}

impl<C: Connector> ChatClient<C> {
    pub fn with_connector(
        connector: C,
        presentation: Arc<dyn Presentation>,
        config: ClientConfig,
    ) -> Self {
        Self {
            connector,
            presentation,
            config,
            session: None,
            send_failures: 0,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect using the configured host, port and username
    pub async fn connect_configured(&mut self) -> Result<(), ClientError> {
        let ClientConfig {
            host,
            port,
            username,
            ..
        } = self.config.clone();
        self.request_connect(&host, port, &username).await
    }

    /// Connect to a `host:port` address as typed by the user
    pub async fn connect_address(&mut self, addr: &str, username: &str) -> Result<(), ClientError> {
        let (host, port) = match parse_address(addr) {
            Ok(target) => target,
            Err(e) => {
                self.presentation.show_error(&e.to_string());
                return Err(e.into());
            }
        };
        self.request_connect(&host, port, username).await
    }

    /// Open a new session, replacing any current one
    ///
    /// The current session is only ended once the new username is valid and
    /// the server has been reached. Failures are shown to the user and
    /// returned.
    pub async fn request_connect(
        &mut self,
        host: &str,
        port: u16,
        username: &str,
    ) -> Result<(), ClientError> {
        let result = match Session::dial(&self.connector, host, port, username).await {
            Ok(pending) => {
                self.request_disconnect().await;
                pending.start(self.presentation.clone()).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(session) => {
                info!("Connected to {}:{} as {}", host, port, session.username());
                self.session = Some(session);
                self.send_failures = 0;
                Ok(())
            }
            Err(e) => {
                warn!("Connect to {}:{} failed: {}", host, port, e);
                let message = match &e {
                    ClientError::Connection { .. } => "Connection to server was not found".to_string(),
                    other => other.to_string(),
                };
                self.presentation.show_error(&message);
                Err(e)
            }
        }
    }

    /// End the current session, if any
    pub async fn request_disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.disconnect().await;
        }
        self.send_failures = 0;
    }

    /// Submit text to the focused conversation
    pub async fn submit(&mut self, text: &str) -> Result<(), ClientError> {
        let Some(key) = self.focused().await else {
            return Err(ClientError::NotConnected);
        };
        self.submit_outgoing(&key, text).await
    }

    /// Submit text typed into `conversation`
    ///
    /// Empty text is ignored. Private text is echoed into the peer's
    /// conversation once it has been written, since the server does not
    /// send it back.
    pub async fn submit_outgoing(
        &mut self,
        conversation: &ConversationKey,
        text: &str,
    ) -> Result<(), ClientError> {
        if text.is_empty() {
            return Ok(());
        }

        let Some(session) = self.session.as_ref().filter(|s| s.is_active()) else {
            debug!("Not connected, dropping outgoing text");
            return Err(ClientError::NotConnected);
        };

        let request = match conversation.peer_name() {
            None => session.codec().room(text),
            Some(peer) => session.codec().private(peer, text),
        };

        match session.send(request).await {
            Ok(()) => {
                if !conversation.is_room() {
                    session.router().lock().await.append_local(conversation, text);
                }
                self.send_failures = 0;
                Ok(())
            }
            Err(ClientError::NotConnected) => Err(ClientError::NotConnected),
            Err(e) => {
                self.send_failures += 1;
                if self.send_failures >= self.config.max_send_failures {
                    warn!(
                        "{} consecutive send failures, disconnecting",
                        self.send_failures
                    );
                    self.request_disconnect().await;
                }
                Err(e)
            }
        }
    }

    /// The user picked `peer` from the roster
    ///
    /// Creates the private conversation if needed and focuses it. Returns
    /// `false` when there is no session or the name is blank or our own.
    pub async fn open_private(&self, peer: &str) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let peer = peer.trim();
        if peer.is_empty() || session.username().as_str() == peer {
            return false;
        }
        session
            .router()
            .lock()
            .await
            .open(&ConversationKey::peer(peer));
        true
    }

    /// Focus an existing conversation
    pub async fn focus(&self, key: &ConversationKey) -> bool {
        match &self.session {
            Some(session) => session.router().lock().await.focus(key),
            None => false,
        }
    }

    pub async fn focused(&self) -> Option<ConversationKey> {
        let session = self.session.as_ref()?;
        let router = session.router().lock().await;
        Some(router.focused().clone())
    }

    /// Current roster, local user excluded
    pub async fn roster(&self) -> Vec<String> {
        match &self.session {
            Some(session) => session.router().lock().await.roster().names(),
            None => Vec::new(),
        }
    }

    /// Conversation keys in creation order
    pub async fn conversations(&self) -> Vec<ConversationKey> {
        match &self.session {
            Some(session) => session.router().lock().await.conversations().keys().to_vec(),
            None => Vec::new(),
        }
    }

    pub async fn lines(&self, key: &ConversationKey) -> Vec<String> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        let router = session.router().lock().await;
        router
            .conversations()
            .get(key)
            .map(|c| c.lines.clone())
            .unwrap_or_default()
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(Session::state)
            .unwrap_or(SessionState::Disconnected)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Active
    }
}
