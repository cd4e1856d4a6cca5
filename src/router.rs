//! Inbound event router
//!
//! Owns the authoritative roster and conversation state. The session's read
//! task calls [`Router::route`] for every decoded event; the control path
//! only changes focus and appends the local echo of private messages.

use std::sync::Arc;

use tracing::{debug, info};

use crate::conversation::ConversationRegistry;
use crate::message::Inbound;
use crate::presentation::Presentation;
use crate::roster::Roster;
use crate::types::{ConversationKey, Username};

/// Applies inbound events to roster and conversations, then notifies
/// the presentation.
pub struct Router {
    username: Username,
    roster: Roster,
    conversations: ConversationRegistry,
    presentation: Arc<dyn Presentation>,
}

impl Router {
    pub fn new(username: Username, presentation: Arc<dyn Presentation>) -> Self {
        Self {
            username,
            roster: Roster::new(),
            conversations: ConversationRegistry::new(),
            presentation,
        }
    }

    /// Process a single inbound event
    pub fn route(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::RoomMessage { text } => self.route_room(text),
            Inbound::PrivateMessage { peer, text } => self.route_private(peer, text),
            Inbound::RosterUpdate { names } => self.route_roster(names),
        }
    }

    fn route_room(&mut self, text: String) {
        self.conversations.append(&ConversationKey::Room, text.clone());
        self.presentation.render_line(&ConversationKey::Room, &text);
    }

    fn route_private(&mut self, peer: String, text: String) {
        let (key, line) = self.resolve_private(peer, text);
        self.append(&key, line);
    }

    fn route_roster(&mut self, names: Vec<String>) {
        self.roster.replace(names, self.username.as_str());
        debug!("Roster updated: {} other users", self.roster.len());
        self.presentation.show_roster(&self.roster.names());
    }

    /// Pick the conversation and line for a private delivery
    ///
    /// A delivery whose first field is our own name carries `sender:body`;
    /// it belongs to the sender's thread and is shown as-is. Otherwise the
    /// first field names the thread and the line reads `peer: text`.
    fn resolve_private(&self, peer: String, text: String) -> (ConversationKey, String) {
        if self.username == *peer.as_str() {
            if let Some((sender, _)) = text.split_once(':') {
                if !sender.is_empty() {
                    return (ConversationKey::peer(sender), text);
                }
            }
        }
        let line = format!("{}: {}", peer, text);
        (ConversationKey::Peer(peer), line)
    }

    /// Append a line and render it, announcing the conversation if new
    fn append(&mut self, key: &ConversationKey, line: String) {
        let created = self.conversations.append(key, line.clone());
        if created {
            info!("New conversation {}", key);
            self.presentation.conversation_opened(key);
        }
        self.presentation.render_line(key, &line);
    }

    /// Local echo of an outgoing private message
    ///
    /// The server does not send our own private text back to us.
    pub fn append_local(&mut self, key: &ConversationKey, body: &str) {
        let line = format!("{}: {}", self.username, body);
        self.append(key, line);
    }

    /// User picked a conversation: create it if needed and focus it
    pub fn open(&mut self, key: &ConversationKey) {
        let (_, created) = self.conversations.get_or_create(key);
        if created {
            info!("New conversation {}", key);
            self.presentation.conversation_opened(key);
        }
        self.conversations.focus(key);
    }

    /// Focus an existing conversation
    pub fn focus(&mut self, key: &ConversationKey) -> bool {
        self.conversations.focus(key)
    }

    pub fn focused(&self) -> &ConversationKey {
        self.conversations.focused()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn conversations(&self) -> &ConversationRegistry {
        &self.conversations
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Forget everything; used when the session ends
    pub fn clear(&mut self) {
        self.roster.clear();
        self.conversations.clear();
    }
}
