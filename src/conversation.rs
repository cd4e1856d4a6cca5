//! Conversation registry
//!
//! One conversation per tab: the shared room plus a private thread per peer.
//! Conversations are created lazily and live until the session ends.

use std::collections::HashMap;
use std::time::Instant;

use crate::types::ConversationKey;

/// An ordered log of lines for one key
#[derive(Debug)]
pub struct Conversation {
    /// Room or peer
    pub key: ConversationKey,
    /// Lines in arrival order
    pub lines: Vec<String>,
    /// When the conversation was first referenced
    pub created_at: Instant,
}

impl Conversation {
    pub fn new(key: ConversationKey) -> Self {
        Self {
            key,
            lines: Vec::new(),
            created_at: Instant::now(),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Key → conversation map with a focus marker
///
/// The room always exists. `order` keeps keys in creation order so the
/// front end can lay tabs out stably.
#[derive(Debug)]
pub struct ConversationRegistry {
    conversations: HashMap<ConversationKey, Conversation>,
    order: Vec<ConversationKey>,
    focused: ConversationKey,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            conversations: HashMap::new(),
            order: Vec::new(),
            focused: ConversationKey::Room,
        };
        registry.get_or_create(&ConversationKey::Room);
        registry
    }

    /// Look up a conversation, creating it on first reference
    ///
    /// The flag is `true` when the conversation was just created.
    pub fn get_or_create(&mut self, key: &ConversationKey) -> (&mut Conversation, bool) {
        let created = !self.conversations.contains_key(key);
        if created {
            self.order.push(key.clone());
        }
        let conversation = self
            .conversations
            .entry(key.clone())
            .or_insert_with(|| Conversation::new(key.clone()));
        (conversation, created)
    }

    /// Append a line, creating the conversation if needed
    ///
    /// Returns `true` when the conversation was created by this call.
    pub fn append(&mut self, key: &ConversationKey, line: impl Into<String>) -> bool {
        let (conversation, created) = self.get_or_create(key);
        conversation.push(line);
        created
    }

    pub fn get(&self, key: &ConversationKey) -> Option<&Conversation> {
        self.conversations.get(key)
    }

    pub fn contains(&self, key: &ConversationKey) -> bool {
        self.conversations.contains_key(key)
    }

    /// Keys in creation order, room first
    pub fn keys(&self) -> &[ConversationKey] {
        &self.order
    }

    pub fn focused(&self) -> &ConversationKey {
        &self.focused
    }

    /// Move focus to an existing conversation
    ///
    /// Returns `false` and leaves focus unchanged for unknown keys.
    pub fn focus(&mut self, key: &ConversationKey) -> bool {
        if !self.conversations.contains_key(key) {
            return false;
        }
        self.focused = key.clone();
        true
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Drop every conversation and reset focus to the room
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for ConversationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_starts_with_focused_room() {
        let registry = ConversationRegistry::new();

        assert_eq!(registry.focused(), &ConversationKey::Room);
        assert!(registry.contains(&ConversationKey::Room));
        assert_eq!(registry.keys(), &[ConversationKey::Room]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_append_creates_lazily() {
        let mut registry = ConversationRegistry::new();
        let bob = ConversationKey::peer("Bob");

        assert!(registry.append(&bob, "Bob:hey"));
        assert!(!registry.append(&bob, "Bob:still there?"));

        let conversation = registry.get(&bob).unwrap();
        assert_eq!(conversation.lines, vec!["Bob:hey", "Bob:still there?"]);
        assert_eq!(registry.keys(), &[ConversationKey::Room, bob.clone()]);
    }

    #[test]
    fn test_creating_does_not_move_focus() {
        let mut registry = ConversationRegistry::new();
        registry.append(&ConversationKey::peer("Bob"), "Bob:hey");

        assert_eq!(registry.focused(), &ConversationKey::Room);
    }

    #[test]
    fn test_focus_requires_existing_conversation() {
        let mut registry = ConversationRegistry::new();
        let carl = ConversationKey::peer("Carl");

        assert!(!registry.focus(&carl));
        assert_eq!(registry.focused(), &ConversationKey::Room);

        registry.get_or_create(&carl);
        assert!(registry.focus(&carl));
        assert_eq!(registry.focused(), &carl);
    }

    #[test]
    fn test_clear_resets_to_room_only() {
        let mut registry = ConversationRegistry::new();
        let bob = ConversationKey::peer("Bob");
        registry.append(&bob, "Bob:hey");
        registry.append(&ConversationKey::Room, "Carl: hi");
        registry.focus(&bob);

        registry.clear();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.focused(), &ConversationKey::Room);
        assert!(registry.get(&ConversationKey::Room).unwrap().is_empty());
    }
}
