//! Basic type definitions for the chat client
//!
//! Provides newtype wrappers for type safety:
//! - `Username`: a username that passed the framing-character filter
//! - `ConversationKey`: the shared room or a peer's private thread
//! - `SessionId`: UUID-based identifier used to correlate log lines
//! - `SessionState` / `StateCell`: the single authoritative session state

use std::sync::atomic::{AtomicU8, Ordering};

use uuid::Uuid;

use crate::error::ValidationError;

/// Characters that frame values on the wire and separate tab keys.
pub const RESERVED_USERNAME_CHARS: [char; 4] = ['@', '+', '-', ' '];

/// Minimum username length after filtering
pub const MIN_USERNAME_LEN: usize = 3;

/// A username that is safe to put on the wire
///
/// Built only through [`Username::parse`], which drops the reserved
/// characters and enforces the minimum length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Filter a raw candidate and validate what remains
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let filtered: String = raw
            .chars()
            .filter(|c| !RESERVED_USERNAME_CHARS.contains(c))
            .collect();

        if filtered.is_empty() {
            return Err(ValidationError::Empty {
                raw: raw.to_string(),
            });
        }

        if filtered.chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationError::TooShort {
                name: filtered,
                min: MIN_USERNAME_LEN,
            });
        }

        Ok(Self(filtered))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for Username {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Identifies a conversation (one tab in the front end)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConversationKey {
    /// The shared broadcast room
    Room,
    /// A private thread with the named peer
    Peer(String),
}

impl ConversationKey {
    /// Tab title of the shared room
    pub const ROOM_TITLE: &'static str = "Open Chat";

    pub fn peer(name: impl Into<String>) -> Self {
        Self::Peer(name.into())
    }

    pub fn is_room(&self) -> bool {
        matches!(self, Self::Room)
    }

    /// Peer username for private threads, `None` for the room
    pub fn peer_name(&self) -> Option<&str> {
        match self {
            Self::Room => None,
            Self::Peer(name) => Some(name),
        }
    }

    /// Title shown on the conversation's tab
    pub fn title(&self) -> &str {
        match self {
            Self::Room => Self::ROOM_TITLE,
            Self::Peer(name) => name,
        }
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Room => write!(f, "#room"),
            Self::Peer(name) => write!(f, "@{}", name),
        }
    }
}

/// Unique session identifier (newtype pattern)
///
/// Only used to tell sessions apart in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Connecting = 0,
    Active = 1,
    Disconnected = 2,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Active,
            _ => Self::Disconnected,
        }
    }
}

/// Atomic holder for [`SessionState`]
///
/// The read loop and the control path both race to tear a session down;
/// whichever call to [`StateCell::shut_down`] returns `true` owns the
/// teardown. Once `Disconnected`, the cell never changes again.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(SessionState::Connecting as u8))
    }

    pub fn load(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// `Connecting -> Active`. Fails if the session already went away.
    pub fn activate(&self) -> bool {
        self.0
            .compare_exchange(
                SessionState::Connecting as u8,
                SessionState::Active as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Move to `Disconnected`; returns `true` only for the first caller.
    pub fn shut_down(&self) -> bool {
        self.0.swap(SessionState::Disconnected as u8, Ordering::AcqRel)
            != SessionState::Disconnected as u8
    }

    pub fn is_disconnected(&self) -> bool {
        self.load() == SessionState::Disconnected
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
