//! Message protocol definitions
//!
//! Every wire value is one WebSocket Text frame carrying a JSON value:
//! a string for chat lines, or a list of strings for roster snapshots.
//! The disconnect control byte travels alone in a Binary frame.
//!
//! Inbound text is classified by prefix:
//! - `-peer:body` is a private delivery
//! - anything else is a room broadcast
//!
//! The private form splits on `:`, so a colon inside a peer-addressed body
//! cannot be told apart from the field separator. This matches what
//! servers speaking this protocol send and is kept as-is.

use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::Message;

use crate::error::ProtocolError;
use crate::types::Username;

/// Control byte sent right before closing the stream
pub const DISCONNECT_BYTE: u8 = 1;

/// Prefix of a join announcement
pub const JOIN_PREFIX: char = '+';
/// Prefix of an outgoing private message
pub const PRIVATE_OUT_PREFIX: char = '@';
/// Prefix of an incoming private delivery
pub const PRIVATE_IN_PREFIX: char = '-';

/// A raw wire value
///
/// Untagged: the JSON shape itself is the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    /// A single text value
    Text(String),
    /// A sequence of text values (roster snapshot)
    List(Vec<String>),
}

/// Server → Client event, decoded at the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Broadcast line for the shared room
    RoomMessage { text: String },
    /// Private delivery; `peer` is the first field after the `-` marker
    PrivateMessage { peer: String, text: String },
    /// Connected users, local username already removed
    RosterUpdate { names: Vec<String> },
}

/// Client → Server request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// `+name`
    Join { username: String },
    /// `name: body`
    Room { username: String, body: String },
    /// `@name: peer body`
    Private {
        username: String,
        peer: String,
        body: String,
    },
    /// Control byte, followed by stream close
    Disconnect,
}

impl Outbound {
    /// Wire text for text-valued requests, `None` for `Disconnect`
    pub fn wire_text(&self) -> Option<String> {
        match self {
            Outbound::Join { username } => Some(format!("{}{}", JOIN_PREFIX, username)),
            Outbound::Room { username, body } => Some(format!("{}: {}", username, body)),
            Outbound::Private {
                username,
                peer,
                body,
            } => Some(format!(
                "{}{}: {} {}",
                PRIVATE_OUT_PREFIX, username, peer, body
            )),
            Outbound::Disconnect => None,
        }
    }

    /// Encode into a WebSocket frame
    pub fn to_message(&self) -> Result<Message, ProtocolError> {
        match self.wire_text() {
            Some(text) => {
                let json = serde_json::to_string(&WireValue::Text(text))?;
                Ok(Message::Text(json.into()))
            }
            None => Ok(Message::Binary(vec![DISCONNECT_BYTE].into())),
        }
    }
}

/// Bidirectional codec bound to the local username
///
/// The username is needed to drop ourselves from roster snapshots.
#[derive(Debug, Clone)]
pub struct Codec {
    username: Username,
}

impl Codec {
    pub fn new(username: Username) -> Self {
        Self { username }
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn join(&self) -> Outbound {
        Outbound::Join {
            username: self.username.to_string(),
        }
    }

    pub fn room(&self, body: &str) -> Outbound {
        Outbound::Room {
            username: self.username.to_string(),
            body: body.to_string(),
        }
    }

    pub fn private(&self, peer: &str, body: &str) -> Outbound {
        Outbound::Private {
            username: self.username.to_string(),
            peer: peer.to_string(),
            body: body.to_string(),
        }
    }

    /// Decode the JSON payload of a Text frame
    pub fn decode_text(&self, payload: &str) -> Result<Inbound, ProtocolError> {
        let value: WireValue = serde_json::from_str(payload).map_err(|e| {
            if e.is_data() {
                ProtocolError::UnsupportedValue(payload.to_string())
            } else {
                ProtocolError::Json(e)
            }
        })?;
        self.classify(value)
    }

    /// Turn a wire value into a typed event
    pub fn classify(&self, value: WireValue) -> Result<Inbound, ProtocolError> {
        match value {
            WireValue::List(names) => Ok(Inbound::RosterUpdate {
                names: names
                    .into_iter()
                    .filter(|name| name.as_str() != self.username.as_str())
                    .collect(),
            }),
            WireValue::Text(line) => {
                if let Some(framed) = line.strip_prefix(PRIVATE_IN_PREFIX) {
                    return decode_private(framed);
                }
                Ok(Inbound::RoomMessage { text: line })
            }
        }
    }
}

/// Split `peer:body` (the `-` marker already removed)
///
/// At most three fields; everything after the first field is the text.
fn decode_private(framed: &str) -> Result<Inbound, ProtocolError> {
    let mut fields = framed.splitn(3, ':');
    let peer = fields.next().unwrap_or_default();
    let rest: Vec<&str> = fields.collect();

    if peer.is_empty() || rest.is_empty() {
        return Err(ProtocolError::MalformedPrivate(framed.to_string()));
    }

    Ok(Inbound::PrivateMessage {
        peer: peer.to_string(),
        text: rest.join(":"),
    })
}
