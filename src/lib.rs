//! Multi-party Chat Client Library
//!
//! Client side of a small chat protocol: one shared room, private
//! one-to-one threads and a roster of connected users, carried over a
//! WebSocket connection.
//!
//! # Features
//! - Username claim with framing-character filtering
//! - Room broadcasts and private messages
//! - Roster tracking (local user excluded)
//! - Per-conversation logs with a focus marker deciding where typed text goes
//! - Clean disconnect, reported exactly once
//!
//! # Architecture
//! - `Session` owns the connection and one background read task
//! - `Router` applies decoded events to the roster and conversations
//! - The front end implements `Presentation` and drives a `ChatClient`
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use chat_client_v1::{ChatClient, ClientConfig, TerminalPresentation};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut client = ChatClient::new(Arc::new(TerminalPresentation), ClientConfig::default());
//!     client.request_connect("localhost", 9020, "Amy").await.unwrap();
//!     client.submit("hello everyone").await.unwrap();
//!     client.request_disconnect().await;
//! }
//! ```

pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod message;
pub mod presentation;
pub mod roster;
pub mod router;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use client::ChatClient;
pub use config::ClientConfig;
pub use conversation::{Conversation, ConversationRegistry};
pub use error::{ClientError, ConfigError, ProtocolError, ValidationError};
pub use message::{Codec, Inbound, Outbound, WireValue};
pub use presentation::{DisconnectReason, Presentation, TerminalPresentation};
pub use roster::Roster;
pub use router::Router;
pub use session::{Connector, PendingSession, Session, Transport, WsConnector};
pub use types::{ConversationKey, SessionId, SessionState, Username};
