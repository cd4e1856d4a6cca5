//! Error types for the chat client
//!
//! Defines client-level errors plus the narrower validation, protocol
//! and configuration errors they wrap.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Client-level errors
///
/// `Validation` and `Connection` are fatal to a connect attempt only.
/// `Protocol` is logged and dropped by the read loop.
/// `Transport` on a write is reported but leaves the session up.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Username rejected before any connection was made
    #[error("Invalid username: {0}")]
    Validation(#[from] ValidationError),

    /// Transport could not be opened
    #[error("Could not connect to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// Malformed or unrecognized payload
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Read or write failure on an established connection
    #[error("Transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// Operation needs a live session
    #[error("Not connected")]
    NotConnected,

    /// Bad client configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Username validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Nothing left after dropping reserved characters
    #[error("username '{raw}' is empty after removing '@', '+', '-' and spaces")]
    Empty { raw: String },

    /// Filtered name is below the minimum length
    #[error("username '{name}' must be at least {min} characters")]
    TooShort { name: String, min: usize },
}

/// Inbound payload errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Text frame was not JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON value that is neither a string nor a list of strings
    #[error("Unsupported wire value: {0}")]
    UnsupportedValue(String),

    /// Private delivery without a `peer:body` split
    #[error("Malformed private message: {0}")]
    MalformedPrivate(String),

    /// Frame type the protocol does not use in this direction
    #[error("Unexpected {0} frame")]
    UnexpectedFrame(&'static str),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Address has no `:port` part
    #[error("Address '{0}' is missing a port")]
    MissingPort(String),

    /// Port is not a number in range
    #[error("Invalid port '{0}'")]
    InvalidPort(String),
}
