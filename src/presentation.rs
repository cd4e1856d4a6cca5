//! Presentation contract
//!
//! The core never touches a concrete UI. Whatever renders the chat
//! implements [`Presentation`] and is injected at construction.

use std::io::Write;

use crate::types::ConversationKey;

/// Title shown while no session is live
pub const NO_CONNECTION_TITLE: &str = "Chatroom [No Connection]";

/// Title shown once a session is active
pub fn connected_title(host: &str, port: u16, username: &str) -> String {
    format!("Chatroom [{}:{}] User: {}", host, port, username)
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Local `disconnect()` call
    UserRequested,
    /// Server closed the stream
    ServerClosed,
    /// Read failed on the established connection
    TransportFailed(String),
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserRequested => write!(f, "You have disconnected from the server"),
            Self::ServerClosed => write!(f, "The server closed the connection"),
            Self::TransportFailed(e) => write!(f, "Connection lost: {}", e),
        }
    }
}

/// Callbacks from the core into the front end
///
/// Called from the session's read task as well as the control path, so
/// implementations marshal onto their own UI thread if they have one.
pub trait Presentation: Send + Sync {
    /// A line was appended to a conversation
    fn render_line(&self, conversation: &ConversationKey, text: &str);

    /// New roster snapshot, local user already removed
    fn show_roster(&self, names: &[String]);

    fn notify_title(&self, text: &str);

    /// Non-fatal failure worth telling the user about
    fn show_error(&self, message: &str);

    /// A conversation tab now exists
    fn conversation_opened(&self, _conversation: &ConversationKey) {}

    /// The session ended; called exactly once per session
    fn disconnected(&self, _reason: &DisconnectReason) {}
}

/// Line-oriented front end for terminals
///
/// Chat output goes to stdout, errors to stderr.
#[derive(Debug, Default)]
pub struct TerminalPresentation;

impl TerminalPresentation {
    fn print(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}

impl Presentation for TerminalPresentation {
    fn render_line(&self, conversation: &ConversationKey, text: &str) {
        self.print(&format!("[{}] {}", conversation.title(), text));
    }

    fn show_roster(&self, names: &[String]) {
        if names.is_empty() {
            self.print("* Nobody else is online");
        } else {
            self.print(&format!("* Online: {}", names.join(", ")));
        }
    }

    fn notify_title(&self, text: &str) {
        self.print(&format!("== {} ==", text));
    }

    fn show_error(&self, message: &str) {
        eprintln!("! {}", message);
    }

    fn conversation_opened(&self, conversation: &ConversationKey) {
        self.print(&format!("* Opened {}", conversation.title()));
    }

    fn disconnected(&self, reason: &DisconnectReason) {
        self.print(&format!("* {}", reason));
    }
}
