//! Terminal Chat Client - Entry Point
//!
//! Connects to the server, then reads commands and chat text from stdin.

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_client_v1::config::{DEFAULT_ADDRESS, DEFAULT_MAX_SEND_FAILURES, DEFAULT_USERNAME};
use chat_client_v1::presentation::NO_CONNECTION_TITLE;
use chat_client_v1::{ChatClient, ClientConfig, ConversationKey, Presentation, TerminalPresentation};

const HELP: &str = "\
Commands:
  /msg <user>   open or switch to a private conversation
  /room         switch back to the shared room
  /who          list connected users
  /connect [host:port [user]]
                reconnect, by default with the configured address and username
  /disconnect   leave the server
  /quit         disconnect and exit
Anything else is sent to the focused conversation.";

#[derive(Parser, Debug)]
#[command(name = "chat_client_v1")]
#[command(about = "Terminal client for a multi-party chat server")]
struct Cli {
    /// Server address as host:port
    #[arg(short, long, default_value = DEFAULT_ADDRESS)]
    addr: String,

    /// Username to claim ('@', '+', '-' and spaces are removed)
    #[arg(short, long, default_value = DEFAULT_USERNAME)]
    username: String,

    /// Consecutive failed sends before giving up on the connection
    #[arg(long, default_value_t = DEFAULT_MAX_SEND_FAILURES)]
    max_send_failures: usize,
}

/// One line of user input
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Msg(String),
    Room,
    Who,
    Connect(Option<String>, Option<String>),
    Disconnect,
    Quit,
    Help,
    Text(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (trimmed, ""),
        };

        match head {
            "/msg" => Command::Msg(rest.to_string()),
            "/room" => Command::Room,
            "/who" => Command::Who,
            "/connect" => {
                let mut args = rest.split_whitespace().map(str::to_string);
                Command::Connect(args.next(), args.next())
            }
            "/disconnect" => Command::Disconnect,
            "/quit" => Command::Quit,
            "/help" => Command::Help,
            _ => Command::Text(line.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_client_v1=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_client_v1=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_address(&cli.addr, &cli.username)?
        .with_max_send_failures(cli.max_send_failures);

    let presentation = Arc::new(TerminalPresentation);
    presentation.notify_title(NO_CONNECTION_TITLE);

    let mut client = ChatClient::new(presentation.clone(), config);
    info!("Connecting to {}", client.config().address());
    // Failures are already shown; the user can retry with /connect
    let _ = client.connect_configured().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Msg(peer) => {
                if !client.open_private(&peer).await {
                    presentation.show_error("Pick another connected user, e.g. /msg Bob");
                }
            }
            Command::Room => {
                client.focus(&ConversationKey::Room).await;
            }
            Command::Who => presentation.show_roster(&client.roster().await),
            Command::Connect(None, _) => {
                let _ = client.connect_configured().await;
            }
            Command::Connect(Some(addr), username) => {
                let username = username.unwrap_or_else(|| client.config().username.clone());
                let _ = client.connect_address(&addr, &username).await;
            }
            Command::Disconnect => client.request_disconnect().await,
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Text(text) => {
                // Send failures are reported through the presentation
                let _ = client.submit(&text).await;
            }
        }
    }

    client.request_disconnect().await;
    info!("Bye");
    Ok(())
}
