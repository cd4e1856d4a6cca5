//! Client configuration
//!
//! Connection target, desired username and send-failure tolerance.

use crate::error::ConfigError;

/// Default server host
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port
pub const DEFAULT_PORT: u16 = 9020;

/// Default `host:port` as typed in the login form
pub const DEFAULT_ADDRESS: &str = "localhost:9020";

/// Name offered when the user does not pick one
pub const DEFAULT_USERNAME: &str = "Anonymous";

/// Consecutive failed writes before the client gives up on a session
pub const DEFAULT_MAX_SEND_FAILURES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Raw username; filtered when the session is opened
    pub username: String,
    /// Disconnect after this many consecutive write failures (at least 1)
    pub max_send_failures: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: DEFAULT_USERNAME.to_string(),
            max_send_failures: DEFAULT_MAX_SEND_FAILURES,
        }
    }
}

impl ClientConfig {
    /// Build a config from a `host:port` string and a username
    pub fn from_address(addr: &str, username: &str) -> Result<Self, ConfigError> {
        let (host, port) = parse_address(addr)?;
        Ok(Self {
            host,
            port,
            username: username.to_string(),
            ..Self::default()
        })
    }

    pub fn with_max_send_failures(mut self, max: usize) -> Self {
        self.max_send_failures = max.max(1);
        self
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split `host:port`
///
/// An empty host falls back to [`DEFAULT_HOST`].
pub fn parse_address(addr: &str) -> Result<(String, u16), ConfigError> {
    let addr = addr.trim();
    let Some((host, port)) = addr.rsplit_once(':') else {
        return Err(ConfigError::MissingPort(addr.to_string()));
    };

    if port.is_empty() {
        return Err(ConfigError::MissingPort(addr.to_string()));
    }

    let port: u16 = port
        .parse()
        .map_err(|_| ConfigError::InvalidPort(port.to_string()))?;

    let host = if host.is_empty() { DEFAULT_HOST } else { host };
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_login_form() {
        let config = ClientConfig::default();
        assert_eq!(config.address(), DEFAULT_ADDRESS);
        assert_eq!(config.username, "Anonymous");
        assert_eq!(config.max_send_failures, 3);
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("localhost:9020").unwrap(),
            ("localhost".to_string(), 9020)
        );
        assert_eq!(
            parse_address(" 10.0.0.7:80 ").unwrap(),
            ("10.0.0.7".to_string(), 80)
        );
        assert_eq!(parse_address(":9021").unwrap(), ("localhost".to_string(), 9021));
    }

    #[test]
    fn test_parse_address_errors() {
        assert_eq!(
            parse_address("localhost"),
            Err(ConfigError::MissingPort("localhost".to_string()))
        );
        assert_eq!(
            parse_address("localhost:"),
            Err(ConfigError::MissingPort("localhost:".to_string()))
        );
        assert_eq!(
            parse_address("localhost:chat"),
            Err(ConfigError::InvalidPort("chat".to_string()))
        );
        assert_eq!(
            parse_address("localhost:70000"),
            Err(ConfigError::InvalidPort("70000".to_string()))
        );
    }

    #[test]
    fn test_from_address_and_failure_floor() {
        let config = ClientConfig::from_address("chat.local:9100", "Amy")
            .unwrap()
            .with_max_send_failures(0);
        assert_eq!(config.host, "chat.local");
        assert_eq!(config.port, 9100);
        assert_eq!(config.username, "Amy");
        assert_eq!(config.max_send_failures, 1);
    }
}
