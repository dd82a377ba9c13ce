//! Client configuration loaded from environment variables.
//!
//! All settings have defaults pointing at a local development backend, so
//! the client starts with only `AUTH_TOKEN` set.

use causerie_shared::constants::{DEFAULT_API_BASE_URL, DEFAULT_SOCKET_URL};
use causerie_shared::UserRef;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// REST API base URL.
    /// Env: `API_BASE_URL`
    /// Default: `http://localhost:5000/api`
    pub api_base_url: String,

    /// Realtime channel URL.
    /// Env: `SOCKET_URL`
    /// Default: `ws://localhost:5000/ws`
    pub socket_url: String,

    /// Identity-provider credential presented to `/auth/verify` and as the
    /// bearer token on every REST call.
    /// Env: `AUTH_TOKEN`
    pub auth_token: String,

    /// Optional route target: a peer uid to start-or-get a direct
    /// conversation with on startup (the `/chat/<uid>` deep link).
    /// Env: `PEER_UID`
    pub peer: Option<UserRef>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            auth_token: String::new(),
            peer: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Ok(url) = std::env::var("SOCKET_URL") {
            config.socket_url = url;
        }
        if let Ok(token) = std::env::var("AUTH_TOKEN") {
            config.auth_token = token;
        }
        if let Ok(uid) = std::env::var("PEER_UID") {
            if !uid.is_empty() {
                config.peer = Some(UserRef(uid));
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.socket_url, DEFAULT_SOCKET_URL);
        assert!(config.peer.is_none());
    }
}
