// Client configuration: where the server lives and which credentials, if
// any, to start with. The binary fills this from clap (with env fallbacks);
// library users can call `ClientConfig::from_env` or build one directly.

use std::time::Duration;

use crate::auth::Credentials;

pub const DEFAULT_URL: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host name, optionally with a scheme (`http://` is assumed otherwise).
    pub url: String,
    pub port: u16,
    /// Total request timeout. `None` leaves long clone transfers unbounded.
    pub timeout: Option<Duration>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            port: DEFAULT_PORT,
            timeout: None,
            username: None,
            password: None,
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, port: u16) -> Self {
        Self {
            url: url.into(),
            port,
            ..Self::default()
        }
    }

    /// Read `HECATE_URL`, `HECATE_PORT`, `HECATE_TIMEOUT`, `HECATE_USERNAME`
    /// and `HECATE_PASSWORD`, falling back to the defaults.
    pub fn from_env() -> Self {
        let port = std::env::var("HECATE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let timeout = std::env::var("HECATE_TIMEOUT")
            .ok()
            .and_then(|t| t.parse().ok())
            .map(Duration::from_secs);

        Self {
            url: std::env::var("HECATE_URL").unwrap_or_else(|_| DEFAULT_URL.into()),
            port,
            timeout,
            username: std::env::var("HECATE_USERNAME").ok(),
            password: std::env::var("HECATE_PASSWORD").ok(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Base URL of the server, e.g. `http://localhost:8000`.
    pub fn base_url(&self) -> String {
        let url = self.url.trim_end_matches('/');
        let (scheme, rest) = match url.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => ("http", url),
        };
        let (host, path) = match rest.find('/') {
            Some(i) => rest.split_at(i),
            None => (rest, ""),
        };
        if host.contains(':') {
            format!("{scheme}://{host}{path}")
        } else {
            format!("{scheme}://{host}:{}{path}", self.port)
        }
    }

    /// Credentials are only usable when both halves are present.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) if !u.is_empty() => Some(Credentials::new(u.clone(), p.clone())),
            _ => None,
        }
    }
}
