// API client module: a small blocking HTTP client that talks to a Hecate
// server. Every command issues exactly one request through it; this module
// owns URL building, the basic-auth header and the status classification
// (200 vs. anything else vs. transport failure).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthContext;
use crate::config::ClientConfig;
use crate::error::{HecateError, Result};

/// Shared flag used to abort an in-flight transfer.
///
/// Cloning yields a handle to the same flag, so an embedder can hand one
/// clone to another thread and cancel a clone that is still streaming.
/// The dispatcher clears the flag when an invocation ends, so a cancel
/// never outlives the call it stopped.
///
/// Streaming bodies check the flag between reads only. A read blocked on
/// a stalled server is not interrupted; set a timeout in [`ClientConfig`]
/// to bound it. Request/response calls (`send`, `get_json`) never check it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag. Called by the dispatcher after every invocation.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Blocking client bound to one server.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    cancel: CancelToken,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = config.base_url();
        let base_url = Url::parse(&base)
            .map_err(|e| HecateError::Config(format!("invalid server url {base}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(HecateError::Config(format!("invalid server url {base}")));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(HecateError::Transport)?;

        Ok(ApiClient {
            client,
            base_url,
            cancel: CancelToken::new(),
        })
    }

    /// Create an ApiClient configured from the `HECATE_*` environment
    /// variables, see [`ClientConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::from_env())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Build the Authorization header for the current credentials, if any.
    fn auth_headers(auth: &AuthContext) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(creds) = auth.credentials() {
            let token = base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", creds.username(), creds.secret()));
            let mut val = HeaderValue::from_str(&format!("Basic {token}"))
                .map_err(|e| HecateError::Config(format!("invalid credentials: {e}")))?;
            val.set_sensitive(true);
            headers.insert(AUTHORIZATION, val);
        }
        Ok(headers)
    }

    /// Start a request carrying whatever credentials the context holds.
    pub fn request(&self, method: Method, url: Url, auth: &AuthContext) -> Result<RequestBuilder> {
        debug!(%method, %url, authenticated = auth.has_credentials(), "request");
        Ok(self
            .client
            .request(method, url)
            .headers(Self::auth_headers(auth)?))
    }

    /// Start a request that never carries credentials.
    pub fn anonymous(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "request");
        self.client.request(method, url)
    }

    /// Send a request and insist on a 200. Only the status line and headers
    /// have been read when this returns, so streaming callers can still pipe
    /// the body.
    pub fn send(&self, req: RequestBuilder) -> Result<Response> {
        let res = req.send()?;
        Self::expect_ok(res)
    }

    /// Turn any non-200 response into a `Server` error carrying the body.
    pub fn expect_ok(res: Response) -> Result<Response> {
        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().unwrap_or_default();
            debug!(status = status.as_u16(), "server rejected request");
            return Err(HecateError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res)
    }

    /// GET a path and decode the JSON body.
    pub fn get_json(&self, segments: &[&str], auth: &AuthContext) -> Result<Value> {
        let req = self.request(Method::GET, self.url(segments), auth)?;
        let res = self.send(req)?;
        Ok(res.json()?)
    }
}
