//! HTTP fetch abstraction.
//!
//! All network access goes through the [`Fetcher`] trait so tests can inject
//! in-memory fetchers. Futures are boxed to keep the trait object-safe; the
//! engine shares one fetcher across every in-flight tile load.

use bytes::Bytes;
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::debug;

/// Errors raised while fetching a manifest or tile payload.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },

    /// Connection, DNS, or protocol failure.
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// Test fetchers answer this for URLs they have no entry for.
    #[error("no resource at {url}")]
    NotFound { url: String },
}

/// Asynchronous GET with no interpretation of the body.
pub trait Fetcher: Send + Sync {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Bytes, FetchError>>;
}

/// Production fetcher backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<Bytes, FetchError>> {
        let url = url.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            debug!(url = %url, "fetching");
            let response = client.get(&url).send().await.map_err(|e| {
                FetchError::Transport {
                    url: url.clone(),
                    message: e.to_string(),
                }
            })?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url,
                });
            }
            response.bytes().await.map_err(|e| FetchError::Transport {
                url,
                message: e.to_string(),
            })
        })
    }
}

/// Base path of a resource URL: everything up to and including the final
/// slash. Relative content references resolve against this.
pub fn url_base(url: &str) -> String {
    match url.rfind('/') {
        Some(idx) => url[..=idx].to_string(),
        None => String::new(),
    }
}

/// Resolve a content reference against a base path. Absolute references
/// (scheme prefix present) pass through unchanged.
pub fn resolve_url(base: &str, reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        reference.to_string()
    } else {
        format!("{base}{reference}")
    }
}
