//! Transport for the collection resource
//!
//! `PostTransport` is the seam between the coordinator and the network.
//! `HttpTransport` talks to a JSON REST resource:
//!
//! - `GET {base_url}/posts?_limit={n}` returns an array of posts
//! - `POST {base_url}/posts` with `{title, body}` echoes the created post
//!
//! Transport never retries and never caches.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::TransportError;
use crate::models::{Draft, Post};

/// User agent sent with every request
const USER_AGENT: &str = concat!("postsync/", env!("CARGO_PKG_VERSION"));

/// List and create operations against the collection resource
#[async_trait]
pub trait PostTransport: Send + Sync + 'static {
    /// Fetch at most `limit` posts
    async fn list(&self, limit: u32) -> Result<Vec<Post>, TransportError>;

    /// Create a post from a draft and return the server's copy
    async fn create(&self, draft: &Draft) -> Result<Post, TransportError>;
}

/// HTTP implementation of `PostTransport` backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the given base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a transport from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url, config.request_timeout())
    }

    /// Get the normalized base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn posts_url(&self) -> String {
        format!("{}/posts", self.base_url)
    }

    /// Check the status and decode the body of a response
    async fn decode<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let status = response.status();
        if !status.is_success() {
            warn!("{} answered HTTP {}", url, status.as_u16());
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| network_error(url, source))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Failed to decode response from {}: {}", url, e);
            TransportError::Decode {
                url: url.to_string(),
                details: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl PostTransport for HttpTransport {
    async fn list(&self, limit: u32) -> Result<Vec<Post>, TransportError> {
        let url = format!("{}?_limit={}", self.posts_url(), limit);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| network_error(&url, source))?;

        let mut posts: Vec<Post> = Self::decode(&url, response).await?;

        let limit = limit as usize;
        if posts.len() > limit {
            debug!(
                "Server returned {} posts for limit {}, truncating",
                posts.len(),
                limit
            );
            posts.truncate(limit);
        }

        Ok(posts)
    }

    async fn create(&self, draft: &Draft) -> Result<Post, TransportError> {
        let url = self.posts_url();
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(draft)
            .send()
            .await
            .map_err(|source| network_error(&url, source))?;

        Self::decode(&url, response).await
    }
}

fn network_error(url: &str, source: reqwest::Error) -> TransportError {
    warn!("Request to {} failed: {}", url, source);
    TransportError::Network {
        url: url.to_string(),
        source,
    }
}
