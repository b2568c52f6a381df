//! Outbound HTTP transport used to reach the CAS server.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{ConfigError, TransportError};

/// Issues the validation GET and returns the response body.
///
/// Timeouts and retries are the implementation's business; the client calls
/// `get` exactly once per validation and never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        (**self).get(url).await
    }
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Transport(e.to_string()))?;

        Ok(Self { http_client })
    }

    /// Use an existing client, e.g. one with custom TLS roots or a proxy.
    pub fn from_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        debug!(host = ?url.host_str(), path = %url.path(), "Sending validation request");

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(body.to_vec())
    }
}
