//! Reqwest-backed [`RestClient`] implementation.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{Error, Result};

use super::{Method, RestClient, RestResponse};

// ============================================================================
// HttpClient
// ============================================================================

/// Default HTTP client for theme lifecycle calls.
///
/// Thin wrapper over a shared [`reqwest::Client`]; connection pooling is
/// handled by reqwest itself.
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Creates a new client.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RestClient for HttpClient {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<RestResponse> {
        let request_method = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut request = self.client.request(request_method, url);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "text/plain").body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::rest_call(0, e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::rest_call(status, e.to_string()))?;

        debug!(method = method.as_str(), url, status, "REST call completed");

        Ok(RestResponse { status, body })
    }
}
