//! REST client capability.
//!
//! The preview lifecycle is driven by plain REST calls (start, stop,
//! fetch, save). The HTTP stack is an injected capability behind the
//! [`RestClient`] trait so the session controller can be tested with a
//! scripted fake; [`HttpClient`] is the reqwest-backed default.
//!
//! Network-level failures surface as [`Error::RestCall`](crate::Error)
//! with status 0; non-2xx responses are returned as ordinary
//! [`RestResponse`] values and promoted to errors by
//! [`RestResponse::into_result`].

// ============================================================================
// Submodules
// ============================================================================

/// Default reqwest-backed client.
pub mod http;

// ============================================================================
// Re-exports
// ============================================================================

pub use http::HttpClient;

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

// ============================================================================
// Method
// ============================================================================

/// HTTP method subset used by the theme routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Fetch metadata or CSS source.
    Get,
    /// Start a preview session.
    Post,
    /// Persist CSS source.
    Put,
    /// Stop a preview session.
    Delete,
}

impl Method {
    /// Returns the method as its wire name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

// ============================================================================
// RestResponse
// ============================================================================

/// Response from a REST call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl RestResponse {
    /// Returns `true` for 2xx statuses.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Promotes a non-2xx response to [`Error::RestCall`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::RestCall`] carrying the status and body when the
    /// status is outside the 2xx range.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::rest_call(self.status, self.body))
        }
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

// ============================================================================
// RestClient
// ============================================================================

/// Injected HTTP capability.
///
/// Implementations must report transport-level failures as errors and
/// hand back non-2xx responses unchanged; status interpretation belongs
/// to the caller.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Performs a request and returns the response.
    ///
    /// A body, when present, is sent as `text/plain` (the CSS save path
    /// is the only call that carries one).
    ///
    /// # Errors
    ///
    /// Returns [`Error::RestCall`] with status 0 when the request never
    /// produced a response.
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<RestResponse>;
}

// ============================================================================
// Tests
// ============================================================================
