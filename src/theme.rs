//! Theme metadata and CSS source access.
//!
//! A theme is identified by name, unique per workspace. Metadata is
//! fetched on editor entry and mutated only through explicit saves; this
//! subsystem never deletes themes.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::endpoint::ThemeRoutes;
use crate::error::Result;
use crate::rest::{Method, RestClient};

// ============================================================================
// ThemeConfig
// ============================================================================

/// Author-provided theme attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Theme author.
    #[serde(default)]
    pub author: String,
    /// Theme version.
    #[serde(default)]
    pub version: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

// ============================================================================
// Theme
// ============================================================================

/// A theme as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Unique theme name.
    pub name: String,

    /// Theme attributes.
    #[serde(default)]
    pub config: ThemeConfig,

    /// On-disk path on the server side.
    #[serde(default)]
    pub path: String,
}

impl Theme {
    /// Fetches theme metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RestCall`](crate::Error::RestCall) for non-2xx
    /// statuses or network failures, [`Error::Json`](crate::Error::Json)
    /// if the body is not a theme document.
    pub async fn fetch(rest: &dyn RestClient, routes: &ThemeRoutes) -> Result<Self> {
        let response = rest
            .request(Method::Get, routes.theme_url(), None)
            .await?
            .into_result()?;

        let theme: Self = response.json()?;
        debug!(theme = %theme.name, "Fetched theme metadata");
        Ok(theme)
    }

    /// Fetches the theme's CSS source as plain text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RestCall`](crate::Error::RestCall) for non-2xx
    /// statuses or network failures.
    pub async fn fetch_css(rest: &dyn RestClient, routes: &ThemeRoutes) -> Result<String> {
        let response = rest
            .request(Method::Get, routes.css_url(), None)
            .await?
            .into_result()?;

        Ok(response.body)
    }
}

// ============================================================================
// Tests
// ============================================================================
