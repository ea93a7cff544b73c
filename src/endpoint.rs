//! Endpoint resolution for a theme's preview channel and REST routes.
//!
//! A theme identity resolves to exactly one channel address and one set of
//! REST routes. Both are computed once and immutable afterwards, so the
//! rest of the crate never does string surgery on URLs.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// ConnectionEndpoint
// ============================================================================

/// Resolved address of a theme's preview channel.
///
/// Immutable once constructed. The channel is only opened after the
/// corresponding REST start call has succeeded.
///
/// # Example
///
/// ```
/// use theme_preview::ConnectionEndpoint;
///
/// let endpoint = ConnectionEndpoint::new("127.0.0.1:8080", "midnight", false).unwrap();
/// assert_eq!(
///     endpoint.url().as_str(),
///     "ws://127.0.0.1:8080/themes/midnight/preview/ws"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEndpoint {
    /// Fully resolved channel URL.
    url: Url,
    /// Theme this endpoint belongs to.
    theme: String,
}

impl ConnectionEndpoint {
    /// Resolves the channel endpoint for a theme.
    ///
    /// # Arguments
    ///
    /// * `host` - Host (and optional port) of the preview server
    /// * `theme` - Theme name, unique per workspace
    /// * `secure` - Use `wss` instead of `ws`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host or theme name does not form
    /// a valid URL.
    pub fn new(host: &str, theme: &str, secure: bool) -> Result<Self> {
        if theme.is_empty() {
            return Err(Error::config("theme name must not be empty"));
        }

        let scheme = if secure { "wss" } else { "ws" };
        let raw = format!("{scheme}://{host}/themes/{theme}/preview/ws");
        let url = Url::parse(&raw)
            .map_err(|e| Error::config(format!("invalid channel endpoint {raw}: {e}")))?;

        Ok(Self {
            url,
            theme: theme.to_string(),
        })
    }

    /// Returns the resolved channel URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the theme name this endpoint was resolved from.
    #[inline]
    #[must_use]
    pub fn theme(&self) -> &str {
        &self.theme
    }
}

// ============================================================================
// ThemeRoutes
// ============================================================================

/// REST routes for one theme.
///
/// | Route | Method | Purpose |
/// |-------|--------|---------|
/// | `/themes/{name}` | GET | Fetch theme metadata |
/// | `/themes/{name}/css` | GET / PUT | Read / write CSS source |
/// | `/themes/{name}/preview` | POST / DELETE | Start / stop preview session |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeRoutes {
    theme_url: Url,
    css_url: Url,
    preview_url: Url,
}

impl ThemeRoutes {
    /// Resolves the REST routes for a theme.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host or theme name does not form
    /// valid URLs.
    pub fn new(host: &str, theme: &str, secure: bool) -> Result<Self> {
        if theme.is_empty() {
            return Err(Error::config("theme name must not be empty"));
        }

        let scheme = if secure { "https" } else { "http" };
        let parse = |path: &str| {
            let raw = format!("{scheme}://{host}/themes/{theme}{path}");
            Url::parse(&raw).map_err(|e| Error::config(format!("invalid REST route {raw}: {e}")))
        };

        Ok(Self {
            theme_url: parse("")?,
            css_url: parse("/css")?,
            preview_url: parse("/preview")?,
        })
    }

    /// Theme metadata route.
    #[inline]
    #[must_use]
    pub fn theme_url(&self) -> &str {
        self.theme_url.as_str()
    }

    /// CSS source route.
    #[inline]
    #[must_use]
    pub fn css_url(&self) -> &str {
        self.css_url.as_str()
    }

    /// Preview lifecycle route.
    #[inline]
    #[must_use]
    pub fn preview_url(&self) -> &str {
        self.preview_url.as_str()
    }
}

// ============================================================================
// Tests
// ============================================================================
