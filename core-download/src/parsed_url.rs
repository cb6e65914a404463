//! Normalized view of an input URL.

use url::Url;

use crate::error::{DownloadError, Result};

/// An absolute http(s) URL split into the parts provider classification
/// looks at. Scheme and host are lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    scheme: String,
    host: String,
    path: String,
    query: Option<String>,
}

impl ParsedUrl {
    /// Parse and validate a raw URL.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] when the input is empty, is not
    /// an absolute URL, or uses a scheme other than `http`/`https`.
    ///
    /// Input is taken literally: surrounding or embedded whitespace and a
    /// scheme not followed by `://` are rejected even though a lenient URL
    /// parser would repair them.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(DownloadError::InvalidUrl("URL is empty".to_string()));
        }

        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(not_valid());
        }

        let url = Url::parse(raw).map_err(|_| not_valid())?;

        let scheme = url.scheme().to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(DownloadError::InvalidUrl("Invalid URL scheme".to_string()));
        }

        if !raw
            .get(scheme.len()..)
            .is_some_and(|rest| rest.starts_with("://"))
        {
            return Err(not_valid());
        }

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
            _ => return Err(not_valid()),
        };

        Ok(Self {
            scheme,
            host,
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

fn not_valid() -> DownloadError {
    DownloadError::InvalidUrl("URL is not valid".to_string())
}
