//! OneDrive share resolution
//!
//! Turns a resolved share link into the URL serving the file:
//!
//! 1. The `redeem` query parameter is taken from the link
//! 2. An anonymous Badger token is requested from the Badger identity endpoint
//! 3. The share metadata endpoint is queried with that token; its
//!    `@content.downloadUrl` field is the file URL
//!
//! Step 2 fails soft (no token) while step 3 fails hard, so a caller can tell
//! "nothing to authorize with" from "the share lookup broke".

use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::logging::redact_if_sensitive;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{OneDriveError, Result};
use crate::types::{DriveItem, TokenRequest, TokenResponse};

pub const BADGER_TOKEN_URL: &str = "https://api-badgerp.svc.ms/v1.0/token";

/// App id sent in the token request body.
const BODY_APP_ID: &str = "5cbed6ac-a083-4e14-b191-b4ba07653de2";

/// App id sent in the `AppId` header of the token request.
const HEADER_APP_ID: &str = "1141147648";

const SHARES_API_URL: &str = "https://my.microsoftpersonalcontent.com/_api/v2.0/shares/u!";

/// Short-lived bearer credential for the share metadata endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct BadgerToken(String);

impl BadgerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn authorization(&self) -> String {
        format!("Badger {}", self.0)
    }
}

impl fmt::Debug for BadgerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BadgerToken").field(&"[REDACTED]").finish()
    }
}

/// Performs the Badger token exchange and share metadata lookup.
#[derive(Clone)]
pub struct OneDriveTokenService {
    http_client: Arc<dyn HttpClient>,
}

impl OneDriveTokenService {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    /// Metadata endpoint URL for a share.
    pub fn share_item_url(redeem: &str) -> String {
        format!("{}{}/driveitem", SHARES_API_URL, redeem)
    }

    /// Extract the `redeem` share token from a resolved share link.
    pub fn extract_redeem(url: &str) -> Result<String> {
        let parsed = Url::parse(url).ok();
        if parsed.as_ref().and_then(Url::query).is_none() {
            return Err(OneDriveError::InvalidUrl(
                "Wrong url format. Missing query part.".to_string(),
            ));
        }

        parsed
            .iter()
            .flat_map(Url::query_pairs)
            .find(|(key, _)| key == "redeem")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| {
                OneDriveError::InvalidUrl("URL does not contain a redeem parameter.".to_string())
            })
    }

    /// Request an anonymous Badger token.
    ///
    /// Any failure (transport, status, body) yields `None`.
    #[instrument(skip(self))]
    pub async fn badger_token(&self) -> Option<BadgerToken> {
        let request = HttpRequest::post(BADGER_TOKEN_URL)
            .header("AppId", HEADER_APP_ID)
            .json(&TokenRequest {
                app_id: BODY_APP_ID,
            })
            .ok()?;

        let response = match self.http_client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Badger token request failed");
                return None;
            }
        };

        if !response.is_success() {
            warn!(status = response.status, "Badger token request rejected");
            return None;
        }

        match response.json::<TokenResponse>() {
            Ok(TokenResponse {
                token: Some(token),
            }) if !token.is_empty() => {
                debug!(token = %redact_if_sensitive("token", &token), "Obtained Badger token");
                Some(BadgerToken(token))
            }
            Ok(_) => {
                warn!("Badger token response carried no token");
                None
            }
            Err(e) => {
                warn!(error = %e, "Badger token response could not be decoded");
                None
            }
        }
    }

    /// Look up the download URL of a share.
    ///
    /// `Ok(None)` means the share item has no download URL; any request or
    /// decoding failure is an error.
    #[instrument(skip(self, redeem, token))]
    pub async fn share_download_url(
        &self,
        redeem: &str,
        token: &BadgerToken,
    ) -> Result<Option<String>> {
        let request = HttpRequest::get(Self::share_item_url(redeem))
            .header("Authorization", token.authorization())
            .header("Prefer", "autoredeem");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(OneDriveError::ShareFetch)?;

        if !response.is_success() {
            return Err(OneDriveError::ShareFetchStatus(response.status));
        }

        let item: DriveItem = response.json().map_err(OneDriveError::ShareFetch)?;
        Ok(item.download_url)
    }

    /// Resolve a share link to the URL serving its file.
    ///
    /// Returns `Ok(None)` when no Badger token could be obtained or the share
    /// item carries no download URL.
    pub async fn download_url(&self, url: &str) -> Result<Option<String>> {
        let redeem = Self::extract_redeem(url)?;
        debug!(redeem = %redact_if_sensitive("redeem", &redeem), "Extracted share token");

        let Some(token) = self.badger_token().await else {
            return Ok(None);
        };

        self.share_download_url(&redeem, &token).await
    }
}
