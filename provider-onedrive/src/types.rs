//! OneDrive API request and response types

use serde::{Deserialize, Serialize};

/// Body of the Badger token request
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    #[serde(rename = "AppId")]
    pub app_id: &'a str,
}

/// Badger token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Share metadata (`/shares/u!<redeem>/driveitem`) response, reduced to the
/// field the download needs
#[derive(Debug, Clone, Deserialize)]
pub struct DriveItem {
    #[serde(rename = "@content.downloadUrl", default)]
    pub download_url: Option<String>,
}
