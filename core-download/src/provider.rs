use std::fmt;

/// Storage backend a URL was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Any http(s) URL assumed to point straight at the file
    Direct,
    /// `drive.google.com/file/d/<id>` share links
    GoogleDrive,
    /// `1drv.ms` short links and `onedrive.live.com` links carrying `redeem=`
    OneDrive,
}

impl Provider {
    /// Short identifier used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Direct => "direct",
            Provider::GoogleDrive => "google_drive",
            Provider::OneDrive => "onedrive",
        }
    }

    /// Message prefix for failures attributed to this provider.
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Provider::Direct => "Direct link download failed",
            Provider::GoogleDrive => "Failed download from Google Drive",
            Provider::OneDrive => "Failed download from OneDrive",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Direct => "Direct link",
            Provider::GoogleDrive => "Google Drive",
            Provider::OneDrive => "OneDrive",
        };
        f.write_str(name)
    }
}
