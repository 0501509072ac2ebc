use url::Url;

use crate::error::ConfigError;

/// Where the host application lives and how to talk to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Path prefix of the host application (e.g. `/k`)
    pub path_prefix: String,
    /// Set when the editor runs inside a guest space
    pub guest_space_id: Option<u64>,
    /// Display locale, passed to the host API as `_lc`
    pub locale: String,
    /// Page URL, passed to the host API as `_ref`
    pub referer: Option<Url>,
    pub file_icon_base_url: String,
    /// Width requested for image thumbnails of fresh uploads
    pub thumbnail_width: u32,
}

impl HostConfig {
    pub const DEFAULT_PATH_PREFIX: &'static str = "/k";
    pub const DEFAULT_LOCALE: &'static str = "en";
    pub const DEFAULT_FILE_ICON_BASE_URL: &'static str =
        "https://static.cybozu.com/contents/k/image/file";
    pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 250;

    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `THREADMARK_PATH_PREFIX`: host path prefix (default: `/k`)
    /// - `THREADMARK_GUEST_SPACE_ID`: numeric guest space id (default: none)
    /// - `THREADMARK_LOCALE`: display locale (default: `en`)
    /// - `THREADMARK_REFERER`: page URL sent along with API calls (default: none)
    /// - `THREADMARK_FILE_ICON_BASE_URL`: base URL of file type icons
    /// - `THREADMARK_THUMBNAIL_WIDTH`: thumbnail width in pixels (default: 250)
    pub fn from_env() -> Result<Self, ConfigError> {
        let path_prefix = std::env::var("THREADMARK_PATH_PREFIX")
            .unwrap_or_else(|_| Self::DEFAULT_PATH_PREFIX.to_string());

        let guest_space_id = match std::env::var("THREADMARK_GUEST_SPACE_ID") {
            Ok(raw) => Some(raw.parse().map_err(|e| ConfigError::Invalid {
                var: "THREADMARK_GUEST_SPACE_ID",
                message: format!("{raw:?}: {e}"),
            })?),
            Err(_) => None,
        };

        let locale =
            std::env::var("THREADMARK_LOCALE").unwrap_or_else(|_| Self::DEFAULT_LOCALE.to_string());

        let referer = match std::env::var("THREADMARK_REFERER") {
            Ok(raw) => Some(Url::parse(&raw).map_err(|e| ConfigError::UrlParse {
                url: raw.clone(),
                message: e.to_string(),
            })?),
            Err(_) => None,
        };

        let file_icon_base_url = std::env::var("THREADMARK_FILE_ICON_BASE_URL")
            .unwrap_or_else(|_| Self::DEFAULT_FILE_ICON_BASE_URL.to_string());

        let thumbnail_width = match std::env::var("THREADMARK_THUMBNAIL_WIDTH") {
            Ok(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                var: "THREADMARK_THUMBNAIL_WIDTH",
                message: format!("{raw:?}: {e}"),
            })?,
            Err(_) => Self::DEFAULT_THUMBNAIL_WIDTH,
        };

        Ok(Self {
            path_prefix,
            guest_space_id,
            locale,
            referer,
            file_icon_base_url,
            thumbnail_width,
        })
    }

    /// Prefix of the host's REST API, which moves under the guest space
    /// when there is one.
    pub fn api_prefix(&self) -> String {
        let prefix = self.path_prefix.trim_end_matches('/');
        match self.guest_space_id {
            Some(space) => format!("{prefix}/guest/{space}/api"),
            None => format!("{prefix}/api"),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            path_prefix: Self::DEFAULT_PATH_PREFIX.to_string(),
            guest_space_id: None,
            locale: Self::DEFAULT_LOCALE.to_string(),
            referer: None,
            file_icon_base_url: Self::DEFAULT_FILE_ICON_BASE_URL.to_string(),
            thumbnail_width: Self::DEFAULT_THUMBNAIL_WIDTH,
        }
    }
}
