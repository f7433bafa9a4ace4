/// Constants and settings resolution for the extension

use serde::{Deserialize, Serialize};
use url::Url;

/// Endpoint used when no override is stored
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// chrome.storage.sync keys
pub const API_URL_KEY: &str = "apiUrl";
pub const API_KEY_KEY: &str = "apiKey";

/// chrome.storage.local key for the single-slot verification cache
pub const CACHE_KEY: &str = "lastVerification";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

pub const MENU_ITEM_ID: &str = "verifySelection";
pub const MENU_ITEM_TITLE: &str = "Verify with Polygraph";

// DOM contract shared by the content script and its tests
pub const CONTROL_CLASS: &str = "polygraph-verify-btn";
pub const RESULT_CLASS: &str = "polygraph-result-popup";
pub const ERROR_CLASS: &str = "polygraph-error";
pub const CLOSE_CLASS: &str = "polygraph-close-btn";
pub const STATE_ATTR: &str = "data-polygraph-state";

/// How long an inline error stays on the page
pub const ERROR_DISMISS_MS: u32 = 5_000;

/// Settings as they sit in the sync store; every key may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Settings after defaults are applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub api_url: String,
    pub api_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
        }
    }
}

impl Settings {
    pub fn verify_endpoint(&self) -> String {
        format!("{}/claims/verify", self.api_url)
    }

    /// The key to send, if one is configured
    pub fn api_key(&self) -> Option<&str> {
        Some(self.api_key.as_str()).filter(|key| !key.is_empty())
    }
}

impl StoredSettings {
    /// Apply defaults: stored override, else built-in endpoint, else empty key
    pub fn resolve(&self) -> Settings {
        let api_url = self
            .api_url
            .as_deref()
            .and_then(|raw| normalize_api_url(raw).ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        Settings { api_url, api_key }
    }
}

/// Validate a user-supplied endpoint and strip trailing slashes
pub fn normalize_api_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("API URL is empty".to_string());
    }

    let parsed = Url::parse(trimmed).map_err(|e| format!("Invalid API URL: {}", e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("Unsupported URL scheme: {}", parsed.scheme()));
    }
    // The endpoint path is appended to this base.
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err("API URL must not have a query or fragment".to_string());
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
