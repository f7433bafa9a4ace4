/// Platform detection for pages the extension runs on
use serde::{Deserialize, Serialize};

/// A social platform recognized by the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Facebook,
    Instagram,
    Tiktok,
    Reddit,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Reddit => "reddit",
            Platform::Unknown => "unknown",
        }
    }
}

/// Match order matters: the first row whose needle occurs wins.
const PLATFORM_NEEDLES: &[(&[&str], Platform)] = &[
    (&["twitter.com", "x.com"], Platform::Twitter),
    (&["facebook.com"], Platform::Facebook),
    (&["instagram.com"], Platform::Instagram),
    (&["tiktok.com"], Platform::Tiktok),
    (&["reddit.com"], Platform::Reddit),
];

/// Map a page location (full URL or bare hostname) to a platform
///
/// Matching is a case-insensitive substring test against a fixed priority
/// list, so the background (which sees full URLs) and the content script
/// (which sees `location.hostname`) agree on the result.
///
/// Examples:
/// - https://x.com/user/status/1 → twitter
/// - www.reddit.com → reddit
/// - None → unknown
pub fn detect_platform(location: Option<&str>) -> Platform {
    let Some(location) = location else {
        return Platform::Unknown;
    };

    let location = location.to_lowercase();

    PLATFORM_NEEDLES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| location.contains(needle)))
        .map(|(_, platform)| *platform)
        .unwrap_or(Platform::Unknown)
}
