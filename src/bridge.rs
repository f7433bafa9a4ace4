/// JS bridge to the chrome.* extension APIs
///
/// The raw imports live in `/extension.js`; the wrappers here convert
/// between `JsValue` and the crate's serde types.

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::cache::CachedVerification;
use crate::config::{API_KEY_KEY, API_URL_KEY, CACHE_KEY, StoredSettings};
use crate::protocol::{Request, VerificationResponse};

#[wasm_bindgen(module = "/extension.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getSyncStorage(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setSyncStorage(items: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getLocalStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setLocalStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendRuntimeMessage(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getActiveTabUrl() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = setBadge)]
    pub(crate) fn set_badge(color: &str, text: &str);

    #[wasm_bindgen(js_name = createContextMenu)]
    pub(crate) fn create_context_menu(id: &str, title: &str);

    #[wasm_bindgen(js_name = onInstalled)]
    pub(crate) fn on_installed(callback: &js_sys::Function);

    #[wasm_bindgen(js_name = onContextMenuClicked)]
    pub(crate) fn on_context_menu_clicked(callback: &js_sys::Function);

    #[wasm_bindgen(js_name = onRuntimeMessage)]
    pub(crate) fn on_runtime_message(callback: &js_sys::Function);
}

/// Serialize to a plain JS object (not a `Map`)
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, String> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| format!("Failed to serialize: {:?}", e))
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, String> {
    serde_wasm_bindgen::from_value(value).map_err(|e| format!("Failed to parse: {:?}", e))
}

/// Best-effort human-readable text for a thrown JS value
pub fn js_error_message(error: &JsValue) -> String {
    if let Some(e) = error.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    error
        .as_string()
        .unwrap_or_else(|| format!("{:?}", error))
}

pub async fn read_settings() -> Result<StoredSettings, String> {
    let keys = to_js(&[API_URL_KEY, API_KEY_KEY])?;
    let stored = getSyncStorage(keys)
        .await
        .map_err(|e| format!("Failed to read settings: {}", js_error_message(&e)))?;

    if stored.is_null() || stored.is_undefined() {
        return Ok(StoredSettings::default());
    }
    from_js(stored)
}

pub async fn write_settings(settings: &StoredSettings) -> Result<(), String> {
    let items = to_js(settings)?;
    setSyncStorage(items)
        .await
        .map_err(|e| format!("Failed to save settings: {}", js_error_message(&e)))
}

pub async fn read_cache() -> Result<Option<CachedVerification>, String> {
    let stored = getLocalStorage(CACHE_KEY)
        .await
        .map_err(|e| format!("Failed to read cache: {}", js_error_message(&e)))?;

    if stored.is_null() || stored.is_undefined() {
        return Ok(None);
    }
    Ok(CachedVerification::from_stored(Some(from_js(stored)?)))
}

pub async fn write_cache(entry: &CachedVerification) -> Result<(), String> {
    let value = to_js(entry)?;
    setLocalStorage(CACHE_KEY, value)
        .await
        .map_err(|e| format!("Failed to write cache: {}", js_error_message(&e)))
}

/// Send a request to the background and wait for its reply
pub async fn send_request<T: DeserializeOwned>(request: &Request) -> Result<T, String> {
    let message = to_js(request)?;
    let reply = sendRuntimeMessage(message)
        .await
        .map_err(|e| js_error_message(&e))?;

    if reply.is_null() || reply.is_undefined() {
        return Err("No response from background".to_string());
    }
    from_js(reply)
}

pub async fn request_verification(text: &str, url: Option<String>) -> Result<VerificationResponse, String> {
    send_request(&Request::VerifyClaim {
        text: text.to_string(),
        url,
    })
    .await
}

pub async fn active_tab_url() -> Option<String> {
    match getActiveTabUrl().await {
        Ok(url) => url.as_string(),
        Err(e) => {
            log::warn!("Could not read active tab: {}", js_error_message(&e));
            None
        }
    }
}
