/// Social Media Polygraph - Chrome Extension for in-page claim verification
/// Built with Rust + WASM + Yew

pub mod analysis;
pub mod background;
pub mod badge;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod platform;
pub mod protocol;
pub mod ui;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export platform detection for JavaScript access
#[wasm_bindgen]
pub fn detect_platform(url: Option<String>) -> String {
    platform::detect_platform(url.as_deref()).as_str().to_string()
}

// Register the service worker's listeners
#[wasm_bindgen]
pub fn start_background() {
    background::chrome::install();
}

// Start injecting verify controls into the current page
#[wasm_bindgen]
pub fn start_content() {
    if let Err(e) = content::page::start() {
        log::error!("Content script failed to start: {}", bridge::js_error_message(&e));
    }
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}
