/// Service-worker wiring: the real host and the chrome.* listeners

use std::rc::Rc;

use gloo_net::http::Request as HttpRequest;
use js_sys::Reflect;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use super::{Coordinator, ExtensionHost, HttpReply};
use crate::badge::BadgeStyle;
use crate::bridge;
use crate::cache::CachedVerification;
use crate::config::{API_KEY_HEADER, MENU_ITEM_ID, MENU_ITEM_TITLE, StoredSettings};
use crate::protocol::{MenuClick, Request, reply_channel};

/// User-facing text for a failed fetch
///
/// A rejected `fetch` carries its reason in `message` ("Failed to fetch");
/// the `Display` of the JS variant would prefix the error name.
pub fn transport_error_message(error: gloo_net::Error) -> String {
    match error {
        gloo_net::Error::JsError(js) => js.message,
        other => other.to_string(),
    }
}

/// chrome.storage + fetch + chrome.action
pub struct ChromeHost;

impl ExtensionHost for ChromeHost {
    async fn load_settings(&self) -> Result<StoredSettings, String> {
        bridge::read_settings().await
    }

    async fn post_json(
        &self,
        url: &str,
        api_key: Option<&str>,
        body: &Value,
    ) -> Result<HttpReply, String> {
        let mut builder = HttpRequest::post(url);
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder
            .json(body)
            .map_err(transport_error_message)?
            .send()
            .await
            .map_err(transport_error_message)?;

        let status = response.status();
        if !response.ok() {
            return Ok(HttpReply {
                status,
                body: String::new(),
            });
        }
        let body = response.text().await.map_err(transport_error_message)?;

        Ok(HttpReply { status, body })
    }

    async fn write_cache(&self, entry: &CachedVerification) -> Result<(), String> {
        bridge::write_cache(entry).await
    }

    fn set_badge(&self, badge: BadgeStyle) {
        bridge::set_badge(badge.color, badge.text);
    }

    fn now(&self) -> f64 {
        js_sys::Date::now()
    }
}

thread_local! {
    static COORDINATOR: Rc<Coordinator<ChromeHost>> = Rc::new(Coordinator::new(ChromeHost));
}

fn coordinator() -> Rc<Coordinator<ChromeHost>> {
    COORDINATOR.with(Rc::clone)
}

/// Register every background listener; call once per worker start
pub fn install() {
    install_context_menu();
    install_message_listener();
    log::info!("Background coordinator ready");
}

fn install_context_menu() {
    let on_installed = Closure::wrap(Box::new(move |_details: JsValue| {
        bridge::create_context_menu(MENU_ITEM_ID, MENU_ITEM_TITLE);
        log::info!("Context menu registered");
    }) as Box<dyn FnMut(JsValue)>);
    bridge::on_installed(on_installed.as_ref().unchecked_ref());
    on_installed.forget();

    let on_clicked = Closure::wrap(Box::new(move |info: JsValue, tab: JsValue| {
        let mut click: MenuClick = match bridge::from_js(info) {
            Ok(click) => click,
            Err(e) => {
                log::warn!("Unreadable context menu click: {}", e);
                return;
            }
        };
        click.tab_url = Reflect::get(&tab, &"url".into())
            .ok()
            .and_then(|url| url.as_string());

        let coordinator = coordinator();
        spawn_local(async move {
            match coordinator.on_menu_click(click).await {
                Some(response) if response.success => {
                    log::info!("Context menu verification finished")
                }
                Some(response) => log::warn!(
                    "Context menu verification failed: {}",
                    response.error.unwrap_or_default()
                ),
                None => {}
            }
        });
    }) as Box<dyn FnMut(JsValue, JsValue)>);
    bridge::on_context_menu_clicked(on_clicked.as_ref().unchecked_ref());
    on_clicked.forget();
}

fn install_message_listener() {
    // Returning `true` keeps sendResponse usable after this callback returns.
    let on_message = Closure::wrap(Box::new(
        move |message: JsValue, _sender: JsValue, send_response: js_sys::Function| -> JsValue {
            let request: Request = match bridge::from_js(message) {
                Ok(request) => request,
                Err(_) => return JsValue::FALSE,
            };

            let (slot, pending) = reply_channel();
            let coordinator = coordinator();
            spawn_local(async move {
                coordinator.serve(request, slot).await;
            });
            spawn_local(async move {
                let Some(reply) = pending.await else {
                    log::error!("Request finished without a reply");
                    return;
                };
                match bridge::to_js(&reply) {
                    Ok(value) => {
                        // Throws only when the requester is gone; nothing left to do then.
                        let _ = send_response.call1(&JsValue::UNDEFINED, &value);
                    }
                    Err(e) => log::error!("Could not encode reply: {}", e),
                }
            });

            JsValue::TRUE
        },
    )
        as Box<dyn FnMut(JsValue, JsValue, js_sys::Function) -> JsValue>);
    bridge::on_runtime_message(on_message.as_ref().unchecked_ref());
    on_message.forget();
}
