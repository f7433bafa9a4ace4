/// Background coordinator: the only context that talks to the API
///
/// Every verification, whether it comes from a content script, the popup
/// or the context menu, goes through [`Coordinator::verify_claim`]. The
/// browser specifics sit behind [`ExtensionHost`] so the flow can run
/// against an in-memory host in tests.

pub mod chrome;

use std::cell::Cell;

use serde::Serialize;
use serde_json::Value;

use crate::analysis::verdict_of;
use crate::badge::{BadgeStyle, NEUTRAL_BADGE, badge_for};
use crate::cache::CachedVerification;
use crate::config::{MENU_ITEM_ID, Settings, StoredSettings};
use crate::error::VerifyError;
use crate::platform::{Platform, detect_platform};
use crate::protocol::{MenuClick, Reply, ReplySlot, Request, VerificationResponse};

/// Raw HTTP outcome, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Browser services the coordinator depends on
#[allow(async_fn_in_trait)]
pub trait ExtensionHost {
    async fn load_settings(&self) -> Result<StoredSettings, String>;

    /// POST a JSON body; `Err` only for transport failures
    ///
    /// The body is read only for 2xx replies and is empty otherwise.
    async fn post_json(
        &self,
        url: &str,
        api_key: Option<&str>,
        body: &Value,
    ) -> Result<HttpReply, String>;

    async fn write_cache(&self, entry: &CachedVerification) -> Result<(), String>;

    fn set_badge(&self, badge: BadgeStyle);

    /// Milliseconds since the epoch
    fn now(&self) -> f64;
}

/// Body of `POST <apiUrl>/claims/verify`
#[derive(Debug, Clone, Serialize)]
struct VerifyBody<'a> {
    text: &'a str,
    url: Option<&'a str>,
    platform: Platform,
}

/// Process-wide state owned by the coordinator
///
/// Initialized with the built-in default settings and a neutral badge;
/// lives until the service worker exits.
#[derive(Debug)]
pub struct CoordinatorState {
    defaults: Settings,
    badge: Cell<BadgeStyle>,
}

impl Default for CoordinatorState {
    fn default() -> Self {
        CoordinatorState {
            defaults: Settings::default(),
            badge: Cell::new(NEUTRAL_BADGE),
        }
    }
}

pub struct Coordinator<H> {
    host: H,
    state: CoordinatorState,
}

impl<H: ExtensionHost> Coordinator<H> {
    pub fn new(host: H) -> Self {
        Coordinator {
            host,
            state: CoordinatorState::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Badge most recently applied, across all requests
    pub fn current_badge(&self) -> BadgeStyle {
        self.state.badge.get()
    }

    /// Stored override, else defaults; a store failure is never surfaced
    pub async fn resolve_settings(&self) -> Settings {
        match self.host.load_settings().await {
            Ok(stored) => stored.resolve(),
            Err(e) => {
                log::warn!("Settings unavailable, using defaults: {}", e);
                self.state.defaults.clone()
            }
        }
    }

    /// Verify one claim: exactly one API call, cache and badge on success
    pub async fn verify_claim(&self, text: &str, url: Option<&str>) -> Result<Value, VerifyError> {
        if text.trim().is_empty() {
            return Err(VerifyError::EmptyClaim);
        }

        let settings = self.resolve_settings().await;
        let body = VerifyBody {
            text,
            url,
            platform: detect_platform(url),
        };
        let body = serde_json::to_value(&body).map_err(|e| VerifyError::Payload(e.to_string()))?;
        let endpoint = settings.verify_endpoint();

        log::debug!("POST {} (platform {})", endpoint, body["platform"]);

        let reply = self
            .host
            .post_json(&endpoint, settings.api_key(), &body)
            .await
            .map_err(VerifyError::Transport)?;
        if !(200..=299).contains(&reply.status) {
            log::warn!("Verification API answered {}", reply.status);
            return Err(VerifyError::Api(reply.status));
        }

        let payload: Value =
            serde_json::from_str(&reply.body).map_err(|e| VerifyError::Payload(e.to_string()))?;

        let entry = CachedVerification::new(self.host.now(), payload.clone());
        if let Err(e) = self.host.write_cache(&entry).await {
            log::warn!("Could not cache verification: {}", e);
        }

        self.update_badge(&payload);
        log::info!("Verification complete: {}", verdict_of(&payload).unwrap_or("no verdict"));

        Ok(payload)
    }

    fn update_badge(&self, payload: &Value) {
        let badge = badge_for(verdict_of(payload));
        self.state.badge.set(badge);
        self.host.set_badge(badge);
    }

    /// Produce the reply for one request
    pub async fn handle(&self, request: Request) -> Reply {
        match request {
            Request::VerifyClaim { text, url } => {
                let outcome = self.verify_claim(&text, url.as_deref()).await;
                if let Err(e) = &outcome {
                    log::warn!("Verification failed: {}", e);
                }
                Reply::Verification(VerificationResponse::from(outcome))
            }
            Request::GetSettings => Reply::Settings(self.resolve_settings().await),
        }
    }

    /// Handle a request and complete its reply slot exactly once
    pub async fn serve(&self, request: Request, slot: ReplySlot) {
        let reply = self.handle(request).await;
        slot.complete(reply);
    }

    /// Context-menu entry point; same path as a `verifyClaim` message
    pub async fn on_menu_click(&self, click: MenuClick) -> Option<VerificationResponse> {
        if click.menu_item_id != MENU_ITEM_ID {
            return None;
        }
        let text = click.selection_text.filter(|t| !t.trim().is_empty())?;

        let request = Request::VerifyClaim {
            text,
            url: click.tab_url,
        };
        match self.handle(request).await {
            Reply::Verification(response) => Some(response),
            Reply::Settings(_) => None,
        }
    }
}
