/// Popup UI: ad-hoc claim verification and API settings

use yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use patternfly_yew::prelude::*;
use crate::analysis::{ResultSummary, interpret_reply};
use crate::bridge;
use crate::cache::CachedVerification;
use crate::config::{self, StoredSettings, normalize_api_url};
use crate::protocol::Request as ExtensionRequest;
use crate::ui::components::VerdictCard;

#[derive(Clone, PartialEq)]
enum PopupState {
    Idle,
    Verifying,
    Showing(ResultSummary),
    Error(String),
}

#[derive(Clone, PartialEq)]
enum ActiveTab {
    Verify,
    Settings,
}

/// Reject empty claims before anything is sent
pub fn validate_claim(input: &str) -> Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err("Please enter a claim to verify".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

/// The cached entry for the opening view; reads local storage only
pub async fn read_cached() -> Option<CachedVerification> {
    bridge::read_cache().await.unwrap_or_else(|e| {
        log::warn!("{}", e);
        None
    })
}

/// What to show on open, unless a submission has already taken over
pub fn restored_summary(cached: Option<CachedVerification>, submitted: bool) -> Option<ResultSummary> {
    if submitted {
        return None;
    }
    cached.and_then(|entry| entry.summary())
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| PopupState::Idle);
    let claim_text = use_state(String::new);
    let active_tab = use_state(|| ActiveTab::Verify);
    let submitted = use_mut_ref(|| false);

    // Show the last verification on open, without a network call
    {
        let state = state.clone();
        let submitted = submitted.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                let cached = read_cached().await;
                if let Some(summary) = restored_summary(cached, *submitted.borrow()) {
                    state.set(PopupState::Showing(summary));
                }
            });
            || ()
        });
    }

    let on_claim_input = {
        let claim_text = claim_text.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(area) = e.target_dyn_into::<HtmlTextAreaElement>() {
                claim_text.set(area.value());
            }
        })
    };

    let on_verify = {
        let state = state.clone();
        let claim_text = claim_text.clone();
        let submitted = submitted.clone();

        Callback::from(move |_| {
            let text = match validate_claim(&claim_text) {
                Ok(text) => text,
                Err(message) => {
                    state.set(PopupState::Error(message));
                    return;
                }
            };

            *submitted.borrow_mut() = true;
            state.set(PopupState::Verifying);

            let state = state.clone();
            spawn_local(async move {
                let url = bridge::active_tab_url().await;
                let outcome = match bridge::request_verification(&text, url).await {
                    Ok(reply) => interpret_reply(&reply),
                    Err(e) => Err(e),
                };

                match outcome {
                    Ok(summary) => state.set(PopupState::Showing(summary)),
                    Err(e) => state.set(PopupState::Error(e)),
                }
            });
        })
    };

    let is_busy = matches!(*state, PopupState::Verifying);

    let on_tab_click = {
        let active_tab = active_tab.clone();
        move |tab: ActiveTab| {
            let active_tab = active_tab.clone();
            Callback::from(move |_| {
                active_tab.set(tab.clone());
            })
        }
    };

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Social Media Polygraph"}</h1>

            <div class="pf-v5-c-tabs tabs-nav">
                <ul class="pf-v5-c-tabs__list">
                    <li class={if *active_tab == ActiveTab::Verify { "pf-v5-c-tabs__item pf-m-current" } else { "pf-v5-c-tabs__item" }}>
                        <button class="pf-v5-c-tabs__link" onclick={on_tab_click(ActiveTab::Verify)}>
                            <span class="pf-v5-c-tabs__item-text">{"Verify"}</span>
                        </button>
                    </li>
                    <li class={if *active_tab == ActiveTab::Settings { "pf-v5-c-tabs__item pf-m-current" } else { "pf-v5-c-tabs__item" }}>
                        <button class="pf-v5-c-tabs__link" onclick={on_tab_click(ActiveTab::Settings)}>
                            <span class="pf-v5-c-tabs__item-text">{"Settings"}</span>
                        </button>
                    </li>
                </ul>
            </div>

            <div class="tab-pane-content">
                {match &*active_tab {
                    ActiveTab::Verify => html! {
                        <div class="flex-column-gap">
                            <textarea
                                id="claimText"
                                rows="4"
                                placeholder="Paste or type a claim to verify"
                                value={(*claim_text).clone()}
                                oninput={on_claim_input}
                                disabled={is_busy}
                            />
                            <Button onclick={on_verify} disabled={is_busy} variant={ButtonVariant::Primary} block={true}>
                                {if is_busy { "Verifying..." } else { "Verify Claim" }}
                            </Button>

                            {match &*state {
                                PopupState::Verifying => html! {
                                    <div class="loading-text-center">
                                        <Spinner />
                                        <p class="loading-text">{"Analyzing claim..."}</p>
                                    </div>
                                },
                                PopupState::Showing(summary) => html! {
                                    <VerdictCard summary={summary.clone()} />
                                },
                                PopupState::Error(err) => html! {
                                    <div class="message-top-margin">
                                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                                            {format!("Error: {}", err)}
                                        </Alert>
                                    </div>
                                },
                                PopupState::Idle => html! {}
                            }}
                        </div>
                    },
                    ActiveTab::Settings => html! { <SettingsPanel /> },
                }}
            </div>

            <p class="footer-popup">
                {"Social Media Polygraph v0.1.0"}
            </p>
        </div>
    }
}

#[derive(Clone, PartialEq)]
enum SaveState {
    Loading,
    Editing,
    Saved,
    Error(String),
}

/// Endpoint and API key, stored in chrome.storage.sync
#[function_component(SettingsPanel)]
fn settings_panel() -> Html {
    let save_state = use_state(|| SaveState::Loading);
    let api_url = use_state(String::new);
    let api_key = use_state(String::new);

    // Resolved values come from the background so defaults match
    {
        let save_state = save_state.clone();
        let api_url = api_url.clone();
        let api_key = api_key.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match bridge::send_request::<config::Settings>(&ExtensionRequest::GetSettings).await {
                    Ok(settings) => {
                        api_url.set(settings.api_url);
                        api_key.set(settings.api_key);
                        save_state.set(SaveState::Editing);
                    }
                    Err(e) => save_state.set(SaveState::Error(format!("Failed to load settings: {}", e))),
                }
            });
            || ()
        });
    }

    let on_url_input = {
        let api_url = api_url.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                api_url.set(input.value());
            }
        })
    };

    let on_key_input = {
        let api_key = api_key.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                api_key.set(input.value());
            }
        })
    };

    let on_save = {
        let save_state = save_state.clone();
        let api_url = api_url.clone();
        let api_key = api_key.clone();

        Callback::from(move |_| {
            let url = match normalize_api_url(&api_url) {
                Ok(url) => url,
                Err(e) => {
                    save_state.set(SaveState::Error(e));
                    return;
                }
            };

            let stored = StoredSettings {
                api_url: Some(url),
                api_key: Some(api_key.trim().to_string()),
            };
            let save_state = save_state.clone();
            spawn_local(async move {
                match bridge::write_settings(&stored).await {
                    Ok(()) => save_state.set(SaveState::Saved),
                    Err(e) => save_state.set(SaveState::Error(e)),
                }
            });
        })
    };

    html! {
        <div class="flex-column-gap">
            <label for="apiUrl">{"API URL"}</label>
            <input id="apiUrl" type="url" value={(*api_url).clone()} oninput={on_url_input} />

            <label for="apiKey">{"API key"}</label>
            <input id="apiKey" type="password" value={(*api_key).clone()} oninput={on_key_input} />

            <Button onclick={on_save} disabled={*save_state == SaveState::Loading} variant={ButtonVariant::Secondary} block={true}>
                {"Save Settings"}
            </Button>

            {match &*save_state {
                SaveState::Saved => html! {
                    <Alert r#type={AlertType::Success} title={"Settings saved"} inline={true}>
                    </Alert>
                },
                SaveState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                SaveState::Loading | SaveState::Editing => html! {}
            }}
        </div>
    }
}
