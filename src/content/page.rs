/// Live DOM: controls, result panels, inline errors and the rescan loop

use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlButtonElement, MutationObserver, MutationObserverInit};

use super::strategy::{PostStrategy, StrategyRegistry};
use super::{
    ControlEvent, DomNode, ElementState, PageSurface, ScanReport, close_selector, control_selector,
    normalize_claim_text, result_selector, scan,
};
use crate::analysis::{ResultSummary, format_verdict, interpret_reply};
use crate::bridge;
use crate::config::{CLOSE_CLASS, CONTROL_CLASS, ERROR_CLASS, ERROR_DISMISS_MS, RESULT_CLASS, STATE_ATTR};
use crate::platform::{Platform, detect_platform};

const CONTROL_MARKUP: &str = r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M12 22s8-4 8-10V5l-8-3-8 3v7c0 6 8 10 8 10z"></path><path d="M9 12l2 2 4-4"></path></svg><span>Verify</span>"#;

impl DomNode for Element {
    fn select_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn select(&self, selector: &str) -> Option<Element> {
        self.query_selector(selector).ok().flatten()
    }

    fn closest(&self, selector: &str) -> Option<Element> {
        Element::closest(self, selector).ok().flatten()
    }

    fn text(&self) -> String {
        self.text_content().unwrap_or_default()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

fn page_url() -> Option<String> {
    web_sys::window().and_then(|w| w.location().href().ok())
}

/// Move the control to its next state; `None` if the event does not apply
fn advance(control: &Element, event: ControlEvent) -> Option<ElementState> {
    let current = ElementState::from_attr(control.get_attribute(STATE_ATTR).as_deref());
    let next = current.on(event)?;
    if let Err(e) = control.set_attribute(STATE_ATTR, next.as_attr()) {
        log::warn!("Could not record control state: {:?}", e);
    }
    Some(next)
}

pub struct LivePage {
    document: Document,
}

impl LivePage {
    pub fn new(document: Document) -> Self {
        LivePage { document }
    }

    fn try_attach(&self, action_row: &Element) -> Result<(), JsValue> {
        let control: HtmlButtonElement = self.document.create_element("button")?.dyn_into()?;
        control.set_class_name(CONTROL_CLASS);
        control.set_attribute(STATE_ATTR, ElementState::Idle.as_attr())?;
        control.set_type("button");
        control.set_title("Verify this claim with Social Media Polygraph");
        control.set_inner_html(CONTROL_MARKUP);

        let wrapper = self.document.create_element("div")?;
        wrapper.append_child(&control)?;
        action_row.append_child(&wrapper)?;
        Ok(())
    }
}

impl PageSurface for LivePage {
    type Node = Element;

    // Clicks are handled by the document-level listener installed in `start`.
    fn attach_control(&self, _post: &Element, action_row: &Element, _claim_node: &Element) {
        if let Err(e) = self.try_attach(action_row) {
            log::warn!("Could not attach verify control: {:?}", e);
        }
    }
}

/// A claim read from an activated control, ready to send
pub struct PendingClaim {
    pub control: HtmlButtonElement,
    pub post: Element,
    pub text: String,
}

/// What a click on the page means for the injector
pub enum ClickAction {
    Verify(PendingClaim),
    /// A control that is already pending or settled
    Busy,
    /// Close button of this result panel
    Dismiss(Element),
    Ignore,
}

/// Move an idle control to pending; false if it is busy or settled
pub fn activate(control: &HtmlButtonElement) -> bool {
    if advance(control, ControlEvent::Activated).is_none() {
        return false;
    }
    control.set_disabled(true);
    control.set_text_content(Some("Verifying..."));
    true
}

/// Resolve a click target; a click on an idle control activates it
pub fn route_click(strategy: &dyn PostStrategy<Element>, target: &Element) -> ClickAction {
    if let Some(panel) = DomNode::closest(target, &close_selector())
        .and_then(|close| DomNode::closest(&close, &result_selector()))
    {
        return ClickAction::Dismiss(panel);
    }

    let Some(control) = DomNode::closest(target, &control_selector()) else {
        return ClickAction::Ignore;
    };
    let Ok(control) = control.dyn_into::<HtmlButtonElement>() else {
        return ClickAction::Ignore;
    };
    let Some((post, claim_node)) = strategy
        .post_of(&control)
        .and_then(|post| strategy.claim_node(&post).map(|claim| (post, claim)))
    else {
        return ClickAction::Busy;
    };

    if !activate(&control) {
        return ClickAction::Busy;
    }
    let text = normalize_claim_text(&claim_node.text());
    ClickAction::Verify(PendingClaim { control, post, text })
}

async fn verify_post(claim: PendingClaim) {
    let outcome = match bridge::request_verification(&claim.text, page_url()).await {
        Ok(reply) => interpret_reply(&reply),
        Err(e) => Err(e),
    };
    // The post may have been dropped from the feed meanwhile; rendering
    // into a detached node is harmless.
    apply_outcome(&claim.control, &claim.post, outcome);
}

/// Settle a pending control and show the result or the error under `post`
pub fn apply_outcome(control: &HtmlButtonElement, post: &Element, outcome: Result<ResultSummary, String>) {
    match outcome {
        Ok(summary) => {
            advance(control, ControlEvent::Succeeded);
            control.set_text_content(Some("Verified"));
            if let Err(e) = render_result(post, &summary) {
                log::warn!("Could not render result: {:?}", e);
            }
        }
        Err(message) => {
            advance(control, ControlEvent::Failed);
            control.set_text_content(Some("Failed"));
            if let Err(e) = render_error(post, &message) {
                log::warn!("Could not render error: {:?}", e);
            }
        }
    }
}

fn element(document: &Document, tag: &str, class: Option<&str>, text: Option<&str>) -> Result<Element, JsValue> {
    let el = document.create_element(tag)?;
    if let Some(class) = class {
        el.set_class_name(class);
    }
    if text.is_some() {
        el.set_text_content(text);
    }
    Ok(el)
}

/// Create an element and append it to `parent`
fn append(parent: &Element, tag: &str, class: Option<&str>, text: Option<&str>) -> Result<Element, JsValue> {
    let document = parent.owner_document().ok_or_else(|| JsValue::from_str("detached parent"))?;
    let el = element(&document, tag, class, text)?;
    parent.append_child(&el)?;
    Ok(el)
}

/// Append a result panel with a close button to `post`
pub fn render_result(post: &Element, summary: &ResultSummary) -> Result<Element, JsValue> {
    let document = document()?;
    let panel = element(&document, "div", Some(RESULT_CLASS), None)?;

    let header_class = format!("polygraph-result-header {}", summary.verdict_class());
    let header = append(&panel, "div", Some(&header_class), None)?;
    append(&header, "strong", None, Some(&summary.verdict_label()))?;
    if let Some(percent) = summary.confidence_percent() {
        append(&header, "span", None, Some(&format!("{}% confidence", percent)))?;
    }

    let body = append(&panel, "div", Some("polygraph-result-body"), None)?;
    if let Some(explanation) = &summary.explanation {
        append(&body, "p", None, Some(explanation))?;
    }
    if !summary.fact_checks.is_empty() {
        let sources = append(&body, "div", Some("polygraph-sources"), None)?;
        append(&sources, "strong", None, Some("Sources:"))?;
        let list = append(&sources, "ul", None, None)?;
        for check in &summary.fact_checks {
            let line = format!("{}: {}", check.source, format_verdict(&check.verdict));
            append(&list, "li", None, Some(&line))?;
        }
    }

    append(&panel, "button", Some(CLOSE_CLASS), Some("Close"))?;

    post.append_child(&panel)?;
    Ok(panel)
}

/// Append an inline error that removes itself after the dismiss delay
pub fn render_error(post: &Element, message: &str) -> Result<Element, JsValue> {
    let document = document()?;
    let text = format!("Error: {}", message);
    let error = element(&document, "div", Some(ERROR_CLASS), Some(&text))?;
    post.append_child(&error)?;

    let dismissed = error.clone();
    Timeout::new(ERROR_DISMISS_MS, move || dismissed.remove()).forget();

    Ok(error)
}

/// One page's injector: detected platform plus its strategy
pub struct ContentScript {
    platform: Platform,
    registry: StrategyRegistry<Element>,
    page: LivePage,
}

impl ContentScript {
    pub fn new(document: Document, platform: Platform) -> Self {
        ContentScript {
            platform,
            registry: StrategyRegistry::default(),
            page: LivePage::new(document),
        }
    }

    fn strategy(&self) -> &dyn PostStrategy<Element> {
        self.registry.get(self.platform)
    }

    pub fn scan(&self) -> ScanReport {
        let Some(root) = self.page.document.document_element() else {
            return ScanReport::default();
        };
        let report = scan(&self.page, &root, self.strategy());
        if report.attached > 0 {
            log::debug!("Scan: {:?}", report);
        }
        report
    }

    /// Handle one click anywhere in the document
    fn on_click(&self, event: &Event) {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        match route_click(self.strategy(), &target) {
            ClickAction::Verify(claim) => {
                event.stop_propagation();
                event.prevent_default();
                spawn_local(verify_post(claim));
            }
            ClickAction::Busy => {
                event.stop_propagation();
                event.prevent_default();
            }
            ClickAction::Dismiss(panel) => {
                event.stop_propagation();
                panel.remove();
            }
            ClickAction::Ignore => {}
        }
    }
}

/// Initial pass when the page is ready, then a pass per DOM mutation
pub fn start() -> Result<Rc<ContentScript>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = document()?;
    let hostname = window.location().hostname().ok();
    let platform = detect_platform(hostname.as_deref());

    let script = Rc::new(ContentScript::new(document.clone(), platform));
    log::info!("Content script running on {}", platform.as_str());

    // Capture phase, so the page's own handlers never see clicks on our controls.
    let on_click = {
        let script = script.clone();
        Closure::wrap(Box::new(move |event: Event| {
            script.on_click(&event);
        }) as Box<dyn FnMut(Event)>)
    };
    document.add_event_listener_with_callback_and_bool("click", on_click.as_ref().unchecked_ref(), true)?;
    on_click.forget();

    if document.ready_state() == "loading" {
        let on_ready = {
            let script = script.clone();
            Closure::once(move |_event: Event| {
                script.scan();
            })
        };
        document.add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())?;
        on_ready.forget();
    } else {
        script.scan();
    }

    let on_mutation = {
        let script = script.clone();
        Closure::wrap(Box::new(move |_records: JsValue, _observer: JsValue| {
            script.scan();
        }) as Box<dyn FnMut(JsValue, JsValue)>)
    };
    let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    if let Some(root) = document.document_element() {
        observer.observe_with_options(&root, &init)?;
    }
    on_mutation.forget();

    Ok(script)
}
