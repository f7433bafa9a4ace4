/// Content script: verify controls injected next to social posts
///
/// The page itself is the state store. A post is tracked if it contains a
/// control carrying [`CONTROL_CLASS`]; the control's [`STATE_ATTR`] holds
/// where that post is in its verification. Nothing is remembered between
/// scans, so a reloaded script or a re-rendered post is picked up again
/// by the next pass.

pub mod page;
pub mod strategy;

#[cfg(test)]
mod fake_dom;

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{CLOSE_CLASS, CONTROL_CLASS, ERROR_CLASS, RESULT_CLASS, STATE_ATTR};
use strategy::PostStrategy;

/// The DOM operations a scan needs
pub trait DomNode: Clone {
    /// Descendants matching a CSS selector, in document order
    fn select_all(&self, selector: &str) -> Vec<Self>;

    fn select(&self, selector: &str) -> Option<Self> {
        self.select_all(selector).into_iter().next()
    }

    /// This node or its nearest ancestor matching `selector`
    fn closest(&self, selector: &str) -> Option<Self>;

    fn text(&self) -> String;

    fn attr(&self, name: &str) -> Option<String>;
}

/// Where controls get attached
pub trait PageSurface {
    type Node: DomNode;

    /// Build a control (marker class and idle state set before insertion)
    /// and append it to `action_row`. `claim_node` is read on activation.
    fn attach_control(&self, post: &Self::Node, action_row: &Self::Node, claim_node: &Self::Node);
}

/// Verification state of one trackable post, read from the DOM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Untracked,
    Idle,
    Pending,
    Result,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Activated,
    Succeeded,
    Failed,
}

impl ElementState {
    pub fn as_attr(&self) -> &'static str {
        match self {
            ElementState::Untracked => "untracked",
            ElementState::Idle => "idle",
            ElementState::Pending => "pending",
            ElementState::Result => "result",
            ElementState::Error => "error",
        }
    }

    fn from_attr(value: Option<&str>) -> ElementState {
        match value {
            Some("pending") => ElementState::Pending,
            Some("result") => ElementState::Result,
            Some("error") => ElementState::Error,
            _ => ElementState::Idle,
        }
    }

    /// Allowed transitions; `None` means the event is ignored
    pub fn on(self, event: ControlEvent) -> Option<ElementState> {
        match (self, event) {
            (ElementState::Idle, ControlEvent::Activated) => Some(ElementState::Pending),
            (ElementState::Pending, ControlEvent::Succeeded) => Some(ElementState::Result),
            (ElementState::Pending, ControlEvent::Failed) => Some(ElementState::Error),
            _ => None,
        }
    }
}

pub fn control_selector() -> String {
    format!(".{}", CONTROL_CLASS)
}

pub fn result_selector() -> String {
    format!(".{}", RESULT_CLASS)
}

pub fn error_selector() -> String {
    format!(".{}", ERROR_CLASS)
}

pub fn close_selector() -> String {
    format!(".{}", CLOSE_CLASS)
}

/// Current state of a post, derived fresh from its subtree
pub fn element_state<N: DomNode>(post: &N) -> ElementState {
    match post.select(&control_selector()) {
        None => ElementState::Untracked,
        Some(control) => ElementState::from_attr(control.attr(STATE_ATTR).as_deref()),
    }
}

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace and trim
pub fn normalize_claim_text(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Outcome of one scan pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub attached: usize,
    pub already_tracked: usize,
    /// Posts without a text node or action row yet
    pub incomplete: usize,
}

/// One idempotent pass: attach a control to every post that lacks one
pub fn scan<P: PageSurface>(
    page: &P,
    root: &P::Node,
    strategy: &dyn PostStrategy<P::Node>,
) -> ScanReport {
    let mut report = ScanReport::default();
    let control = control_selector();

    for post in strategy.posts(root) {
        let (Some(claim_node), Some(action_row)) =
            (strategy.claim_node(&post), strategy.action_row(&post))
        else {
            report.incomplete += 1;
            continue;
        };

        // Checked right before attaching so overlapping passes cannot double up.
        if post.select(&control).is_some() {
            report.already_tracked += 1;
            continue;
        }

        page.attach_control(&post, &action_row, &claim_node);
        report.attached += 1;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::fake_dom::{FakeNode, FakePage};
    use super::strategy::{NoopStrategy, TwitterStrategy};
    use super::*;
    use crate::platform::Platform;

    fn tweet(text: &str, with_actions: bool) -> FakeNode {
        let article = FakeNode::element("article").with_attr("data-testid", "tweet");
        article.append(FakeNode::element("div").with_attr("data-testid", "tweetText").with_text(text));
        if with_actions {
            article.append(FakeNode::element("div").with_attr("role", "group"));
        }
        article
    }

    fn timeline(tweets: Vec<FakeNode>) -> FakeNode {
        let body = FakeNode::element("body");
        let main = FakeNode::element("main");
        for t in tweets {
            main.append(t);
        }
        body.append(main);
        body
    }

    #[test]
    fn test_scan_attaches_one_control_per_post() {
        let root = timeline(vec![tweet("one", true), tweet("two", true)]);
        let page = FakePage::default();

        let report = scan(&page, &root, &TwitterStrategy);

        assert_eq!(report.attached, 2);
        assert_eq!(root.select_all(&control_selector()).len(), 2);
    }

    #[test]
    fn test_second_scan_is_a_noop() {
        let root = timeline(vec![tweet("one", true), tweet("two", true)]);
        let page = FakePage::default();

        scan(&page, &root, &TwitterStrategy);
        let second = scan(&page, &root, &TwitterStrategy);

        assert_eq!(
            second,
            ScanReport {
                attached: 0,
                already_tracked: 2,
                incomplete: 0
            }
        );
        for post in root.select_all(r#"article[data-testid="tweet"]"#) {
            assert_eq!(post.select_all(&control_selector()).len(), 1);
        }
        assert_eq!(page.attached(), 2);
    }

    #[test]
    fn test_incomplete_post_retried_later() {
        let post = tweet("pending render", false);
        let root = timeline(vec![post.clone()]);
        let page = FakePage::default();

        let first = scan(&page, &root, &TwitterStrategy);
        assert_eq!(first.incomplete, 1);
        assert_eq!(element_state(&post), ElementState::Untracked);

        post.append(FakeNode::element("div").with_attr("role", "group"));
        let second = scan(&page, &root, &TwitterStrategy);

        assert_eq!(second.attached, 1);
        assert_eq!(element_state(&post), ElementState::Idle);
    }

    #[test]
    fn test_new_posts_from_infinite_scroll() {
        let root = timeline(vec![tweet("one", true)]);
        let page = FakePage::default();
        scan(&page, &root, &TwitterStrategy);

        let main = root.select("main").unwrap();
        main.append(tweet("two", true));
        main.append(tweet("three", true));
        let report = scan(&page, &root, &TwitterStrategy);

        assert_eq!(report.attached, 2);
        assert_eq!(report.already_tracked, 1);
    }

    #[test]
    fn test_rerendered_post_gets_fresh_control() {
        let post = tweet("one", true);
        let root = timeline(vec![post.clone()]);
        let page = FakePage::default();
        scan(&page, &root, &TwitterStrategy);

        let control = post.select(&control_selector()).unwrap();
        control.set_attr(STATE_ATTR, "error");
        assert_eq!(element_state(&post), ElementState::Error);

        // Feed re-renders the post's action row without our control.
        post.remove_children_matching(r#"[role="group"]"#);
        post.append(FakeNode::element("div").with_attr("role", "group"));
        assert_eq!(element_state(&post), ElementState::Untracked);

        scan(&page, &root, &TwitterStrategy);
        assert_eq!(element_state(&post), ElementState::Idle);
    }

    #[test]
    fn test_control_finds_its_post() {
        let first = tweet("one", true);
        let second = tweet("two", true);
        let root = timeline(vec![first, second.clone()]);
        scan(&FakePage::default(), &root, &TwitterStrategy);

        let control = second.select(&control_selector()).unwrap();
        let post = TwitterStrategy.post_of(&control).unwrap();

        assert_eq!(post.text(), "two");
        assert!(control.closest("section").is_none());
    }

    #[test]
    fn test_noop_platform_never_attaches() {
        let root = timeline(vec![tweet("one", true)]);
        let page = FakePage::default();

        let report = scan(&page, &root, &NoopStrategy(Platform::Facebook));

        assert_eq!(report, ScanReport::default());
        assert_eq!(page.attached(), 0);
    }

    #[test]
    fn test_element_state_from_attr() {
        let post = tweet("one", true);
        let root = timeline(vec![post.clone()]);
        let page = FakePage::default();
        scan(&page, &root, &TwitterStrategy);

        let control = post.select(&control_selector()).unwrap();
        for (attr, state) in [
            ("idle", ElementState::Idle),
            ("pending", ElementState::Pending),
            ("result", ElementState::Result),
            ("error", ElementState::Error),
            ("bogus", ElementState::Idle),
        ] {
            control.set_attr(STATE_ATTR, attr);
            assert_eq!(element_state(&post), state);
        }
    }

    #[test]
    fn test_transitions() {
        use ControlEvent::*;
        use ElementState::*;

        assert_eq!(Idle.on(Activated), Some(Pending));
        assert_eq!(Pending.on(Succeeded), Some(Result));
        assert_eq!(Pending.on(Failed), Some(Error));

        // one request in flight per post
        assert_eq!(Pending.on(Activated), None);
        // terminal until the post is re-rendered
        assert_eq!(Result.on(Activated), None);
        assert_eq!(Error.on(Activated), None);
        assert_eq!(Untracked.on(Activated), None);
        assert_eq!(Idle.on(Succeeded), None);
    }

    #[test]
    fn test_normalize_claim_text() {
        assert_eq!(
            normalize_claim_text("  The moon\n landing\t\twas   faked "),
            "The moon landing was faked"
        );
        assert_eq!(normalize_claim_text("\n\n"), "");
    }
}
