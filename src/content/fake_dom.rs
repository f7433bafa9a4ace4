/// In-memory DOM for scan tests
///
/// Supports the selector forms the strategies use: `tag`, `.class`,
/// `[attr="value"]` and `tag[attr="value"]`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::{DomNode, ElementState, PageSurface};
use crate::config::{CONTROL_CLASS, STATE_ATTR};

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<FakeNode>,
    parent: Weak<RefCell<NodeData>>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeNode(Rc<RefCell<NodeData>>);

impl FakeNode {
    pub fn element(tag: &str) -> FakeNode {
        FakeNode(Rc::new(RefCell::new(NodeData {
            tag: tag.to_string(),
            ..NodeData::default()
        })))
    }

    pub fn with_attr(self, name: &str, value: &str) -> FakeNode {
        self.set_attr(name, value);
        self
    }

    pub fn with_class(self, class: &str) -> FakeNode {
        self.with_attr("class", class)
    }

    pub fn with_text(self, text: &str) -> FakeNode {
        self.0.borrow_mut().text = text.to_string();
        self
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        let mut data = self.0.borrow_mut();
        match data.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => data.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn append(&self, child: FakeNode) {
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child);
    }

    fn parent(&self) -> Option<FakeNode> {
        self.0.borrow().parent.upgrade().map(FakeNode)
    }

    pub fn remove_children_matching(&self, selector: &str) {
        let selector = Selector::parse(selector);
        self.0
            .borrow_mut()
            .children
            .retain(|child| !selector.matches(child));
    }

    fn collect(&self, selector: &Selector, out: &mut Vec<FakeNode>) {
        for child in self.0.borrow().children.iter() {
            if selector.matches(child) {
                out.push(child.clone());
            }
            child.collect(selector, out);
        }
    }
}

impl DomNode for FakeNode {
    fn select_all(&self, selector: &str) -> Vec<FakeNode> {
        let selector = Selector::parse(selector);
        let mut out = Vec::new();
        self.collect(&selector, &mut out);
        out
    }

    fn closest(&self, selector: &str) -> Option<FakeNode> {
        let selector = Selector::parse(selector);
        let mut node = Some(self.clone());
        while let Some(current) = node {
            if selector.matches(&current) {
                return Some(current);
            }
            node = current.parent();
        }
        None
    }

    fn text(&self) -> String {
        let data = self.0.borrow();
        let mut text = data.text.clone();
        for child in data.children.iter() {
            text.push_str(&child.text());
        }
        text
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.0
            .borrow()
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}

struct Selector {
    tag: Option<String>,
    class: Option<String>,
    attr: Option<(String, String)>,
}

impl Selector {
    fn parse(raw: &str) -> Selector {
        let (head, attr) = match raw.split_once('[') {
            Some((head, rest)) => {
                let inner = rest.trim_end_matches(']');
                let attr = inner
                    .split_once('=')
                    .map(|(n, v)| (n.to_string(), v.trim_matches('"').to_string()));
                (head, attr)
            }
            None => (raw, None),
        };

        let (tag, class) = match head.strip_prefix('.') {
            Some(class) => (None, Some(class.to_string())),
            None if head.is_empty() => (None, None),
            None => (Some(head.to_string()), None),
        };

        Selector { tag, class, attr }
    }

    fn matches(&self, node: &FakeNode) -> bool {
        let data = node.0.borrow();
        let tag_ok = self.tag.as_ref().is_none_or(|t| *t == data.tag);
        let class_ok = self.class.as_ref().is_none_or(|c| {
            node.attr("class")
                .is_some_and(|classes| classes.split_whitespace().any(|k| k == c))
        });
        let attr_ok = self
            .attr
            .as_ref()
            .is_none_or(|(n, v)| node.attr(n).as_deref() == Some(v.as_str()));
        tag_ok && class_ok && attr_ok
    }
}

/// Attaches inert controls and counts them
#[derive(Default)]
pub struct FakePage {
    attached: Cell<usize>,
}

impl FakePage {
    pub fn attached(&self) -> usize {
        self.attached.get()
    }
}

impl PageSurface for FakePage {
    type Node = FakeNode;

    fn attach_control(&self, _post: &FakeNode, action_row: &FakeNode, _claim_node: &FakeNode) {
        let control = FakeNode::element("button")
            .with_class(CONTROL_CLASS)
            .with_attr(STATE_ATTR, ElementState::Idle.as_attr());
        let wrapper = FakeNode::element("div");
        wrapper.append(control);
        action_row.append(wrapper);
        self.attached.set(self.attached.get() + 1);
    }
}
