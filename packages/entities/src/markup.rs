//! In-memory rendered output.
//!
//! A small arena of nodes that entities render into. Entities only ever hold
//! [`MarkupId`] handles; the arena owns the nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tandem_cssom::StyleDeclaration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkupId(u32);

impl fmt::Display for MarkupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupKind {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        style: StyleDeclaration,
    },
    Text(String),
    Comment(String),
    /// Invisible boundary of a group
    Marker(String),
    /// Parentless holder for nodes that are not mounted
    Fragment,
}

#[derive(Debug, Clone)]
struct MarkupNode {
    kind: MarkupKind,
    parent: Option<MarkupId>,
    children: Vec<MarkupId>,
}

#[derive(Debug, Default)]
pub struct Markup {
    nodes: Vec<Option<MarkupNode>>,
    free: Vec<u32>,
}

impl Markup {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: MarkupKind) -> MarkupId {
        let node = MarkupNode {
            kind,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                self.nodes[index as usize] = Some(node);
                MarkupId(index)
            }
            None => {
                self.nodes.push(Some(node));
                MarkupId((self.nodes.len() - 1) as u32)
            }
        }
    }

    fn node(&self, id: MarkupId) -> Option<&MarkupNode> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: MarkupId) -> Option<&mut MarkupNode> {
        self.nodes.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn create_element(&mut self, tag: &str) -> MarkupId {
        self.alloc(MarkupKind::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            style: StyleDeclaration::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> MarkupId {
        self.alloc(MarkupKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> MarkupId {
        self.alloc(MarkupKind::Comment(text.to_string()))
    }

    pub fn create_marker(&mut self, label: &str) -> MarkupId {
        self.alloc(MarkupKind::Marker(label.to_string()))
    }

    pub fn create_fragment(&mut self) -> MarkupId {
        self.alloc(MarkupKind::Fragment)
    }

    pub fn contains(&self, id: MarkupId) -> bool {
        self.node(id).is_some()
    }

    pub fn kind(&self, id: MarkupId) -> Option<&MarkupKind> {
        self.node(id).map(|node| &node.kind)
    }

    pub fn parent(&self, id: MarkupId) -> Option<MarkupId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: MarkupId) -> &[MarkupId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn detach(&mut self, id: MarkupId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|child| *child != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    pub fn append_child(&mut self, parent: MarkupId, child: MarkupId) {
        self.detach(child);
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.push(child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Insert `child` before `before`; appends when `before` is not a child of `parent`
    pub fn insert_before(&mut self, parent: MarkupId, child: MarkupId, before: MarkupId) {
        if child == before {
            return;
        }
        self.detach(child);

        let position = self
            .node(parent)
            .and_then(|node| node.children.iter().position(|id| *id == before));

        match position {
            Some(position) => {
                if let Some(parent_node) = self.node_mut(parent) {
                    parent_node.children.insert(position, child);
                }
                if let Some(node) = self.node_mut(child) {
                    node.parent = Some(parent);
                }
            }
            None => {
                warn!(%parent, %before, "insertion point is not a child, appending");
                self.append_child(parent, child);
            }
        }
    }

    /// Detach and free a node with its descendants
    pub fn remove(&mut self, id: MarkupId) {
        if !self.contains(id) {
            return;
        }
        self.detach(id);

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0 as usize).and_then(Option::take) {
                stack.extend(node.children);
                self.free.push(current.0);
            }
        }
    }

    /// `None` removes the attribute
    pub fn set_attribute(&mut self, id: MarkupId, name: &str, value: Option<&str>) {
        if let Some(MarkupNode {
            kind: MarkupKind::Element { attributes, .. },
            ..
        }) = self.node_mut(id)
        {
            match value {
                Some(value) => {
                    attributes.insert(name.to_string(), value.to_string());
                }
                None => {
                    attributes.remove(name);
                }
            }
        }
    }

    pub fn attribute(&self, id: MarkupId, name: &str) -> Option<&str> {
        match self.kind(id) {
            Some(MarkupKind::Element { attributes, .. }) => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Replace the content of a text or comment node
    pub fn set_text(&mut self, id: MarkupId, text: &str) {
        if let Some(node) = self.node_mut(id) {
            match &mut node.kind {
                MarkupKind::Text(value) | MarkupKind::Comment(value) => {
                    *value = text.to_string();
                }
                _ => {}
            }
        }
    }

    pub fn style(&self, id: MarkupId) -> Option<&StyleDeclaration> {
        match self.kind(id) {
            Some(MarkupKind::Element { style, .. }) => Some(style),
            _ => None,
        }
    }

    pub fn style_mut(&mut self, id: MarkupId) -> Option<&mut StyleDeclaration> {
        match self.node_mut(id) {
            Some(MarkupNode {
                kind: MarkupKind::Element { style, .. },
                ..
            }) => Some(style),
            _ => None,
        }
    }

    pub fn to_html(&self, id: MarkupId) -> String {
        let mut buffer = String::new();
        self.write_html(id, &mut buffer);
        buffer
    }

    fn write_html(&self, id: MarkupId, buffer: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };

        match &node.kind {
            MarkupKind::Element {
                tag,
                attributes,
                style,
            } => {
                buffer.push('<');
                buffer.push_str(tag);
                for (name, value) in attributes {
                    buffer.push(' ');
                    buffer.push_str(name);
                    buffer.push_str("=\"");
                    buffer.push_str(&escape(value, true));
                    buffer.push('"');
                }
                if !style.is_empty() {
                    buffer.push_str(" style=\"");
                    buffer.push_str(&escape(&style.css_text(), true));
                    buffer.push('"');
                }
                buffer.push('>');
                for child in &node.children {
                    self.write_html(*child, buffer);
                }
                buffer.push_str("</");
                buffer.push_str(tag);
                buffer.push('>');
            }
            MarkupKind::Text(text) => buffer.push_str(&escape(text, false)),
            MarkupKind::Comment(text) => {
                buffer.push_str("<!--");
                buffer.push_str(text);
                buffer.push_str("-->");
            }
            MarkupKind::Marker(_) => {}
            MarkupKind::Fragment => {
                for child in &node.children {
                    self.write_html(*child, buffer);
                }
            }
        }
    }
}

fn escape(value: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
