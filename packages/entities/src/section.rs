//! Where an entity's rendered nodes live.

use crate::markup::{Markup, MarkupId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Section {
    /// A single node. Children render inside it.
    Node { node: MarkupId },

    /// A run of sibling nodes between two markers. Children render between
    /// the markers. While unmounted the run is parked in `fragment`.
    Group {
        fragment: MarkupId,
        start: MarkupId,
        end: MarkupId,
    },
}

impl Section {
    pub fn node(node: MarkupId) -> Self {
        Section::Node { node }
    }

    pub fn group(markup: &mut Markup, label: &str) -> Self {
        let fragment = markup.create_fragment();
        let start = markup.create_marker(label);
        let end = markup.create_marker(&format!("/{label}"));
        markup.append_child(fragment, start);
        markup.append_child(fragment, end);
        Section::Group {
            fragment,
            start,
            end,
        }
    }

    /// First rendered node. Siblings insert before it.
    pub fn first_node(&self) -> MarkupId {
        match self {
            Section::Node { node } => *node,
            Section::Group { start, .. } => *start,
        }
    }

    /// Rendered nodes in document order
    pub fn nodes(&self, markup: &Markup) -> Vec<MarkupId> {
        match *self {
            Section::Node { node } => vec![node],
            Section::Group { start, end, .. } => {
                let Some(parent) = markup.parent(start) else {
                    return vec![start, end];
                };
                let siblings = markup.children(parent);
                let first = siblings.iter().position(|id| *id == start);
                let last = siblings.iter().position(|id| *id == end);
                match (first, last) {
                    (Some(first), Some(last)) if first <= last => siblings[first..=last].to_vec(),
                    _ => vec![start, end],
                }
            }
        }
    }

    /// Where children of this section are inserted
    fn container(&self, markup: &Markup) -> Option<MarkupId> {
        match *self {
            Section::Node { node } => Some(node),
            Section::Group { end, .. } => markup.parent(end),
        }
    }

    /// Mount `nodes` as the last children of this section
    pub fn append_nodes(&self, markup: &mut Markup, nodes: &[MarkupId]) {
        match *self {
            Section::Node { node } => {
                for child in nodes {
                    markup.append_child(node, *child);
                }
            }
            Section::Group { end, .. } => {
                if let Some(container) = markup.parent(end) {
                    for child in nodes {
                        markup.insert_before(container, *child, end);
                    }
                }
            }
        }
    }

    /// Mount `nodes` in this section ahead of `before`
    pub fn insert_nodes_before(&self, markup: &mut Markup, nodes: &[MarkupId], before: MarkupId) {
        if let Some(container) = self.container(markup) {
            for child in nodes {
                markup.insert_before(container, *child, before);
            }
        }
    }

    /// Take this section's nodes out of the rendered output
    pub fn unmount(&self, markup: &mut Markup) {
        match *self {
            Section::Node { node } => markup.detach(node),
            Section::Group { fragment, .. } => {
                if markup.parent(self.first_node()) == Some(fragment) {
                    return;
                }
                for child in self.nodes(markup) {
                    markup.append_child(fragment, child);
                }
            }
        }
    }

    /// Free every node this section owns
    pub fn dispose(&self, markup: &mut Markup) {
        match *self {
            Section::Node { node } => markup.remove(node),
            Section::Group { fragment, .. } => {
                for child in self.nodes(markup) {
                    markup.remove(child);
                }
                markup.remove(fragment);
            }
        }
    }
}
