use crate::document::DocumentId;
use crate::expression::Expression;
use crate::section::Section;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tandem_cssom::StyleDeclaration;

/// Handle into an [`EntityTree`](crate::EntityTree). Stale once the entity is disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Element,
    Text,
    Comment,
    Group,
    /// No rendered output of its own
    Logical,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) kind: EntityKind,
    pub(crate) node_name: String,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) value: String,
    pub(crate) style: StyleDeclaration,
    pub(crate) children: Vec<EntityId>,
    pub(crate) parent: Option<EntityId>,
    pub(crate) section: Option<Section>,
    pub(crate) document: Option<DocumentId>,
}

impl Entity {
    /// Entity for `expression`, without children or a section
    pub(crate) fn from_expression(expression: &Expression) -> Self {
        let mut attributes = expression.attributes().cloned().unwrap_or_default();

        // Inline styles are tracked as a declaration, not as an attribute
        let style = attributes
            .remove("style")
            .map(|text| StyleDeclaration::from_css_text(&text))
            .unwrap_or_default();

        Self {
            kind: expression.kind(),
            node_name: expression.node_name().to_string(),
            attributes,
            value: expression.value().unwrap_or_default().to_string(),
            style,
            children: Vec::new(),
            parent: None,
            section: None,
            document: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Text or comment content, empty otherwise
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn style(&self) -> &StyleDeclaration {
        &self.style
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn section(&self) -> Option<Section> {
        self.section
    }

    pub fn document(&self) -> Option<DocumentId> {
        self.document
    }

    /// Same kind and node name, so one can be patched into the other
    pub fn is_compatible(&self, other: &Entity) -> bool {
        self.kind == other.kind && self.node_name == other.node_name
    }

    pub(crate) fn describe(&self) -> String {
        format!("{:?} <{}>", self.kind, self.node_name)
    }
}
