//! Source expressions that entities are created from.

use crate::entity::EntityKind;
use crate::error::{EntityError, EntityResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declarative description of a subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Expression {
    /// Rendered element
    Element {
        name: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<Expression>,
    },

    /// Text node
    Text { value: String },

    /// Comment node
    Comment { value: String },

    /// Fragment rendered between two markers
    Group {
        name: String,
        #[serde(default)]
        children: Vec<Expression>,
    },

    /// Grouping node with no rendered output of its own
    Logical {
        name: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<Expression>,
    },
}

impl Expression {
    pub fn from_json(source: &str) -> EntityResult<Self> {
        serde_json::from_str(source).map_err(|e| EntityError::InvalidExpression(e.to_string()))
    }

    pub fn element(name: impl Into<String>) -> Self {
        Expression::Element {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Expression::Text {
            value: value.into(),
        }
    }

    pub fn comment(value: impl Into<String>) -> Self {
        Expression::Comment {
            value: value.into(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Expression::Group {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn logical(name: impl Into<String>) -> Self {
        Expression::Logical {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Ignored for nodes without attributes
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Expression::Element {
            ref mut attributes, ..
        }
        | Expression::Logical {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    /// Ignored for text and comments
    pub fn with_child(mut self, child: Expression) -> Self {
        if let Some(children) = self.children_mut() {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: impl IntoIterator<Item = Expression>) -> Self {
        if let Some(children) = self.children_mut() {
            children.extend(new_children);
        }
        self
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Expression::Element { .. } => EntityKind::Element,
            Expression::Text { .. } => EntityKind::Text,
            Expression::Comment { .. } => EntityKind::Comment,
            Expression::Group { .. } => EntityKind::Group,
            Expression::Logical { .. } => EntityKind::Logical,
        }
    }

    pub fn node_name(&self) -> &str {
        match self {
            Expression::Element { name, .. }
            | Expression::Group { name, .. }
            | Expression::Logical { name, .. } => name,
            Expression::Text { .. } => "#text",
            Expression::Comment { .. } => "#comment",
        }
    }

    pub fn attributes(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Expression::Element { attributes, .. } | Expression::Logical { attributes, .. } => {
                Some(attributes)
            }
            _ => None,
        }
    }

    pub fn children(&self) -> &[Expression] {
        match self {
            Expression::Element { children, .. }
            | Expression::Group { children, .. }
            | Expression::Logical { children, .. } => children,
            Expression::Text { .. } | Expression::Comment { .. } => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Expression>> {
        match self {
            Expression::Element { children, .. }
            | Expression::Group { children, .. }
            | Expression::Logical { children, .. } => Some(children),
            Expression::Text { .. } | Expression::Comment { .. } => None,
        }
    }

    /// Text or comment content
    pub fn value(&self) -> Option<&str> {
        match self {
            Expression::Text { value } | Expression::Comment { value } => Some(value),
            _ => None,
        }
    }
}
