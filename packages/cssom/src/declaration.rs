//! Style declaration model.
//!
//! Property names are stored in kebab-case (`backgroundColor` and
//! `background-color` address the same property). An empty value is the same
//! as an absent one: setting a property to `""` or `None` removes it.

use crate::edit::StyleDeclarationEdit;
use crate::error::{CssError, CssResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tandem_common::edit::unsupported;
use tandem_common::{CommonResult, EditAction, Editable, SET_STYLE_DECLARATION_EDIT};

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

fn generate_uid() -> String {
    format!("style-{}", NEXT_UID.fetch_add(1, Ordering::Relaxed))
}

/// Normalize a property name to kebab-case
pub fn normalize_property_name(name: &str) -> String {
    let name = name.trim();

    // Custom properties are case-sensitive
    if name.starts_with("--") {
        return name.to_string();
    }

    let mut normalized = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                normalized.push('-');
            }
            normalized.push(ch.to_ascii_lowercase());
        } else {
            normalized.push(ch);
        }
    }
    normalized
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDeclaration {
    #[serde(default = "generate_uid")]
    uid: String,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl StyleDeclaration {
    pub fn new() -> Self {
        Self {
            uid: generate_uid(),
            properties: BTreeMap::new(),
        }
    }

    /// Parse inline style text, skipping malformed items
    pub fn from_css_text(source: &str) -> Self {
        let mut declaration = Self::new();
        for item in source.split(';') {
            if let Some((name, value)) = item.split_once(':') {
                declaration.set_property(name, Some(value));
            }
        }
        declaration
    }

    /// Parse inline style text, rejecting malformed items
    pub fn parse(source: &str) -> CssResult<Self> {
        let mut declaration = Self::new();
        for item in source.split(';').map(str::trim).filter(|item| !item.is_empty()) {
            match item.split_once(':') {
                Some((name, value)) if !name.trim().is_empty() && !value.trim().is_empty() => {
                    declaration.set_property(name, Some(value));
                }
                _ => return Err(CssError::InvalidDeclaration(item.to_string())),
            }
        }
        Ok(declaration)
    }

    pub fn from_object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut declaration = Self::new();
        for (name, value) in entries {
            declaration.set_property(name.as_ref(), Some(value.as_ref()));
        }
        declaration
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn get_property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(&normalize_property_name(name))
            .map(String::as_str)
    }

    /// Set a property; `None` or an empty value removes it
    pub fn set_property(&mut self, name: &str, value: Option<&str>) {
        let name = normalize_property_name(name);
        if name.is_empty() {
            return;
        }
        match value.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => {
                self.properties.insert(name, value.to_string());
            }
            None => {
                self.properties.remove(&name);
            }
        }
    }

    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        self.properties.remove(&normalize_property_name(name))
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn clear_all(&mut self) {
        self.properties.clear();
    }

    pub fn css_text(&self) -> String {
        let mut buffer = String::new();
        for (name, value) in &self.properties {
            buffer.push_str(name);
            buffer.push(':');
            buffer.push_str(value);
            buffer.push(';');
        }
        buffer
    }

    /// Every defined property has the same value on both sides, checked both ways
    pub fn equal_to(&self, other: &StyleDeclaration) -> bool {
        fn subset(a: &StyleDeclaration, b: &StyleDeclaration) -> bool {
            a.properties
                .iter()
                .all(|(name, value)| b.properties.get(name) == Some(value))
        }
        subset(self, other) && subset(other, self)
    }

    pub fn create_edit(&self) -> StyleDeclarationEdit {
        StyleDeclarationEdit::new(self)
    }

    /// Edits that turn this declaration into `next`
    pub fn diff(&self, next: &StyleDeclaration) -> StyleDeclarationEdit {
        let mut edit = self.create_edit();
        edit.add_diff(self, next);
        edit
    }
}

impl Default for StyleDeclaration {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for StyleDeclaration {
    fn eq(&self, other: &Self) -> bool {
        self.equal_to(other)
    }
}

impl Eq for StyleDeclaration {}

impl fmt::Display for StyleDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css_text())
    }
}

impl Editable for StyleDeclaration {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn apply_edit_action(&mut self, action: &EditAction) -> CommonResult<()> {
        match action {
            EditAction::SetKeyValue(set) if set.kind == SET_STYLE_DECLARATION_EDIT => {
                self.set_property(&set.name, set.value.as_deref());
                Ok(())
            }
            other => Err(unsupported(other, self)),
        }
    }
}
