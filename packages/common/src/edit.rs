//! Edit accumulation.
//!
//! A [`ContentEdit`] is an ordered list of [`EditAction`]s collected while
//! diffing two values. It can be built ahead of time and applied later to any
//! [`Editable`] target. Every action sets a value outright, so applying the
//! same edit twice leaves the target unchanged the second time.

use crate::error::{CommonError, CommonResult};
use serde::{Deserialize, Serialize};

/// Action kind used for style declaration edits
pub const SET_STYLE_DECLARATION_EDIT: &str = "setStyleDeclarationEdit";

/// Set (or clear, when `value` is `None`) a single named property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetKeyValueEditAction {
    pub kind: String,
    pub target_uid: String,
    pub name: String,
    pub value: Option<String>,
}

impl SetKeyValueEditAction {
    pub fn new(
        kind: impl Into<String>,
        target_uid: impl Into<String>,
        name: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            target_uid: target_uid.into(),
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditAction {
    SetKeyValue(SetKeyValueEditAction),
}

impl EditAction {
    pub fn kind(&self) -> &str {
        match self {
            EditAction::SetKeyValue(action) => &action.kind,
        }
    }

    pub fn target_uid(&self) -> &str {
        match self {
            EditAction::SetKeyValue(action) => &action.target_uid,
        }
    }
}

/// Anything an [`EditAction`] can be applied to
pub trait Editable {
    fn uid(&self) -> &str;

    fn apply_edit_action(&mut self, action: &EditAction) -> CommonResult<()>;
}

/// Ordered accumulator of edit actions for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEdit {
    target_uid: String,
    actions: Vec<EditAction>,
}

impl ContentEdit {
    pub fn new(target_uid: impl Into<String>) -> Self {
        Self {
            target_uid: target_uid.into(),
            actions: Vec::new(),
        }
    }

    pub fn target_uid(&self) -> &str {
        &self.target_uid
    }

    pub fn add_action(&mut self, action: EditAction) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[EditAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Apply every action in order
    pub fn apply_to<T: Editable + ?Sized>(&self, target: &mut T) -> CommonResult<()> {
        for action in &self.actions {
            target.apply_edit_action(action)?;
        }
        Ok(())
    }
}

/// Error for targets that only understand some action kinds
pub fn unsupported(action: &EditAction, target: &dyn Editable) -> CommonError {
    CommonError::UnsupportedEditAction {
        kind: action.kind().to_string(),
        target_uid: target.uid().to_string(),
    }
}
