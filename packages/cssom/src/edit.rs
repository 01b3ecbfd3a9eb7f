//! Style declaration edits.

use crate::declaration::StyleDeclaration;
use tandem_common::{
    diff_keyed, CommonResult, ContentEdit, EditAction, Editable, KeyedChange,
    SetKeyValueEditAction, SET_STYLE_DECLARATION_EDIT,
};
use tracing::debug;

/// Accumulates property edits for one style declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDeclarationEdit {
    edit: ContentEdit,
}

impl StyleDeclarationEdit {
    pub fn new(target: &StyleDeclaration) -> Self {
        Self {
            edit: ContentEdit::new(target.uid()),
        }
    }

    pub fn set_declaration(&mut self, name: &str, value: Option<&str>) {
        let action = SetKeyValueEditAction::new(
            SET_STYLE_DECLARATION_EDIT,
            self.edit.target_uid(),
            name,
            value.map(str::to_string),
        );
        self.edit.add_action(EditAction::SetKeyValue(action));
    }

    /// Record the edits that turn `target` into `next`
    pub fn add_diff(&mut self, target: &StyleDeclaration, next: &StyleDeclaration) -> &mut Self {
        let before = self.edit.len();

        for change in diff_keyed(target.properties(), next.properties()).iter() {
            match change {
                KeyedChange::Insert { key, value } => {
                    self.set_declaration(key, Some(value.as_str()));
                }
                KeyedChange::Remove { key, .. } => {
                    // Skip unsetting a property that is already gone
                    if target.get_property(key).is_some_and(|value| !value.is_empty()) {
                        self.set_declaration(key, None);
                    }
                }
                KeyedChange::Update { key, new_value, .. } => {
                    if target.get_property(key) != Some(new_value.as_str()) {
                        self.set_declaration(key, Some(new_value.as_str()));
                    }
                }
            }
        }

        debug!(
            target_uid = %self.edit.target_uid(),
            actions = self.edit.len() - before,
            "style declaration diff"
        );
        self
    }

    pub fn actions(&self) -> &[EditAction] {
        self.edit.actions()
    }

    pub fn is_empty(&self) -> bool {
        self.edit.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edit.len()
    }

    pub fn apply_to<T: Editable + ?Sized>(&self, target: &mut T) -> CommonResult<()> {
        self.edit.apply_to(target)
    }

    pub fn as_content_edit(&self) -> &ContentEdit {
        &self.edit
    }

    pub fn into_content_edit(self) -> ContentEdit {
        self.edit
    }
}
