//! Reconciling one entity subtree into another.
//!
//! `patch(current, next)` makes `current` match `next` in place:
//! - fields (attributes, text, inline style) are adopted from `next`
//! - children are aligned with the array differ; compatible pairs (same kind
//!   and node name) are patched recursively and repositioned, the rest are
//!   removed or moved over from `next`
//! - whatever is left of `next` is disposed
//!
//! Surviving entities keep their ids and sections, so rendered nodes are moved
//! rather than rebuilt.

use crate::entity::EntityId;
use crate::error::{EntityError, EntityResult};
use crate::section::Section;
use crate::tree::EntityTree;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tandem_common::{diff_array, diff_keyed, ArrayChange, KeyedChange, Similarity};
use tracing::{debug, instrument, trace};

/// What a patch changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSummary {
    pub inserted: usize,
    pub removed: usize,
    pub moved: usize,
    /// Compatible pairs patched in place, changed or not
    pub updated: usize,
    /// Attribute, style property, and text value changes
    pub attributes_changed: usize,
}

impl PatchSummary {
    /// Nothing observable changed
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.removed == 0 && self.moved == 0 && self.attributes_changed == 0
    }
}

impl EntityTree {
    /// Make `current` match `next`, consuming `next`
    #[instrument(skip(self), fields(document = %self.document()))]
    pub fn patch(&mut self, current: EntityId, next: EntityId) -> EntityResult<PatchSummary> {
        let mut summary = PatchSummary::default();
        self.patch_entity(current, next, &mut summary)?;
        if self.contains(next) {
            self.dispose(next)?;
        }
        debug!(?summary, "patched");
        Ok(summary)
    }

    fn patch_entity(
        &mut self,
        current: EntityId,
        next: EntityId,
        summary: &mut PatchSummary,
    ) -> EntityResult<()> {
        let (current_entity, next_entity) = (self.get(current)?, self.get(next)?);
        if !current_entity.is_compatible(next_entity) {
            return Err(EntityError::IncompatiblePatch {
                current: current_entity.describe(),
                next: next_entity.describe(),
            });
        }

        self.adopt_fields(current, next, summary)?;
        self.patch_children(current, next, summary)
    }

    fn adopt_fields(
        &mut self,
        current: EntityId,
        next: EntityId,
        summary: &mut PatchSummary,
    ) -> EntityResult<()> {
        let next_entity = self.get(next)?;
        let attributes = next_entity.attributes.clone();
        let value = next_entity.value.clone();
        let style = next_entity.style.clone();

        let entity = self.get_mut(current)?;
        let attribute_changes = diff_keyed(&entity.attributes, &attributes);
        let style_edit = entity.style.diff(&style);
        let value_changed = entity.value != value;

        attribute_changes.apply(&mut entity.attributes);
        style_edit.apply_to(&mut entity.style)?;
        if value_changed {
            entity.value = value.clone();
        }
        let section = entity.section;

        if let Some(Section::Node { node }) = section {
            let markup = self.markup_mut();
            for change in attribute_changes.iter() {
                match change {
                    KeyedChange::Insert { key, value }
                    | KeyedChange::Update {
                        key,
                        new_value: value,
                        ..
                    } => markup.set_attribute(node, key, Some(value.as_str())),
                    KeyedChange::Remove { key, .. } => markup.set_attribute(node, key, None),
                }
            }
            if let Some(rendered) = markup.style_mut(node) {
                style_edit.apply_to(rendered)?;
            }
            if value_changed {
                markup.set_text(node, &value);
            }
        }

        summary.attributes_changed +=
            attribute_changes.len() + style_edit.len() + usize::from(value_changed);
        Ok(())
    }

    fn patch_children(
        &mut self,
        current: EntityId,
        next: EntityId,
        summary: &mut PatchSummary,
    ) -> EntityResult<()> {
        let old_children = self.children(current)?.to_vec();
        let new_children = self.children(next)?.to_vec();

        let mut seen = HashSet::with_capacity(old_children.len());
        if let Some(duplicate) = old_children.iter().find(|id| !seen.insert(**id)) {
            return Err(EntityError::DuplicateChild {
                parent: current,
                child: *duplicate,
            });
        }

        let diff = diff_array(&old_children, &new_children, |old, new| {
            match (self.get(*old), self.get(*new)) {
                (Ok(old), Ok(new)) if old.is_compatible(new) => Similarity::Compatible,
                _ => Similarity::Incompatible,
            }
        });

        for change in diff.changes {
            match change {
                ArrayChange::Remove(remove) => {
                    trace!(entity = %remove.value, index = remove.index, "remove");
                    self.remove_child(current, remove.value)?;
                    summary.removed += 1;
                }
                ArrayChange::Update(update) => {
                    self.patch_entity(update.old_value, update.new_value, summary)?;
                    summary.updated += 1;
                    if update.is_move() {
                        trace!(
                            entity = %update.old_value,
                            from = update.old_index,
                            to = update.new_index,
                            "move"
                        );
                        self.move_child(current, update.old_value, update.new_index)?;
                        summary.moved += 1;
                    }
                }
                ArrayChange::Insert(insert) => {
                    trace!(entity = %insert.value, index = insert.index, "insert");
                    self.detach_child(next, insert.value)?;
                    self.insert_child(current, insert.index, insert.value)?;
                    summary.inserted += 1;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentId;
    use crate::expression::Expression;

    fn list(items: &[&str]) -> Expression {
        Expression::element("ul").with_children(
            items
                .iter()
                .map(|item| Expression::element("li").with_child(Expression::text(*item))),
        )
    }

    #[test]
    fn test_patch_text_in_place() {
        let mut tree = EntityTree::new(DocumentId::next());
        let current = tree.create(&Expression::element("p").with_child(Expression::text("old"))).unwrap();
        let text = tree.children(current).unwrap()[0];
        let next = tree.create(&Expression::element("p").with_child(Expression::text("new"))).unwrap();

        let summary = tree.patch(current, next).unwrap();
        assert_eq!(summary.attributes_changed, 1);
        assert_eq!(tree.children(current).unwrap(), &[text]);
        assert_eq!(tree.to_html(current).unwrap(), "<p>new</p>");
        assert!(!tree.contains(next));
    }

    #[test]
    fn test_patch_replaces_incompatible_children() {
        let mut tree = EntityTree::new(DocumentId::next());
        let current = tree
            .create(&Expression::element("div").with_child(Expression::element("span")))
            .unwrap();
        let span = tree.children(current).unwrap()[0];
        let next = tree
            .create(&Expression::element("div").with_child(Expression::element("b")))
            .unwrap();

        let summary = tree.patch(current, next).unwrap();
        assert_eq!((summary.inserted, summary.removed), (1, 1));
        assert!(!tree.contains(span));
        assert_eq!(tree.to_html(current).unwrap(), "<div><b></b></div>");
    }

    #[test]
    fn test_patch_attributes_and_style() {
        let mut tree = EntityTree::new(DocumentId::next());
        let current = tree
            .create(
                &Expression::element("div")
                    .with_attr("id", "a")
                    .with_attr("title", "gone")
                    .with_attr("style", "color: red; margin: 0"),
            )
            .unwrap();
        let uid = tree.get(current).unwrap().style().uid().to_string();
        let next = tree
            .create(
                &Expression::element("div")
                    .with_attr("id", "b")
                    .with_attr("style", "color: blue"),
            )
            .unwrap();

        let summary = tree.patch(current, next).unwrap();
        let entity = tree.get(current).unwrap();
        assert_eq!(entity.attribute("id"), Some("b"));
        assert_eq!(entity.attribute("title"), None);
        assert_eq!(entity.style().uid(), uid);
        assert_eq!(entity.style().css_text(), "color:blue;");
        // id, title, color, margin
        assert_eq!(summary.attributes_changed, 4);
        assert_eq!(
            tree.to_html(current).unwrap(),
            "<div id=\"b\" style=\"color:blue;\"></div>"
        );
    }

    #[test]
    fn test_incompatible_roots_rejected() {
        let mut tree = EntityTree::new(DocumentId::next());
        let current = tree.create(&Expression::element("div")).unwrap();
        let next = tree.create(&Expression::element("span")).unwrap();
        assert!(matches!(
            tree.patch(current, next),
            Err(EntityError::IncompatiblePatch { .. })
        ));
        assert!(tree.contains(current));
    }

    #[test]
    fn test_reorder_moves_without_rebuilding() {
        let mut tree = EntityTree::new(DocumentId::next());
        let current = tree.create(&list(&["a", "b", "c"])).unwrap();
        let before = tree.children(current).unwrap().to_vec();
        let sections: Vec<_> = before
            .iter()
            .map(|id| tree.get(*id).unwrap().section())
            .collect();

        let next = tree.create(&list(&["c", "a", "b"])).unwrap();
        let summary = tree.patch(current, next).unwrap();

        assert_eq!((summary.inserted, summary.removed), (0, 0));
        assert!(summary.moved >= 1);
        assert_eq!(
            tree.to_html(current).unwrap(),
            "<ul><li>c</li><li>a</li><li>b</li></ul>"
        );

        let after = tree.children(current).unwrap().to_vec();
        let mut sorted_before = before.clone();
        let mut sorted_after = after.clone();
        sorted_before.sort();
        sorted_after.sort();
        assert_eq!(sorted_before, sorted_after);
        for (id, section) in before.iter().zip(sections) {
            assert_eq!(tree.get(*id).unwrap().section(), section);
        }
    }

    #[test]
    fn test_duplicate_children_reported() {
        let mut tree = EntityTree::new(DocumentId::next());
        let current = tree.create(&list(&["a"])).unwrap();
        let child = tree.children(current).unwrap()[0];
        tree.get_mut(current).unwrap().children.push(child);
        let next = tree.create(&list(&["a"])).unwrap();

        assert!(matches!(
            tree.patch(current, next),
            Err(EntityError::DuplicateChild { .. })
        ));
    }

    #[test]
    fn test_summary_noop() {
        assert!(PatchSummary::default().is_noop());
        let summary = PatchSummary {
            updated: 3,
            ..Default::default()
        };
        assert!(summary.is_noop());
        let summary = PatchSummary {
            moved: 1,
            ..Default::default()
        };
        assert!(!summary.is_noop());
    }
}
