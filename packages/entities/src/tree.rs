//! Arena of entities and the rendered output they own.
//!
//! Entities are addressed by generational [`EntityId`] handles. The arena owns
//! every entity; parent links are plain ids, so there is no shared ownership
//! between a parent and its children.
//!
//! Mounting follows one rule: a child's nodes are inserted before the first
//! rendered node of the first later sibling that has one, or appended to the
//! parent's section when no such sibling exists. Logical entities have no
//! section of their own. Their children render into the nearest ancestor
//! that has one, so the anchor scan looks inside logical siblings and
//! continues past the end of a logical parent.

use crate::document::DocumentId;
use crate::entity::{Entity, EntityId, EntityKind};
use crate::error::{EntityError, EntityResult};
use crate::expression::Expression;
use crate::markup::{Markup, MarkupId};
use crate::section::Section;
use tracing::trace;

#[derive(Debug)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

#[derive(Debug)]
pub struct EntityTree {
    document: DocumentId,
    slots: Vec<Slot>,
    free: Vec<u32>,
    markup: Markup,
    /// Root entity and the container it is mounted into
    root_host: Option<(EntityId, MarkupId)>,
}

impl EntityTree {
    pub fn new(document: DocumentId) -> Self {
        Self {
            document,
            slots: Vec::new(),
            free: Vec::new(),
            markup: Markup::new(),
            root_host: None,
        }
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn markup(&self) -> &Markup {
        &self.markup
    }

    pub(crate) fn markup_mut(&mut self) -> &mut Markup {
        &mut self.markup
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entity.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_ok()
    }

    pub fn get(&self, id: EntityId) -> EntityResult<&Entity> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_ref())
            .ok_or(EntityError::UnknownEntity(id))
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> EntityResult<&mut Entity> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_mut())
            .ok_or(EntityError::UnknownEntity(id))
    }

    pub fn children(&self, id: EntityId) -> EntityResult<&[EntityId]> {
        Ok(self.get(id)?.children())
    }

    pub fn parent(&self, id: EntityId) -> EntityResult<Option<EntityId>> {
        Ok(self.get(id)?.parent)
    }

    fn alloc(&mut self, entity: Entity) -> EntityId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entity = Some(entity);
                EntityId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entity: Some(entity),
                });
                EntityId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        }
    }

    fn release_slot(&mut self, id: EntityId) -> EntityResult<Entity> {
        self.get(id)?;
        let slot = &mut self.slots[id.index as usize];
        let entity = slot.entity.take().ok_or(EntityError::UnknownEntity(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Ok(entity)
    }

    /// Build an unattached subtree for `expression`
    pub fn create(&mut self, expression: &Expression) -> EntityResult<EntityId> {
        let mut entity = Entity::from_expression(expression);
        entity.section = self.create_section(&entity);
        let id = self.alloc(entity);

        for child in expression.children() {
            let child_id = self.create(child)?;
            self.append_child(id, child_id)?;
        }

        trace!(entity = %id, name = %expression.node_name(), "created");
        Ok(id)
    }

    fn create_section(&mut self, entity: &Entity) -> Option<Section> {
        match entity.kind {
            EntityKind::Element => {
                let node = self.markup.create_element(&entity.node_name);
                for (name, value) in &entity.attributes {
                    self.markup.set_attribute(node, name, Some(value));
                }
                if let Some(style) = self.markup.style_mut(node) {
                    for (name, value) in entity.style.iter() {
                        style.set_property(name, Some(value));
                    }
                }
                Some(Section::node(node))
            }
            EntityKind::Text => Some(Section::node(self.markup.create_text(&entity.value))),
            EntityKind::Comment => Some(Section::node(self.markup.create_comment(&entity.value))),
            EntityKind::Group => Some(Section::group(&mut self.markup, &entity.node_name)),
            EntityKind::Logical => None,
        }
    }

    pub fn append_child(&mut self, parent: EntityId, child: EntityId) -> EntityResult<()> {
        let index = self.children(parent)?.len();
        self.insert_child(parent, index, child)
    }

    /// Insert `child` at `index` under `parent`, moving it from any previous parent
    pub fn insert_child(&mut self, parent: EntityId, index: usize, child: EntityId) -> EntityResult<()> {
        self.get(child)?;
        if self.is_ancestor_or_self(child, parent)? {
            return Err(EntityError::CyclicInsert { parent, child });
        }

        if let Some(previous) = self.get(child)?.parent {
            self.detach_child(previous, child)?;
        }

        let parent_entity = self.get_mut(parent)?;
        if parent_entity.children.contains(&child) {
            return Err(EntityError::DuplicateChild { parent, child });
        }
        let index = index.min(parent_entity.children.len());
        parent_entity.children.insert(index, child);
        let document = parent_entity.document;

        self.get_mut(child)?.parent = Some(parent);
        self.set_document(child, document)?;
        self.mount(parent, child)
    }

    fn is_ancestor_or_self(&self, candidate: EntityId, id: EntityId) -> EntityResult<bool> {
        let mut current = Some(id);
        while let Some(entity) = current {
            if entity == candidate {
                return Ok(true);
            }
            current = self.get(entity)?.parent;
        }
        Ok(false)
    }

    fn mount(&mut self, parent: EntityId, child: EntityId) -> EntityResult<()> {
        let nodes = self.rendered_nodes(child)?;
        if nodes.is_empty() {
            return Ok(());
        }
        let Some(host) = self.host_section(parent)? else {
            return Ok(());
        };

        match self.find_anchor(parent, child)? {
            Some(before) => host.insert_nodes_before(&mut self.markup, &nodes, before),
            None => host.append_nodes(&mut self.markup, &nodes),
        }
        Ok(())
    }

    /// Mount `root` as the top of the rendered output inside `container`
    pub(crate) fn mount_root(&mut self, root: EntityId, container: MarkupId) -> EntityResult<()> {
        for node in self.rendered_nodes(root)? {
            self.markup.append_child(container, node);
        }
        self.root_host = Some((root, container));
        Ok(())
    }

    /// Section that `id`'s children render into
    fn host_section(&self, id: EntityId) -> EntityResult<Option<Section>> {
        let mut current = id;
        loop {
            let entity = self.get(current)?;
            if let Some(section) = entity.section {
                return Ok(Some(section));
            }
            match entity.parent {
                Some(parent) => current = parent,
                None => {
                    return Ok(self
                        .root_host
                        .filter(|(root, _)| *root == current)
                        .map(|(_, container)| Section::node(container)));
                }
            }
        }
    }

    /// Top-level rendered nodes of `id`, looking through logical entities
    pub fn rendered_nodes(&self, id: EntityId) -> EntityResult<Vec<MarkupId>> {
        let entity = self.get(id)?;
        match entity.section {
            Some(section) => Ok(section.nodes(&self.markup)),
            None => {
                let mut nodes = Vec::new();
                for child in &entity.children {
                    nodes.extend(self.rendered_nodes(*child)?);
                }
                Ok(nodes)
            }
        }
    }

    fn first_rendered_node(&self, id: EntityId) -> EntityResult<Option<MarkupId>> {
        let entity = self.get(id)?;
        if let Some(section) = entity.section {
            return Ok(Some(section.first_node()));
        }
        for child in &entity.children {
            if let Some(node) = self.first_rendered_node(*child)? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// First rendered node after `child`, bounded by the host section
    fn find_anchor(&self, parent: EntityId, child: EntityId) -> EntityResult<Option<MarkupId>> {
        let (mut parent, mut child) = (parent, child);
        loop {
            let siblings = self.children(parent)?;
            let position = siblings
                .iter()
                .position(|id| *id == child)
                .ok_or(EntityError::NotAttached { parent, child })?;

            for sibling in &siblings[position + 1..] {
                if let Some(node) = self.first_rendered_node(*sibling)? {
                    return Ok(Some(node));
                }
            }

            let entity = self.get(parent)?;
            match (entity.section, entity.parent) {
                (None, Some(grandparent)) => {
                    child = parent;
                    parent = grandparent;
                }
                _ => return Ok(None),
            }
        }
    }

    fn unmount(&mut self, id: EntityId) -> EntityResult<()> {
        if let Some(section) = self.get(id)?.section {
            section.unmount(&mut self.markup);
            return Ok(());
        }
        for child in self.get(id)?.children.clone() {
            self.unmount(child)?;
        }
        Ok(())
    }

    /// Unlink `child` from `parent`, keeping it alive
    pub fn detach_child(&mut self, parent: EntityId, child: EntityId) -> EntityResult<()> {
        let parent_entity = self.get_mut(parent)?;
        let position = parent_entity
            .children
            .iter()
            .position(|id| *id == child)
            .ok_or(EntityError::NotAttached { parent, child })?;
        parent_entity.children.remove(position);

        self.get_mut(child)?.parent = None;
        self.set_document(child, None)?;
        self.unmount(child)
    }

    /// Unlink `child` from `parent` and dispose it
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> EntityResult<()> {
        self.detach_child(parent, child)?;
        self.dispose(child)
    }

    /// Reposition an existing child without tearing down its section
    pub fn move_child(&mut self, parent: EntityId, child: EntityId, index: usize) -> EntityResult<()> {
        self.detach_child(parent, child)?;
        self.insert_child(parent, index, child)
    }

    /// Free `id` and its descendants along with their rendered output
    pub fn dispose(&mut self, id: EntityId) -> EntityResult<()> {
        if let Some(parent) = self.get(id)?.parent {
            self.detach_child(parent, id)?;
        }
        self.release(id)
    }

    fn release(&mut self, id: EntityId) -> EntityResult<()> {
        if self.root_host.is_some_and(|(root, _)| root == id) {
            self.root_host = None;
        }
        let entity = self.release_slot(id)?;
        for child in entity.children {
            self.release(child)?;
        }
        if let Some(section) = entity.section {
            section.dispose(&mut self.markup);
        }
        Ok(())
    }

    /// Set the owning document on `id` and its descendants
    pub fn set_document(&mut self, id: EntityId, document: Option<DocumentId>) -> EntityResult<()> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let entity = self.get_mut(current)?;
            entity.document = document;
            stack.extend(entity.children.iter().copied());
        }
        Ok(())
    }

    /// Pre-order search from `root`, logical entities included
    pub fn find<F>(&self, root: EntityId, mut predicate: F) -> EntityResult<Option<EntityId>>
    where
        F: FnMut(EntityId, &Entity) -> bool,
    {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let entity = self.get(current)?;
            if predicate(current, entity) {
                return Ok(Some(current));
            }
            stack.extend(entity.children.iter().rev().copied());
        }
        Ok(None)
    }

    /// Every entity under `root` in pre-order, `root` first
    pub fn walk(&self, root: EntityId) -> EntityResult<Vec<EntityId>> {
        let mut visited = Vec::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            visited.push(current);
            stack.extend(self.get(current)?.children.iter().rev().copied());
        }
        Ok(visited)
    }

    /// Rendered output of `id`. Logical entities render their children.
    pub fn to_html(&self, id: EntityId) -> EntityResult<String> {
        let entity = self.get(id)?;
        match entity.section {
            Some(section) => Ok(section
                .nodes(&self.markup)
                .into_iter()
                .map(|node| self.markup.to_html(node))
                .collect()),
            None => entity
                .children
                .iter()
                .map(|child| self.to_html(*child))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> EntityTree {
        EntityTree::new(DocumentId::next())
    }

    fn text_of(tree: &EntityTree, ids: &[EntityId]) -> Vec<String> {
        ids.iter()
            .map(|id| tree.get(*id).unwrap().value().to_string())
            .collect()
    }

    #[test]
    fn test_create_renders_subtree() {
        let mut tree = tree();
        let root = tree
            .create(
                &Expression::element("ul")
                    .with_attr("class", "list")
                    .with_child(Expression::element("li").with_child(Expression::text("a")))
                    .with_child(Expression::element("li").with_child(Expression::text("b"))),
            )
            .unwrap();

        assert_eq!(tree.len(), 5);
        assert_eq!(
            tree.to_html(root).unwrap(),
            "<ul class=\"list\"><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_parent_and_children_agree() {
        let mut tree = tree();
        let root = tree
            .create(&Expression::element("div").with_child(Expression::text("x")))
            .unwrap();
        let child = tree.children(root).unwrap()[0];
        assert_eq!(tree.parent(child).unwrap(), Some(root));
        assert_eq!(tree.parent(root).unwrap(), None);
    }

    #[test]
    fn test_insert_uses_next_rendered_sibling() {
        let mut tree = tree();
        let root = tree
            .create(
                &Expression::element("div")
                    .with_child(Expression::text("a"))
                    .with_child(Expression::logical("if"))
                    .with_child(Expression::text("c")),
            )
            .unwrap();

        let b = tree.create(&Expression::text("b")).unwrap();
        tree.insert_child(root, 1, b).unwrap();

        assert_eq!(tree.to_html(root).unwrap(), "<div>abc</div>");
        let children = tree.children(root).unwrap().to_vec();
        assert_eq!(text_of(&tree, &children), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_insert_before_group_uses_start_marker() {
        let mut tree = tree();
        let root = tree
            .create(
                &Expression::element("div")
                    .with_child(Expression::group("slot").with_child(Expression::text("inner"))),
            )
            .unwrap();

        let lead = tree.create(&Expression::text("lead-")).unwrap();
        tree.insert_child(root, 0, lead).unwrap();
        assert_eq!(tree.to_html(root).unwrap(), "<div>lead-inner</div>");
    }

    #[test]
    fn test_children_of_group_render_between_markers() {
        let mut tree = tree();
        let root = tree
            .create(
                &Expression::element("p")
                    .with_child(Expression::group("slot").with_child(Expression::text("x")))
                    .with_child(Expression::text("!")),
            )
            .unwrap();
        let group = tree.children(root).unwrap()[0];
        let y = tree.create(&Expression::text("y")).unwrap();
        tree.append_child(group, y).unwrap();

        assert_eq!(tree.to_html(root).unwrap(), "<p>xy!</p>");
    }

    #[test]
    fn test_insert_moves_from_previous_parent() {
        let mut tree = tree();
        let a = tree
            .create(&Expression::element("a").with_child(Expression::text("t")))
            .unwrap();
        let b = tree.create(&Expression::element("b")).unwrap();
        let t = tree.children(a).unwrap()[0];

        tree.append_child(b, t).unwrap();
        assert!(tree.children(a).unwrap().is_empty());
        assert_eq!(tree.parent(t).unwrap(), Some(b));
        assert_eq!(tree.to_html(a).unwrap(), "<a></a>");
        assert_eq!(tree.to_html(b).unwrap(), "<b>t</b>");
    }

    #[test]
    fn test_cyclic_insert_rejected() {
        let mut tree = tree();
        let root = tree
            .create(&Expression::element("div").with_child(Expression::element("span")))
            .unwrap();
        let span = tree.children(root).unwrap()[0];
        assert!(matches!(
            tree.append_child(span, root),
            Err(EntityError::CyclicInsert { .. })
        ));
    }

    #[test]
    fn test_dispose_invalidates_handles() {
        let mut tree = tree();
        let root = tree
            .create(&Expression::element("div").with_child(Expression::text("x")))
            .unwrap();
        let child = tree.children(root).unwrap()[0];

        tree.remove_child(root, child).unwrap();
        assert!(!tree.contains(child));
        assert_eq!(tree.to_html(root).unwrap(), "<div></div>");

        // Reused slot gets a new generation
        let again = tree.create(&Expression::text("y")).unwrap();
        assert_ne!(again, child);
        assert!(matches!(tree.get(child), Err(EntityError::UnknownEntity(_))));
    }

    #[test]
    fn test_dispose_frees_markup() {
        let mut tree = tree();
        let root = tree
            .create(
                &Expression::element("div")
                    .with_child(Expression::group("g").with_child(Expression::text("x"))),
            )
            .unwrap();
        tree.dispose(root).unwrap();
        assert!(tree.is_empty());
        assert!(tree.markup().is_empty());
    }

    #[test]
    fn test_find_reaches_logical_entities() {
        let mut tree = tree();
        let root = tree
            .create(
                &Expression::element("div").with_child(
                    Expression::logical("repeat")
                        .with_attr("each", "items")
                        .with_child(Expression::text("row")),
                ),
            )
            .unwrap();

        let found = tree
            .find(root, |_, entity| entity.attribute("each") == Some("items"))
            .unwrap()
            .unwrap();
        assert_eq!(tree.get(found).unwrap().node_name(), "repeat");

        let names: Vec<_> = tree
            .walk(root)
            .unwrap()
            .into_iter()
            .map(|id| tree.get(id).unwrap().node_name().to_string())
            .collect();
        assert_eq!(names, vec!["div", "repeat", "#text"]);
    }

    #[test]
    fn test_logical_children_render_into_host() {
        let mut tree = tree();
        let root = tree
            .create(
                &Expression::element("ul")
                    .with_child(
                        Expression::logical("repeat")
                            .with_child(Expression::text("a"))
                            .with_child(Expression::text("c")),
                    )
                    .with_child(Expression::text("!")),
            )
            .unwrap();
        assert_eq!(tree.to_html(root).unwrap(), "<ul>ac!</ul>");

        let repeat = tree.children(root).unwrap()[0];
        let b = tree.create(&Expression::text("b")).unwrap();
        tree.insert_child(repeat, 1, b).unwrap();
        assert_eq!(tree.to_html(root).unwrap(), "<ul>abc!</ul>");

        // Appending to the logical entity stops before the sibling that follows it
        let d = tree.create(&Expression::text("d")).unwrap();
        tree.append_child(repeat, d).unwrap();
        assert_eq!(tree.to_html(root).unwrap(), "<ul>abcd!</ul>");
        assert_eq!(tree.to_html(repeat).unwrap(), "abcd");
    }

    #[test]
    fn test_anchor_looks_inside_logical_siblings() {
        let mut tree = tree();
        let root = tree
            .create(
                &Expression::element("p")
                    .with_child(Expression::logical("if"))
                    .with_child(Expression::logical("each").with_child(Expression::text("y"))),
            )
            .unwrap();

        let x = tree.create(&Expression::text("x")).unwrap();
        tree.insert_child(root, 0, x).unwrap();
        assert_eq!(tree.to_html(root).unwrap(), "<p>xy</p>");
    }

    #[test]
    fn test_moving_logical_entity_moves_its_children() {
        let mut tree = tree();
        let root = tree
            .create(
                &Expression::element("div")
                    .with_child(
                        Expression::logical("if")
                            .with_child(Expression::element("b"))
                            .with_child(Expression::group("g").with_child(Expression::text("1"))),
                    )
                    .with_child(Expression::text("tail")),
            )
            .unwrap();
        let logical = tree.children(root).unwrap()[0];

        tree.move_child(root, logical, 1).unwrap();
        assert_eq!(tree.to_html(root).unwrap(), "<div>tail<b></b>1</div>");

        tree.remove_child(root, logical).unwrap();
        assert_eq!(tree.to_html(root).unwrap(), "<div>tail</div>");
    }

    #[test]
    fn test_inline_style_becomes_declaration() {
        let mut tree = tree();
        let root = tree
            .create(&Expression::element("div").with_attr("style", "color: red"))
            .unwrap();
        let entity = tree.get(root).unwrap();
        assert!(entity.attribute("style").is_none());
        assert_eq!(entity.style().get_property("color"), Some("red"));
        assert_eq!(tree.to_html(root).unwrap(), "<div style=\"color:red;\"></div>");
    }
}
