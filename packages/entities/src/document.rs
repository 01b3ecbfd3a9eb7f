//! A loaded document: one entity tree, its rendered output, and the source it
//! was last loaded from.

use crate::entity::{Entity, EntityId};
use crate::error::EntityResult;
use crate::expression::Expression;
use crate::markup::MarkupId;
use crate::patch::PatchSummary;
use crate::tree::EntityTree;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info, instrument};

static NEXT_DOCUMENT_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(u32);

impl DocumentId {
    pub fn next() -> Self {
        DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// What [`EntityDocument::load`] did with the new source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum LoadOutcome {
    /// First load
    Created,
    /// Source identical to the previous load
    Unchanged,
    /// New root was compatible and patched into the old one
    Patched { summary: PatchSummary },
    /// New root was incompatible and replaced the old one
    Replaced,
}

#[derive(Debug)]
pub struct EntityDocument {
    path: PathBuf,
    tree: EntityTree,
    body: MarkupId,
    root: Option<EntityId>,
    source: Option<Expression>,
}

impl EntityDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let mut tree = EntityTree::new(DocumentId::next());
        let body = tree.markup_mut().create_fragment();
        Self {
            path: path.into(),
            tree,
            body,
            root: None,
            source: None,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.tree.document()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> Option<EntityId> {
        self.root
    }

    pub fn tree(&self) -> &EntityTree {
        &self.tree
    }

    pub fn source(&self) -> Option<&Expression> {
        self.source.as_ref()
    }

    pub fn get(&self, id: EntityId) -> EntityResult<&Entity> {
        self.tree.get(id)
    }

    /// Build entities for `expression` and reconcile them with the current root
    #[instrument(skip(self, expression), fields(document = %self.id(), path = %self.path.display()))]
    pub fn load(&mut self, expression: Expression) -> EntityResult<LoadOutcome> {
        if self.root.is_some() && self.source.as_ref() == Some(&expression) {
            debug!("source unchanged");
            return Ok(LoadOutcome::Unchanged);
        }

        let next = self.tree.create(&expression)?;
        let outcome = match self.root {
            Some(root) if self.tree.get(root)?.is_compatible(self.tree.get(next)?) => {
                let summary = self.tree.patch(root, next)?;
                LoadOutcome::Patched { summary }
            }
            Some(root) => {
                debug!("root changed kind, replacing");
                self.tree.dispose(root)?;
                self.mount_root(next)?;
                LoadOutcome::Replaced
            }
            None => {
                self.mount_root(next)?;
                LoadOutcome::Created
            }
        };

        self.source = Some(expression);
        info!(?outcome, entities = self.tree.len(), "loaded");
        Ok(outcome)
    }

    fn mount_root(&mut self, root: EntityId) -> EntityResult<()> {
        self.tree.set_document(root, Some(self.id()))?;
        self.tree.mount_root(root, self.body)?;
        self.root = Some(root);
        Ok(())
    }

    /// Pre-order search over the whole document
    pub fn find<F>(&self, predicate: F) -> EntityResult<Option<EntityId>>
    where
        F: FnMut(EntityId, &Entity) -> bool,
    {
        match self.root {
            Some(root) => self.tree.find(root, predicate),
            None => Ok(None),
        }
    }

    pub fn to_html(&self) -> String {
        self.tree.markup().to_html(self.body)
    }

    /// Drop the loaded tree; the next load starts from scratch
    pub fn dispose(&mut self) -> EntityResult<()> {
        if let Some(root) = self.root.take() {
            self.tree.dispose(root)?;
        }
        self.source = None;
        Ok(())
    }
}
