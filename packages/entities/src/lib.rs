//! # Tandem Entities
//!
//! Long-lived entity trees built from declarative expressions, rendered into an
//! in-memory markup arena, and reconciled in place when a new expression is
//! loaded.
//!
//! ```rust,ignore
//! let mut document = EntityDocument::new("home.json");
//! document.load(Expression::element("ul").with_child(Expression::element("li")))?;
//! // Compatible roots are patched: ids and rendered nodes survive
//! document.load(Expression::element("ul"))?;
//! ```

pub mod document;
pub mod entity;
pub mod error;
pub mod expression;
pub mod markup;
pub mod patch;
pub mod section;
pub mod tree;

pub use document::{DocumentId, EntityDocument, LoadOutcome};
pub use entity::{Entity, EntityId, EntityKind};
pub use error::{EntityError, EntityResult};
pub use expression::Expression;
pub use markup::{Markup, MarkupId, MarkupKind};
pub use patch::PatchSummary;
pub use section::Section;
pub use tree::EntityTree;
