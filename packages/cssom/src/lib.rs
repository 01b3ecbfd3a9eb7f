//! # Tandem CSSOM
//!
//! Synthetic style declarations: a flat bag of CSS properties that can be
//! parsed from inline style text, rendered back to `cssText`, and diffed into
//! an edit accumulator that patches another declaration in place.

pub mod declaration;
pub mod edit;
pub mod error;

pub use declaration::{normalize_property_name, StyleDeclaration};
pub use edit::StyleDeclarationEdit;
pub use error::{CssError, CssResult};
