//! # Tandem Common
//!
//! Diff and edit primitives shared by the entity, CSSOM and sandbox crates.
//!
//! - [`array`]: ordered edit scripts between two sequences, with move detection
//! - [`keyed`]: set/unset edits between two flat string-keyed maps
//! - [`edit`]: edit actions and the accumulator that applies them

pub mod array;
pub mod edit;
pub mod error;
pub mod keyed;

pub use array::{
    diff_array, ArrayChange, ArrayDiff, ArrayDiffVisitor, ArrayInsert, ArrayRemove, ArrayUpdate,
    Similarity,
};
pub use edit::{ContentEdit, EditAction, Editable, SetKeyValueEditAction, SET_STYLE_DECLARATION_EDIT};
pub use error::{CommonError, CommonResult};
pub use keyed::{diff_keyed, KeyedChange, KeyedDiff};
