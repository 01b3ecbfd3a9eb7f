//! # Tandem Sandbox
//!
//! Synthetic values for interpreted program state: host values lifted into
//! shared, patchable handles, plus lexically scoped symbol tables.
//!
//! Function application is the only asynchronous operation; a native function
//! may answer immediately or with a pending future.

pub mod error;
pub mod native;
pub mod symbol_table;
pub mod synthetic;

pub use error::{SandboxError, SandboxResult};
pub use native::{NativeCall, NativeFunction, NativeValue};
pub use symbol_table::SymbolTable;
pub use synthetic::{Synthetic, SyntheticKind};
