pub mod init;
pub mod patch;
pub mod scope;
pub mod style;

pub use init::{init, InitArgs};
pub use patch::{patch, PatchArgs};
pub use scope::{eval_scope, EvalScopeArgs};
pub use style::{diff_style, DiffStyleArgs};
