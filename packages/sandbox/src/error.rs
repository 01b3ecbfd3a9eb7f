use crate::synthetic::SyntheticKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SandboxError {
    #[error("Cannot patch {expected} with {found}")]
    IncompatiblePatch {
        expected: SyntheticKind,
        found: SyntheticKind,
    },

    #[error("Value of kind {0} is not callable")]
    NotCallable(SyntheticKind),

    #[error("Cannot set property '{name}' on {kind}")]
    NotAnObject { kind: SyntheticKind, name: String },

    #[error("Function rejected: {0}")]
    Rejected(String),
}

pub type SandboxResult<T> = Result<T, SandboxError>;
