use thiserror::Error;

/// Errors shared by the diff and edit primitives
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommonError {
    #[error("Unsupported edit action '{kind}' for target {target_uid}")]
    UnsupportedEditAction { kind: String, target_uid: String },
}

pub type CommonResult<T> = Result<T, CommonError>;
