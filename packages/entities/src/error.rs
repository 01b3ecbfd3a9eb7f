use crate::entity::EntityId;
use tandem_common::CommonError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    #[error("Entity {0} does not exist (disposed or stale handle)")]
    UnknownEntity(EntityId),

    #[error("Cannot patch {current} with {next}: kind or node name differs")]
    IncompatiblePatch { current: String, next: String },

    #[error("Entity {child} appears more than once under {parent}")]
    DuplicateChild { parent: EntityId, child: EntityId },

    #[error("Entity {child} is not a child of {parent}")]
    NotAttached { parent: EntityId, child: EntityId },

    #[error("Inserting {child} under {parent} would create a cycle")]
    CyclicInsert { parent: EntityId, child: EntityId },

    #[error("Edit error: {0}")]
    Edit(#[from] CommonError),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),
}

pub type EntityResult<T> = Result<T, EntityError>;
