use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CssError {
    #[error("Invalid declaration '{0}': expected `name: value`")]
    InvalidDeclaration(String),
}

pub type CssResult<T> = Result<T, CssError>;
