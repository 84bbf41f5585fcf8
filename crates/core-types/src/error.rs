use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A caller-supplied request violates a constraint. The message names the constraint.
    #[error("Validation failed: {0}")]
    Validation(String),
}
