use thiserror::Error;

use crate::gateway::{ResourceError, StoreError};

/// Errors that can occur during user operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(i64),
    #[error("User validation error: {0}")]
    ValidationError(String),
    #[error("User database error: {0}")]
    DatabaseError(StoreError),
}

impl From<ResourceError> for UserError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::Invalid(message) => Self::ValidationError(message),
            ResourceError::Store(store) => Self::DatabaseError(store),
        }
    }
}
