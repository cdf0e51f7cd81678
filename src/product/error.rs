use thiserror::Error;

use crate::gateway::{ResourceError, StoreError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(i64),
    #[error("Product validation error: {0}")]
    ValidationError(String),
    #[error("Product database error: {0}")]
    DatabaseError(StoreError),
}

impl From<ResourceError> for ProductError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::Invalid(message) => Self::ValidationError(message),
            ResourceError::Store(store) => Self::DatabaseError(store),
        }
    }
}
