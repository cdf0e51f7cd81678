use thiserror::Error;

use crate::gateway::StoreError;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order validation error: {0}")]
    ValidationError(String),
    #[error("Order not found: {0}")]
    OrderNotFound(i64),
    #[error("Users not found: {0:?}")]
    UsersNotFound(Vec<i64>),
    #[error("Products not found: {0:?}")]
    ProductsNotFound(Vec<i64>),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Order database error: {0}")]
    DatabaseError(StoreError),
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation(message) => Self::ConstraintViolation(message),
            other => Self::DatabaseError(other),
        }
    }
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::from(err).into()
    }
}
