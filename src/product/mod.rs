//! Product records: the table binding and the product collaborator's errors.

pub mod entity;
pub mod error;

pub use error::*;
