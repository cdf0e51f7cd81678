//! User records: the table binding and the user collaborator's errors.

pub mod entity;
pub mod error;

pub use error::*;
