//! Order subsystem: referential checks, the listing query and row folding.
//! The transactional writes live on [`crate::clients::OrderClient`].

pub mod error;
pub mod query;
pub mod validators;

pub use error::*;
