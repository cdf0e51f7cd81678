//! Persistence gateway: pool ownership, transactions and generic table access.

pub mod database;
pub mod error;
pub mod resource;

pub use database::*;
pub use error::*;
pub use resource::*;
