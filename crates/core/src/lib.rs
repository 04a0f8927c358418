//! Domain types and pure logic for the comment store.
//!
//! Nothing in this crate touches the database, so it can be shared by the
//! repository layer and any tooling that inspects revision history.

pub mod error;
pub mod markup;
pub mod pagination;
pub mod revision;
pub mod types;
