//! Domain model structs and DTOs.
//!
//! - `comment`: the mutable current-state row plus create/update DTOs
//! - `comment_revision`: the immutable history entry

pub mod comment;
pub mod comment_revision;
