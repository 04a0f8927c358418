//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` (or a `&mut PgConnection` inside a caller transaction) as the
//! first argument.

pub mod comment_repo;
pub mod comment_revision_repo;

pub use comment_repo::CommentRepo;
pub use comment_revision_repo::CommentRevisionRepo;
