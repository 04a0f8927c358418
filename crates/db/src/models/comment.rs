//! Comment entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracker_core::types::{DbId, Timestamp};

/// A live row from the `comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub parent_id: String,
    pub body: String,
    pub markup: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new comment. An empty `markup` takes the system default.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub parent_id: String,
    pub body: String,
    #[serde(default)]
    pub markup: String,
}

/// DTO for patching a comment. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateComment {
    pub body: Option<String>,
    pub markup: Option<String>,
}

/// A comment row carrying the window-aggregate total of its result set.
#[derive(Debug, FromRow)]
pub(crate) struct CommentWithTotal {
    pub total_count: i64,
    #[sqlx(flatten)]
    pub comment: Comment,
}
