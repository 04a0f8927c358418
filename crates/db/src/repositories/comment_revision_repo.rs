//! Repository for the `comment_revisions` table.
//!
//! The table is append-only. Appends run on the caller's connection so they
//! share the transaction of the comment write they record.

use sqlx::{PgConnection, PgPool};
use tracker_core::revision::{RevisionPayload, RevisionType};
use tracker_core::types::{new_id, DbId, IdentityId};

use crate::error::StoreResult;
use crate::models::comment::Comment;
use crate::models::comment_revision::CommentRevision;

/// Column list for comment_revisions queries.
const COLUMNS: &str = "id, revision_time, revision_type, comment_id, comment_parent_id, \
    comment_body, comment_markup, modifier_identity";

/// Provides append and history operations for comment revisions.
pub struct CommentRevisionRepo;

impl CommentRevisionRepo {
    /// Append a revision describing a `kind` transition of `snapshot`.
    ///
    /// Create and update revisions copy the snapshot's body and markup; delete
    /// revisions keep only the comment id and parent id.
    pub async fn append(
        conn: &mut PgConnection,
        actor: IdentityId,
        kind: RevisionType,
        snapshot: &Comment,
    ) -> Result<CommentRevision, sqlx::Error> {
        let payload = RevisionPayload::capture(kind, &snapshot.body, &snapshot.markup);
        let query = format!(
            "INSERT INTO comment_revisions
                (id, revision_type, comment_id, comment_parent_id, comment_body, comment_markup, modifier_identity)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CommentRevision>(&query)
            .bind(new_id())
            .bind(kind.id())
            .bind(snapshot.id)
            .bind(&snapshot.parent_id)
            .bind(payload.body())
            .bind(payload.markup())
            .bind(actor)
            .fetch_one(conn)
            .await
    }

    /// List the full history of a comment, oldest first.
    ///
    /// Ties on `revision_time` are broken by insertion order.
    pub async fn list_by_comment(
        pool: &PgPool,
        comment_id: DbId,
    ) -> StoreResult<Vec<CommentRevision>> {
        let query = format!(
            "SELECT {COLUMNS} FROM comment_revisions
             WHERE comment_id = $1
             ORDER BY revision_time ASC, seq ASC"
        );
        sqlx::query_as::<_, CommentRevision>(&query)
            .bind(comment_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                tracing::error!(%comment_id, operation = "list_by_entity", error = %e, "Comment history query failed");
                e.into()
            })
    }

    /// Count revisions recorded for a comment.
    pub async fn count_by_comment(pool: &PgPool, comment_id: DbId) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM comment_revisions WHERE comment_id = $1",
        )
        .bind(comment_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!(%comment_id, operation = "count_by_entity", error = %e, "Comment history count failed");
            e.into()
        })
    }
}
