//! Repository for the `comments` table.
//!
//! Each mutation updates the comment row and appends one revision on the same
//! connection. The pool-level methods open their own transaction and commit
//! only after both writes succeed; dropping an uncommitted transaction rolls
//! it back. The `*_in` variants run inside a transaction owned by the caller.

use sqlx::{PgConnection, PgPool};
use tracker_core::error::CoreError;
use tracker_core::markup::{is_known_markup, markup_or_default, normalize_patch_markup};
use tracker_core::pagination::{Page, PageParams};
use tracker_core::revision::RevisionType;
use tracker_core::types::{new_id, DbId, IdentityId};

use crate::error::{StoreError, StoreResult};
use crate::models::comment::{Comment, CommentWithTotal, CreateComment, UpdateComment};
use crate::repositories::comment_revision_repo::CommentRevisionRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, parent_id, body, markup, created_at, updated_at";

/// Entity name used in not-found errors.
const ENTITY: &str = "comment";

/// Provides CRUD operations for comments, recording a revision per mutation.
pub struct CommentRepo;

impl CommentRepo {
    // ── Mutations ────────────────────────────────────────────────────

    /// Insert a new comment and its `create` revision.
    pub async fn create(
        pool: &PgPool,
        input: &CreateComment,
        creator: IdentityId,
    ) -> StoreResult<Comment> {
        let result: StoreResult<Comment> = async {
            let mut tx = pool.begin().await?;
            let comment = Self::create_in(&mut *tx, input, creator).await?;
            tx.commit().await?;
            Ok(comment)
        }
        .await;
        match &result {
            Ok(comment) => {
                tracing::debug!(comment_id = %comment.id, actor = %creator, "Comment created");
            }
            Err(e) => {
                tracing::error!(
                    parent_id = %input.parent_id,
                    actor = %creator,
                    operation = "create",
                    error = %e,
                    "Unable to create the comment",
                );
            }
        }
        result
    }

    /// Insert a new comment and its `create` revision on `conn`.
    pub async fn create_in(
        conn: &mut PgConnection,
        input: &CreateComment,
        creator: IdentityId,
    ) -> StoreResult<Comment> {
        let markup = markup_or_default(&input.markup);
        note_unknown_markup(markup);
        let query = format!(
            "INSERT INTO comments (id, parent_id, body, markup)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let comment = sqlx::query_as::<_, Comment>(&query)
            .bind(new_id())
            .bind(&input.parent_id)
            .bind(&input.body)
            .bind(markup)
            .fetch_one(&mut *conn)
            .await?;

        CommentRevisionRepo::append(conn, creator, RevisionType::Create, &comment).await?;
        Ok(comment)
    }

    /// Apply a patch to a comment and append an `update` revision.
    ///
    /// Fails with `NotFound` if the comment does not exist or was deleted.
    pub async fn save(
        pool: &PgPool,
        id: DbId,
        input: &UpdateComment,
        modifier: IdentityId,
    ) -> StoreResult<Comment> {
        let result: StoreResult<Comment> = async {
            let mut tx = pool.begin().await?;
            let comment = Self::save_in(&mut *tx, id, input, modifier).await?;
            tx.commit().await?;
            Ok(comment)
        }
        .await;
        log_outcome("save", id, modifier, result.as_ref().err());
        result
    }

    /// Apply a patch to a comment and append an `update` revision on `conn`.
    ///
    /// The row is locked for the rest of the transaction before the patch is
    /// applied, so concurrent saves of one comment serialize.
    pub async fn save_in(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateComment,
        modifier: IdentityId,
    ) -> StoreResult<Comment> {
        let locked: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM comments WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        if locked.is_none() {
            return Err(CoreError::not_found(ENTITY, id).into());
        }

        let markup = normalize_patch_markup(input.markup.as_deref());
        if let Some(m) = markup {
            note_unknown_markup(m);
        }
        let query = format!(
            "UPDATE comments SET
                body = COALESCE($2, body),
                markup = COALESCE($3, markup),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let comment = sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(input.body.as_deref())
            .bind(markup)
            .fetch_one(&mut *conn)
            .await?;

        CommentRevisionRepo::append(conn, modifier, RevisionType::Update, &comment).await?;
        Ok(comment)
    }

    /// Soft-delete a comment and append a `delete` revision.
    ///
    /// Fails with `NotFound` for the nil id, and whenever the delete affects no
    /// row, including when a concurrent delete got there first.
    pub async fn delete(pool: &PgPool, id: DbId, suppressor: IdentityId) -> StoreResult<()> {
        if id.is_nil() {
            return Err(CoreError::not_found(ENTITY, id).into());
        }
        let result: StoreResult<()> = async {
            let mut tx = pool.begin().await?;
            Self::delete_in(&mut *tx, id, suppressor).await?;
            tx.commit().await?;
            Ok(())
        }
        .await;
        log_outcome("delete", id, suppressor, result.as_ref().err());
        result
    }

    /// Soft-delete a comment and append a `delete` revision on `conn`.
    pub async fn delete_in(
        conn: &mut PgConnection,
        id: DbId,
        suppressor: IdentityId,
    ) -> StoreResult<()> {
        if id.is_nil() {
            return Err(CoreError::not_found(ENTITY, id).into());
        }
        let query = format!(
            "UPDATE comments SET deleted_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        let deleted = sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, id))?;

        CommentRevisionRepo::append(conn, suppressor, RevisionType::Delete, &deleted).await?;
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Load a live comment by id.
    pub async fn load(pool: &PgPool, id: DbId) -> StoreResult<Comment> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .inspect_err(|e| {
                tracing::error!(comment_id = %id, operation = "load", error = %e, "Comment query failed");
            })?
            .ok_or_else(|| CoreError::not_found(ENTITY, id).into())
    }

    /// List the live comments of a parent, newest first, with the total count
    /// of the parent's comments.
    ///
    /// The total comes from a window aggregate over the same query. When the
    /// page is empty and the window does not start at the first row, no row
    /// carried the aggregate and a count-only query supplies it instead.
    pub async fn list(
        pool: &PgPool,
        parent_id: &str,
        params: PageParams,
    ) -> StoreResult<Page<Comment>> {
        let window = params.validate()?;

        let result: Result<Page<Comment>, sqlx::Error> = async {
            let query = format!(
                "SELECT COUNT(*) OVER () AS total_count, {COLUMNS} FROM comments
                 WHERE parent_id = $1 AND deleted_at IS NULL
                 ORDER BY created_at DESC, id DESC
                 LIMIT $2 OFFSET $3"
            );
            let rows = sqlx::query_as::<_, CommentWithTotal>(&query)
                .bind(parent_id)
                .bind(window.limit())
                .bind(window.offset())
                .fetch_all(pool)
                .await?;

            let total = match rows.first() {
                Some(row) => row.total_count,
                None if window.starts_at_beginning() => 0,
                None => Self::count_live(pool, parent_id).await?,
            };
            let items = rows.into_iter().map(|r| r.comment).collect();
            Ok(Page { items, total })
        }
        .await;

        result.map_err(|e| {
            tracing::error!(parent_id, operation = "list", error = %e, "Comment list failed");
            e.into()
        })
    }

    /// Count the live comments of a parent.
    pub async fn count(pool: &PgPool, parent_id: &str) -> StoreResult<i64> {
        Self::count_live(pool, parent_id).await.map_err(|e| {
            tracing::error!(parent_id, operation = "count", error = %e, "Comment count failed");
            e.into()
        })
    }

    async fn count_live(pool: &PgPool, parent_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM comments WHERE parent_id = $1 AND deleted_at IS NULL",
        )
        .bind(parent_id)
        .fetch_one(pool)
        .await
    }
}

/// Unknown markup values are stored as given; note them for whoever renders.
fn note_unknown_markup(markup: &str) {
    if !is_known_markup(markup) {
        tracing::debug!(markup, "Storing comment with unrecognized markup");
    }
}

/// Log the outcome of a mutation on an existing comment.
///
/// Storage faults are logged as errors; a missing comment is an expected outcome.
fn log_outcome(
    operation: &'static str,
    comment_id: DbId,
    actor: IdentityId,
    error: Option<&StoreError>,
) {
    match error {
        None => {
            tracing::debug!(%comment_id, %actor, operation, "Comment mutated");
        }
        Some(e @ StoreError::Storage(_)) => {
            tracing::error!(%comment_id, %actor, operation, error = %e, "Comment mutation failed");
        }
        Some(e) => {
            tracing::warn!(%comment_id, %actor, operation, error = %e, "Comment mutation rejected");
        }
    }
}
