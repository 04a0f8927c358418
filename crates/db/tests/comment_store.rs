//! Integration tests for comment mutations and their revision side effects.
//!
//! Exercises `CommentRepo` against a real database:
//! - Create/save/load round trip and markup defaulting
//! - Not-found semantics for save, delete and load
//! - Each mutation appends exactly one revision, attributed to its actor
//! - A failed revision append rolls back the comment write
//! - Caller-owned transactions compose several operations

use assert_matches::assert_matches;
use sqlx::PgPool;
use tracker_core::error::CoreError;
use tracker_core::markup::{MARKUP_MARKDOWN, MARKUP_PLAIN_TEXT, SYSTEM_MARKUP_DEFAULT};
use tracker_core::revision::RevisionType;
use tracker_db::models::comment::{CreateComment, UpdateComment};
use tracker_db::repositories::{CommentRepo, CommentRevisionRepo};
use tracker_db::StoreError;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_comment(parent_id: &str, body: &str, markup: &str) -> CreateComment {
    CreateComment {
        parent_id: parent_id.to_string(),
        body: body.to_string(),
        markup: markup.to_string(),
    }
}

fn patch(body: Option<&str>, markup: Option<&str>) -> UpdateComment {
    UpdateComment {
        body: body.map(str::to_string),
        markup: markup.map(str::to_string),
    }
}

/// Make every further revision insert fail, simulating a secondary write fault.
async fn break_revision_log(pool: &PgPool) {
    sqlx::query("ALTER TABLE comment_revisions ADD CONSTRAINT ck_reject_all CHECK (false) NOT VALID")
        .execute(pool)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Create / load
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_load(pool: PgPool) {
    let actor = Uuid::new_v4();
    let created = CommentRepo::create(&pool, &new_comment("A", "Body", MARKUP_MARKDOWN), actor)
        .await
        .unwrap();

    assert!(!created.id.is_nil(), "id should be generated");
    assert_eq!(created.parent_id, "A");
    assert_eq!(created.body, "Body");
    assert_eq!(created.markup, MARKUP_MARKDOWN);
    assert_eq!(created.created_at, created.updated_at);

    let loaded = CommentRepo::load(&pool, created.id).await.unwrap();
    assert_eq!(loaded.id, created.id);
    assert_eq!(loaded.body, "Body");

    // Reading leaves the history untouched.
    let count = CommentRevisionRepo::count_by_comment(&pool, created.id)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let revisions = CommentRevisionRepo::list_by_comment(&pool, created.id)
        .await
        .unwrap();
    assert_eq!(revisions.len(), 1);
    assert_eq!(revisions[0].revision_type, RevisionType::Create);
    assert_eq!(revisions[0].modifier_identity, actor);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_defaults_empty_markup(pool: PgPool) {
    let created = CommentRepo::create(&pool, &new_comment("A", "Body", ""), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(created.markup, SYSTEM_MARKUP_DEFAULT);

    let revisions = CommentRevisionRepo::list_by_comment(&pool, created.id)
        .await
        .unwrap();
    assert_eq!(revisions[0].markup(), Some(SYSTEM_MARKUP_DEFAULT));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_markup_stored_as_given(pool: PgPool) {
    let created = CommentRepo::create(&pool, &new_comment("A", "Body", "AsciiDoc"), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(created.markup, "AsciiDoc");

    let saved = CommentRepo::save(&pool, created.id, &patch(None, Some("Textile")), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(saved.markup, "Textile");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_load_missing_is_not_found(pool: PgPool) {
    let err = CommentRepo::load(&pool, Uuid::new_v4()).await.unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::NotFound { entity: "comment", .. }));
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_applies_patch(pool: PgPool) {
    let created = CommentRepo::create(&pool, &new_comment("A", "Body", MARKUP_MARKDOWN), Uuid::new_v4())
        .await
        .unwrap();
    let modifier = Uuid::new_v4();

    let saved = CommentRepo::save(
        &pool,
        created.id,
        &patch(Some("Updated body"), Some(MARKUP_PLAIN_TEXT)),
        modifier,
    )
    .await
    .unwrap();
    assert_eq!(saved.body, "Updated body");
    assert_eq!(saved.markup, MARKUP_PLAIN_TEXT);
    assert_eq!(saved.parent_id, "A", "parent id is immutable");
    assert_eq!(saved.created_at, created.created_at);
    assert!(saved.updated_at >= created.updated_at);

    // Absent fields keep their stored value.
    let saved = CommentRepo::save(&pool, created.id, &patch(Some("Third"), None), modifier)
        .await
        .unwrap();
    assert_eq!(saved.body, "Third");
    assert_eq!(saved.markup, MARKUP_PLAIN_TEXT);

    let revisions = CommentRevisionRepo::list_by_comment(&pool, created.id)
        .await
        .unwrap();
    assert_eq!(revisions.len(), 3);
    assert_eq!(revisions[2].revision_type, RevisionType::Update);
    assert_eq!(revisions[2].body(), Some("Third"));
    assert_eq!(revisions[2].markup(), Some(MARKUP_PLAIN_TEXT));
    assert_eq!(revisions[2].modifier_identity, modifier);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_defaults_empty_markup(pool: PgPool) {
    let created = CommentRepo::create(&pool, &new_comment("A", "Body", MARKUP_MARKDOWN), Uuid::new_v4())
        .await
        .unwrap();

    let saved = CommentRepo::save(&pool, created.id, &patch(None, Some("")), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(saved.markup, SYSTEM_MARKUP_DEFAULT);

    let revisions = CommentRevisionRepo::list_by_comment(&pool, created.id)
        .await
        .unwrap();
    assert_eq!(revisions[1].markup(), Some(SYSTEM_MARKUP_DEFAULT));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_missing_is_not_found_without_revision(pool: PgPool) {
    let id = Uuid::new_v4();
    let err = CommentRepo::save(&pool, id, &patch(Some("x"), None), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_storage_fault());

    let count = CommentRevisionRepo::count_by_comment(&pool, id).await.unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_saves_both_recorded(pool: PgPool) {
    let created = CommentRepo::create(&pool, &new_comment("A", "Body", MARKUP_MARKDOWN), Uuid::new_v4())
        .await
        .unwrap();

    let first = patch(Some("from first"), None);
    let second = patch(Some("from second"), None);
    let (a, b) = tokio::join!(
        CommentRepo::save(&pool, created.id, &first, Uuid::new_v4()),
        CommentRepo::save(&pool, created.id, &second, Uuid::new_v4()),
    );
    a.unwrap();
    b.unwrap();

    let revisions = CommentRevisionRepo::list_by_comment(&pool, created.id)
        .await
        .unwrap();
    assert_eq!(revisions.len(), 3);

    // The last revision describes the state that won.
    let current = CommentRepo::load(&pool, created.id).await.unwrap();
    assert_eq!(revisions[2].body(), Some(current.body.as_str()));
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_hides_comment_and_records_tombstone(pool: PgPool) {
    let created = CommentRepo::create(&pool, &new_comment("A", "secret", MARKUP_MARKDOWN), Uuid::new_v4())
        .await
        .unwrap();
    let suppressor = Uuid::new_v4();

    CommentRepo::delete(&pool, created.id, suppressor).await.unwrap();

    let err = CommentRepo::load(&pool, created.id).await.unwrap_err();
    assert!(err.is_not_found());

    let revisions = CommentRevisionRepo::list_by_comment(&pool, created.id)
        .await
        .unwrap();
    assert_eq!(revisions.len(), 2);
    let tombstone = &revisions[1];
    assert_eq!(tombstone.revision_type, RevisionType::Delete);
    assert_eq!(tombstone.comment_id, created.id);
    assert_eq!(tombstone.comment_parent_id, "A");
    assert!(tombstone.payload.is_tombstone());
    assert_eq!(tombstone.body(), None);
    assert_eq!(tombstone.markup(), None);
    assert_eq!(tombstone.modifier_identity, suppressor);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_missing_is_not_found_without_revision(pool: PgPool) {
    let id = Uuid::new_v4();
    let err = CommentRepo::delete(&pool, id, Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());

    let count = CommentRevisionRepo::count_by_comment(&pool, id).await.unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_nil_id_is_not_found(pool: PgPool) {
    let err = CommentRepo::delete(&pool, Uuid::nil(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_delete_is_not_found(pool: PgPool) {
    let created = CommentRepo::create(&pool, &new_comment("A", "Body", ""), Uuid::new_v4())
        .await
        .unwrap();
    CommentRepo::delete(&pool, created.id, Uuid::new_v4()).await.unwrap();

    let err = CommentRepo::delete(&pool, created.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = CommentRepo::save(&pool, created.id, &patch(Some("x"), None), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let count = CommentRevisionRepo::count_by_comment(&pool, created.id)
        .await
        .unwrap();
    assert_eq!(count, 2, "only create and the first delete are recorded");
}

// ---------------------------------------------------------------------------
// Atomicity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_revision_rolls_back_create(pool: PgPool) {
    break_revision_log(&pool).await;

    let err = CommentRepo::create(&pool, &new_comment("A", "Body", ""), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_storage_fault());

    assert_eq!(CommentRepo::count(&pool, "A").await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_revision_rolls_back_save(pool: PgPool) {
    let created = CommentRepo::create(&pool, &new_comment("A", "Body", ""), Uuid::new_v4())
        .await
        .unwrap();
    break_revision_log(&pool).await;

    let err = CommentRepo::save(&pool, created.id, &patch(Some("lost"), None), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_storage_fault());

    let current = CommentRepo::load(&pool, created.id).await.unwrap();
    assert_eq!(current.body, "Body");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_revision_rolls_back_delete(pool: PgPool) {
    let created = CommentRepo::create(&pool, &new_comment("A", "Body", ""), Uuid::new_v4())
        .await
        .unwrap();
    break_revision_log(&pool).await;

    let err = CommentRepo::delete(&pool, created.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_storage_fault());

    CommentRepo::load(&pool, created.id).await.unwrap();
}

// ---------------------------------------------------------------------------
// Caller-owned transactions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_caller_transaction_rollback_discards_everything(pool: PgPool) {
    let actor = Uuid::new_v4();
    let mut tx = pool.begin().await.unwrap();
    let created = CommentRepo::create_in(&mut *tx, &new_comment("A", "Body", ""), actor)
        .await
        .unwrap();
    CommentRepo::save_in(&mut *tx, created.id, &patch(Some("Edited"), None), actor)
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert!(CommentRepo::load(&pool, created.id).await.unwrap_err().is_not_found());
    let count = CommentRevisionRepo::count_by_comment(&pool, created.id)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_caller_transaction_commit_keeps_everything(pool: PgPool) {
    let actor = Uuid::new_v4();
    let mut tx = pool.begin().await.unwrap();
    let created = CommentRepo::create_in(&mut *tx, &new_comment("A", "Body", ""), actor)
        .await
        .unwrap();
    CommentRepo::delete_in(&mut *tx, created.id, actor).await.unwrap();
    tx.commit().await.unwrap();

    let revisions = CommentRevisionRepo::list_by_comment(&pool, created.id)
        .await
        .unwrap();
    let kinds: Vec<_> = revisions.iter().map(|r| r.revision_type).collect();
    assert_eq!(kinds, vec![RevisionType::Create, RevisionType::Delete]);
}
