//! Comment revision model.
//!
//! Revisions are immutable snapshots appended on every create, update and
//! delete of a comment. The content columns are NULL for delete revisions,
//! which is decoded into [`RevisionPayload::Tombstone`].

use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use tracker_core::revision::{RevisionContent, RevisionPayload, RevisionType, RevisionView};
use tracker_core::types::{DbId, IdentityId, Timestamp};

/// A row from the `comment_revisions` table.
#[derive(Debug, Clone, Serialize)]
pub struct CommentRevision {
    pub id: DbId,
    pub time: Timestamp,
    pub revision_type: RevisionType,
    pub comment_id: DbId,
    pub comment_parent_id: String,
    pub payload: RevisionPayload,
    pub modifier_identity: IdentityId,
}

impl CommentRevision {
    pub fn body(&self) -> Option<&str> {
        self.payload.body()
    }

    pub fn markup(&self) -> Option<&str> {
        self.payload.markup()
    }
}

impl RevisionView for CommentRevision {
    fn revision_type(&self) -> RevisionType {
        self.revision_type
    }

    fn payload(&self) -> &RevisionPayload {
        &self.payload
    }
}

impl<'r> FromRow<'r, PgRow> for CommentRevision {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let type_id: i16 = row.try_get("revision_type")?;
        let revision_type =
            RevisionType::try_from(type_id).map_err(|e| sqlx::Error::ColumnDecode {
                index: "revision_type".into(),
                source: Box::new(e),
            })?;

        let body: Option<String> = row.try_get("comment_body")?;
        let markup: Option<String> = row.try_get("comment_markup")?;
        let payload = match (revision_type.carries_content(), body, markup) {
            (true, Some(body), Some(markup)) => {
                RevisionPayload::Content(RevisionContent { body, markup })
            }
            (false, None, None) => RevisionPayload::Tombstone,
            _ => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "comment_body".into(),
                    source: format!("content columns do not match revision type {revision_type}")
                        .into(),
                })
            }
        };

        Ok(Self {
            id: row.try_get("id")?,
            time: row.try_get("revision_time")?,
            revision_type,
            comment_id: row.try_get("comment_id")?,
            comment_parent_id: row.try_get("comment_parent_id")?,
            payload,
            modifier_identity: row.try_get("modifier_identity")?,
        })
    }
}
