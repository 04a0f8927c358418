//! Transition kinds, revision payloads, and history replay.
//!
//! A revision history for one entity is `create`, any number of `update`s,
//! then optionally a single `delete`. Create and update revisions carry a
//! content snapshot; a delete revision is a tombstone with no content.

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;

/// Revision type ID matching the SMALLINT `revision_type` column.
pub type RevisionTypeId = i16;

// ---------------------------------------------------------------------------
// Transition kind
// ---------------------------------------------------------------------------

/// The nature of a recorded change.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionType {
    Create = 1,
    Update = 2,
    Delete = 3,
}

impl RevisionType {
    /// Return the database ID.
    pub fn id(self) -> RevisionTypeId {
        self as RevisionTypeId
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether revisions of this kind carry a content snapshot.
    pub fn carries_content(self) -> bool {
        !matches!(self, Self::Delete)
    }
}

impl From<RevisionType> for RevisionTypeId {
    fn from(value: RevisionType) -> Self {
        value as RevisionTypeId
    }
}

impl TryFrom<RevisionTypeId> for RevisionType {
    type Error = CoreError;

    fn try_from(value: RevisionTypeId) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Create),
            2 => Ok(Self::Update),
            3 => Ok(Self::Delete),
            other => Err(CoreError::Internal(format!(
                "unknown revision type id {other}"
            ))),
        }
    }
}

impl fmt::Display for RevisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Content captured by a create or update revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionContent {
    pub body: String,
    pub markup: String,
}

/// What a revision recorded about the entity's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevisionPayload {
    Content(RevisionContent),
    Tombstone,
}

impl RevisionPayload {
    /// Build the payload a transition of `kind` records for the given snapshot.
    ///
    /// Delete transitions drop the content entirely.
    pub fn capture(kind: RevisionType, body: &str, markup: &str) -> Self {
        if kind.carries_content() {
            Self::Content(RevisionContent {
                body: body.to_string(),
                markup: markup.to_string(),
            })
        } else {
            Self::Tombstone
        }
    }

    pub fn content(&self) -> Option<&RevisionContent> {
        match self {
            Self::Content(c) => Some(c),
            Self::Tombstone => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        self.content().map(|c| c.body.as_str())
    }

    pub fn markup(&self) -> Option<&str> {
        self.content().map(|c| c.markup.as_str())
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Self::Tombstone)
    }
}

// ---------------------------------------------------------------------------
// History replay
// ---------------------------------------------------------------------------

/// Read access to one entry of an ordered revision history.
pub trait RevisionView {
    fn revision_type(&self) -> RevisionType;
    fn payload(&self) -> &RevisionPayload;
}

/// Check that `revisions` (oldest first) form a well-formed history.
///
/// An empty slice is well-formed: the entity never existed.
pub fn check_history<R: RevisionView>(revisions: &[R]) -> Result<(), CoreError> {
    for (idx, rev) in revisions.iter().enumerate() {
        let kind = rev.revision_type();
        if kind.carries_content() == rev.payload().is_tombstone() {
            return Err(CoreError::Internal(format!(
                "revision {idx} of kind {kind} has a mismatched payload"
            )));
        }
        match kind {
            RevisionType::Create if idx != 0 => {
                return Err(CoreError::Internal(format!(
                    "create revision at position {idx}"
                )));
            }
            RevisionType::Update | RevisionType::Delete if idx == 0 => {
                return Err(CoreError::Internal(format!(
                    "history starts with {kind} instead of create"
                )));
            }
            RevisionType::Delete if idx + 1 != revisions.len() => {
                return Err(CoreError::Internal(format!(
                    "delete revision at position {idx} is not the last entry"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Fold a history into the entity's final content.
///
/// Returns `None` when the history is empty or ends in a tombstone.
pub fn replay<R: RevisionView>(revisions: &[R]) -> Result<Option<&RevisionContent>, CoreError> {
    check_history(revisions)?;
    Ok(revisions.last().and_then(|r| r.payload().content()))
}
