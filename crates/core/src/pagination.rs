//! Offset/limit validation for windowed list queries.
//!
//! Unlike clamping helpers, these reject bad input outright: a negative
//! offset or a non-positive limit is a caller error, reported before any
//! query runs.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Caller-facing pagination parameters (`?offset=&limit=`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Self {
        Self { offset, limit }
    }

    /// Validate the parameters into a [`Window`].
    pub fn validate(self) -> Result<Window, CoreError> {
        let offset = match self.offset {
            Some(o) if o < 0 => {
                return Err(CoreError::InvalidArgument {
                    name: "offset",
                    value: o,
                })
            }
            Some(o) => o,
            None => 0,
        };
        if let Some(l) = self.limit {
            if l <= 0 {
                return Err(CoreError::InvalidArgument {
                    name: "limit",
                    value: l,
                });
            }
        }
        Ok(Window {
            offset,
            limit: self.limit,
        })
    }
}

/// A validated window: `offset >= 0`, `limit` absent (unbounded) or `> 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    offset: i64,
    limit: Option<i64>,
}

impl Window {
    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    /// Whether the window starts at the first row.
    ///
    /// An empty page from such a window proves the result set is empty.
    pub fn starts_at_beginning(&self) -> bool {
        self.offset == 0
    }
}

/// One page of items plus the size of the full, unwindowed result set.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}
