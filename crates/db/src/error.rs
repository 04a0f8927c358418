use tracker_core::error::CoreError;

/// Error type for store operations.
///
/// Wraps [`CoreError`] for domain outcomes (`NotFound`, `InvalidArgument`)
/// and carries any unexpected database failure as a storage fault.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A domain-level error from `tracker_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Connectivity loss, constraint violation, serialization conflict, ...
    #[error("Storage fault: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Convenience type alias for store return values.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(CoreError::NotFound { .. }))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::Core(CoreError::InvalidArgument { .. }))
    }

    pub fn is_storage_fault(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
