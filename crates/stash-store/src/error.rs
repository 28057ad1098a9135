/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The caller passed an empty or malformed identifier.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A blob is already stored under this identifier.
    #[error("blob already exists: {0}")]
    AlreadyExists(String),

    /// No blob is stored under this identifier.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The payload stream failed while it was being consumed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` for [`StoreError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    /// Returns `true` for [`StoreError::InvalidArgument`].
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Reject empty identifiers before any store state is touched.
pub(crate) fn validate_identifier(identifier: &str) -> StoreResult<()> {
    if identifier.is_empty() {
        return Err(StoreError::InvalidArgument(
            "identifier must not be empty".into(),
        ));
    }
    Ok(())
}
