//! Error types for storage operations.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested entity was not found.
    #[error("Entity not found: {entity}/{id}")]
    NotFound {
        /// The kind of entity that was not found.
        entity: String,
        /// The id of the entity that was not found.
        id: String,
    },

    /// The entity data is invalid.
    #[error("Invalid entity: {message}")]
    InvalidEntity {
        /// Description of why the entity is invalid.
        message: String,
    },

    /// A batch commit failed; no update in the batch was applied.
    #[error("Batch error: {message}")]
    BatchError {
        /// Description of the batch failure.
        message: String,
    },

    /// Failed to reach the storage backend.
    #[error("Connection error: {message}")]
    ConnectionError {
        /// Description of the connection error.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a new `InvalidEntity` error.
    #[must_use]
    pub fn invalid_entity(message: impl Into<String>) -> Self {
        Self::InvalidEntity {
            message: message.into(),
        }
    }

    /// Creates a new `BatchError` error.
    #[must_use]
    pub fn batch_error(message: impl Into<String>) -> Self {
        Self::BatchError {
            message: message.into(),
        }
    }

    /// Creates a new `ConnectionError` error.
    #[must_use]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("NotificationRequest", "r1");
        assert_eq!(err.to_string(), "Entity not found: NotificationRequest/r1");

        let err = StorageError::batch_error("unknown entry s9");
        assert_eq!(err.to_string(), "Batch error: unknown entry s9");
    }

    #[test]
    fn test_error_predicates() {
        assert!(StorageError::not_found("Recipient", "e1").is_not_found());
        assert!(!StorageError::internal("boom").is_not_found());
    }
}
