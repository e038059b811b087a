use thiserror::Error;

use minaret_storage::StorageError;

/// Errors surfaced at dispatcher boundaries.
///
/// Send failures never show up here; they settle into per-recipient
/// outcomes. Only store access can abort a dispatcher operation.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_pass_through_unchanged() {
        let err: DispatchError = StorageError::not_found("Recipient", "e1").into();
        assert_eq!(err.to_string(), "Entity not found: Recipient/e1");
    }
}
