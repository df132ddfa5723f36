use opsboard_core::OperationStatus;

/// All errors that can be returned by an opsboard storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No profile with the given operator id.
    #[error("profile not found: {operator_id}")]
    ProfileNotFound { operator_id: String },

    /// No operation with the given id.
    #[error("operation not found: {operation_id}")]
    OperationNotFound { operation_id: String },

    /// A profile with this operator id already exists.
    #[error("profile already exists: {operator_id}")]
    ProfileExists { operator_id: String },

    /// Expected-status check failed: another caller moved the operation first.
    #[error(
        "status conflict on operation {operation_id}: expected {expected}, found {actual}"
    )]
    StatusConflict {
        operation_id: String,
        expected: OperationStatus,
        actual: OperationStatus,
    },

    /// A backend-specific storage error (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
