use async_trait::async_trait;
use opsboard_core::{Operation, OperationStatus, OperatorProfile};

use crate::error::StorageError;
use crate::record::{ProfileDelta, ProfileRecord};

/// The persistence collaborator for operator profiles.
///
/// ## Write semantics
///
/// `apply_profile_delta` is last-write-wins on whatever fields the delta
/// carries. Backends perform no merging and no compare-and-swap on `xp`:
/// two awards racing on the same profile can lose an update. Callers
/// serialize awards per profile.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so they can be shared
/// across async task boundaries.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    /// Create a profile at onboarding.
    ///
    /// Returns `Err(StorageError::ProfileExists)` if the id is taken.
    async fn create_profile(&self, profile: OperatorProfile) -> Result<(), StorageError>;

    /// Read a profile.
    ///
    /// Returns `Err(StorageError::ProfileNotFound)` if the id is unknown.
    async fn get_profile(&self, operator_id: &str) -> Result<ProfileRecord, StorageError>;

    /// Write the given fields of `delta` onto the stored profile.
    ///
    /// Returns `Err(StorageError::ProfileNotFound)` if the id is unknown.
    async fn apply_profile_delta(
        &self,
        operator_id: &str,
        delta: &ProfileDelta,
    ) -> Result<(), StorageError>;
}

/// Read-only supplier of operation snapshots.
#[async_trait]
pub trait OperationSource: Send + Sync + 'static {
    /// List operations, optionally filtered by status.
    ///
    /// - `status`: keep only operations in this status
    /// - `limit`: maximum number of results (0 = no limit)
    ///
    /// Results are in the backend's natural order; no paging.
    async fn list_operations(
        &self,
        status: Option<OperationStatus>,
        limit: usize,
    ) -> Result<Vec<Operation>, StorageError>;

    /// Read one operation.
    ///
    /// Returns `Err(StorageError::OperationNotFound)` if the id is unknown.
    async fn get_operation(&self, operation_id: &str) -> Result<Operation, StorageError>;
}

/// Writable operation store with status transitions.
#[async_trait]
pub trait OperationStore: OperationSource {
    /// Insert or replace an operation.
    async fn put_operation(&self, operation: Operation) -> Result<(), StorageError>;

    /// Move an operation from `expected` to `next`.
    ///
    /// The write is conditional on the stored status equalling `expected`.
    /// If it does not, returns `Err(StorageError::StatusConflict)` and
    /// leaves the record untouched. When `assignee` is `Some`, the
    /// operation's `assigned_to` is set in the same write.
    ///
    /// Returns the updated operation.
    async fn transition_status(
        &self,
        operation_id: &str,
        expected: OperationStatus,
        next: OperationStatus,
        assignee: Option<&str>,
    ) -> Result<Operation, StorageError>;
}

/// Everything the engine and the conformance suite need from one backend.
#[async_trait]
pub trait OpsboardStorage: ProfileStore + OperationStore {
    /// Move an operation from `expected` to `next` and apply `delta` to
    /// `operator_id`'s profile as one write.
    ///
    /// Either both changes land or neither does. Returns
    /// `Err(StorageError::StatusConflict)` when the stored status is not
    /// `expected`, and `Err(StorageError::ProfileNotFound)` /
    /// `Err(StorageError::OperationNotFound)` for unknown ids; in every error
    /// case the operation and the profile are left untouched.
    ///
    /// Returns the updated operation.
    async fn transition_with_delta(
        &self,
        operation_id: &str,
        expected: OperationStatus,
        next: OperationStatus,
        assignee: Option<&str>,
        operator_id: &str,
        delta: &ProfileDelta,
    ) -> Result<Operation, StorageError>;
}
