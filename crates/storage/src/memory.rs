//! In-process backend for tests, fixtures and the CLI.

use std::collections::BTreeMap;

use async_trait::async_trait;
use opsboard_core::{Operation, OperationStatus, OperatorProfile};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StorageError;
use crate::record::{ProfileDelta, ProfileRecord};
use crate::traits::{OperationSource, OperationStore, OpsboardStorage, ProfileStore};

/// A `tokio::sync::RwLock`-guarded store holding profiles by id and
/// operations in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: RwLock<BTreeMap<String, ProfileRecord>>,
    operations: RwLock<Vec<Operation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-loaded with profiles and operations.
    pub fn with_data(profiles: Vec<ProfileRecord>, operations: Vec<Operation>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|record| (record.profile.id.clone(), record))
            .collect();
        MemoryStore {
            profiles: RwLock::new(profiles),
            operations: RwLock::new(operations),
        }
    }

    /// Snapshot every profile, ordered by id.
    pub async fn profiles(&self) -> Vec<ProfileRecord> {
        self.profiles.read().await.values().cloned().collect()
    }

    /// Snapshot every operation in insertion order.
    pub async fn operations(&self) -> Vec<Operation> {
        self.operations.read().await.clone()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn create_profile(&self, profile: OperatorProfile) -> Result<(), StorageError> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.id) {
            return Err(StorageError::ProfileExists {
                operator_id: profile.id,
            });
        }
        profiles.insert(profile.id.clone(), ProfileRecord::from(profile));
        Ok(())
    }

    async fn get_profile(&self, operator_id: &str) -> Result<ProfileRecord, StorageError> {
        self.profiles
            .read()
            .await
            .get(operator_id)
            .cloned()
            .ok_or_else(|| StorageError::ProfileNotFound {
                operator_id: operator_id.to_string(),
            })
    }

    async fn apply_profile_delta(
        &self,
        operator_id: &str,
        delta: &ProfileDelta,
    ) -> Result<(), StorageError> {
        let mut profiles = self.profiles.write().await;
        let record = profiles
            .get_mut(operator_id)
            .ok_or_else(|| StorageError::ProfileNotFound {
                operator_id: operator_id.to_string(),
            })?;
        delta.apply_to(record);
        debug!(operator = operator_id, xp = record.profile.xp, "profile delta applied");
        Ok(())
    }
}

#[async_trait]
impl OperationSource for MemoryStore {
    async fn list_operations(
        &self,
        status: Option<OperationStatus>,
        limit: usize,
    ) -> Result<Vec<Operation>, StorageError> {
        let operations = self.operations.read().await;
        let matching = operations
            .iter()
            .filter(|op| status.map_or(true, |s| op.status == s))
            .cloned();
        Ok(if limit == 0 {
            matching.collect()
        } else {
            matching.take(limit).collect()
        })
    }

    async fn get_operation(&self, operation_id: &str) -> Result<Operation, StorageError> {
        self.operations
            .read()
            .await
            .iter()
            .find(|op| op.id == operation_id)
            .cloned()
            .ok_or_else(|| StorageError::OperationNotFound {
                operation_id: operation_id.to_string(),
            })
    }
}

#[async_trait]
impl OperationStore for MemoryStore {
    async fn put_operation(&self, operation: Operation) -> Result<(), StorageError> {
        let mut operations = self.operations.write().await;
        match operations.iter_mut().find(|op| op.id == operation.id) {
            Some(existing) => *existing = operation,
            None => operations.push(operation),
        }
        Ok(())
    }

    async fn transition_status(
        &self,
        operation_id: &str,
        expected: OperationStatus,
        next: OperationStatus,
        assignee: Option<&str>,
    ) -> Result<Operation, StorageError> {
        let mut operations = self.operations.write().await;
        let op = operations
            .iter_mut()
            .find(|op| op.id == operation_id)
            .ok_or_else(|| StorageError::OperationNotFound {
                operation_id: operation_id.to_string(),
            })?;
        if op.status != expected {
            return Err(StorageError::StatusConflict {
                operation_id: operation_id.to_string(),
                expected,
                actual: op.status,
            });
        }
        op.status = next;
        if let Some(assignee) = assignee {
            op.assigned_to = Some(assignee.to_string());
        }
        debug!(
            operation = operation_id,
            from = %expected,
            to = %next,
            "operation status transitioned"
        );
        Ok(op.clone())
    }
}

#[async_trait]
impl OpsboardStorage for MemoryStore {
    async fn transition_with_delta(
        &self,
        operation_id: &str,
        expected: OperationStatus,
        next: OperationStatus,
        assignee: Option<&str>,
        operator_id: &str,
        delta: &ProfileDelta,
    ) -> Result<Operation, StorageError> {
        // Lock order: operations, then profiles.
        let mut operations = self.operations.write().await;
        let mut profiles = self.profiles.write().await;

        let op = operations
            .iter_mut()
            .find(|op| op.id == operation_id)
            .ok_or_else(|| StorageError::OperationNotFound {
                operation_id: operation_id.to_string(),
            })?;
        if op.status != expected {
            return Err(StorageError::StatusConflict {
                operation_id: operation_id.to_string(),
                expected,
                actual: op.status,
            });
        }
        let record = profiles
            .get_mut(operator_id)
            .ok_or_else(|| StorageError::ProfileNotFound {
                operator_id: operator_id.to_string(),
            })?;

        op.status = next;
        if let Some(assignee) = assignee {
            op.assigned_to = Some(assignee.to_string());
        }
        delta.apply_to(record);
        debug!(
            operation = operation_id,
            operator = operator_id,
            from = %expected,
            to = %next,
            xp = record.profile.xp,
            "operation transitioned with profile delta"
        );
        Ok(op.clone())
    }
}
