use opsboard_core::{ConfigError, Difficulty, OperationStatus, Priority};
use opsboard_storage::StorageError;

/// Errors from reward computation.
///
/// A missing table entry means the configuration does not cover a fixed
/// enumeration member. It is reported, never defaulted.
#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    #[error("no base XP configured for difficulty '{0}'")]
    MissingDifficulty(Difficulty),

    #[error("no bonus configured for priority '{0}'")]
    MissingPriority(Priority),

    #[error("reward arithmetic overflow: {0}")]
    Overflow(String),
}

/// Errors from the progression flows.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Reward(#[from] RewardError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The persistence collaborator failed. The storage error is carried as-is.
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("operation '{operation_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        operation_id: String,
        from: OperationStatus,
        to: OperationStatus,
    },

    #[error("operator '{operator_id}' already holds {limit} active operations")]
    ActiveLimitReached { operator_id: String, limit: u32 },

    #[error("operation '{operation_id}' is not assigned to operator '{operator_id}'")]
    NotAssignee {
        operation_id: String,
        operator_id: String,
    },
}
