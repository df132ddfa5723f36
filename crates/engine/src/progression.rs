//! Progression coordinator.
//!
//! Applies rewards to operator profiles. An award is computed entirely in
//! memory ([`ProgressionCoordinator::plan_award`]) and then committed with a
//! single call to the persistence collaborator. Nothing is written before
//! that call, so a failed award can be retried as a whole.
//!
//! Two entry points complete work:
//!
//! - [`ProgressionCoordinator::award`] trusts the caller to invoke it once
//!   per operation, after a successful claim/submit. It does not deduplicate.
//! - [`ProgressionCoordinator::complete`] moves the operation
//!   UnderReview → Completed and writes the profile delta in one storage
//!   call, with an expected-status check. A second completion of the same
//!   operation fails with a conflict and awards nothing; a failed completion
//!   changes nothing and can be retried.
//!
//! Neither path guards the XP counter itself: two awards racing on one
//! profile can lose an update. Callers serialize awards per profile.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};

use opsboard_core::{ConfigError, EngineConfig, Operation, OperationStatus, OperatorProfile, Rank};
use opsboard_storage::{OpsboardStorage, ProfileDelta, ProfileStore};

use crate::clock::{Clock, SystemClock};
use crate::error::EngineError;
use crate::rank::RankLedger;
use crate::reward::{reward_breakdown, RewardBreakdown};

/// Outcome of one completion. Produced only after the profile write succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardResult {
    pub operation_id: String,
    pub operator_id: String,
    pub xp_earned: u64,
    /// Taken verbatim from the operation's reward descriptor.
    pub tokens: Option<Decimal>,
    pub currency: Option<String>,
    pub previous_rank: Rank,
    pub new_rank: Rank,
    pub rank_changed: bool,
    /// Cumulative XP after this award.
    pub total_xp: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub awarded_at: OffsetDateTime,
    pub breakdown: RewardBreakdown,
}

/// A computed award and the delta that commits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardPlan {
    pub result: AwardResult,
    pub delta: ProfileDelta,
}

/// Orchestrates the reward calculator and rank ledger against profiles.
pub struct ProgressionCoordinator<C = SystemClock> {
    config: EngineConfig,
    ledger: RankLedger,
    clock: C,
}

impl ProgressionCoordinator<SystemClock> {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ProgressionCoordinator<C> {
    /// Validate `config` and build a coordinator reading time from `clock`.
    pub fn with_clock(config: EngineConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let ledger = RankLedger::from_config(&config)?;
        Ok(ProgressionCoordinator {
            config,
            ledger,
            clock,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &RankLedger {
        &self.ledger
    }

    /// Compute an award without touching storage.
    ///
    /// `completion_time` defaults to the clock's now. Rank in the delta is
    /// always recomputed from the new XP total.
    pub fn plan_award(
        &self,
        profile: &OperatorProfile,
        operation: &Operation,
        completion_time: Option<OffsetDateTime>,
    ) -> Result<AwardPlan, EngineError> {
        let now = self.clock.now();
        let completed_at = completion_time.unwrap_or(now);
        let breakdown = reward_breakdown(&self.config, operation, completed_at)?;
        debug!(
            operation = %operation.id,
            base_xp = breakdown.base_xp,
            category_xp = %breakdown.category_xp,
            bonus_xp = %breakdown.bonus_xp,
            timeliness = ?breakdown.timeliness,
            total = breakdown.total,
            "reward computed"
        );

        let xp_earned = breakdown.total;
        let total_xp = profile.xp.saturating_add(xp_earned);
        let previous_rank = self.ledger.rank_for(profile.xp);
        let new_rank = self.ledger.rank_for(total_xp);
        let tokens = operation.reward.tokens;

        let delta = ProfileDelta {
            xp: Some(total_xp),
            rank: Some(new_rank),
            active_operations: Some(profile.active_operations.saturating_sub(1)),
            completed_operations: Some(profile.completed_operations.saturating_add(1)),
            tokens_earned: Some(profile.tokens_earned + tokens.unwrap_or(Decimal::ZERO)),
            last_active_at: Some(completed_at),
            updated_at: Some(now),
            ..ProfileDelta::default()
        };
        let result = AwardResult {
            operation_id: operation.id.clone(),
            operator_id: profile.id.clone(),
            xp_earned,
            tokens,
            currency: operation.reward.currency.clone(),
            previous_rank,
            new_rank,
            rank_changed: previous_rank != new_rank,
            total_xp,
            awarded_at: completed_at,
            breakdown,
        };
        Ok(AwardPlan { result, delta })
    }

    /// Credit `profile` for completing `operation` and persist the delta.
    ///
    /// The persistence call is awaited; if it fails the error is returned
    /// as-is and no [`AwardResult`] is produced.
    pub async fn award<P>(
        &self,
        profile: &OperatorProfile,
        operation: &Operation,
        completion_time: Option<OffsetDateTime>,
        persist: &P,
    ) -> Result<AwardResult, EngineError>
    where
        P: ProfileStore + ?Sized,
    {
        let AwardPlan { result, delta } = self.plan_award(profile, operation, completion_time)?;
        persist
            .apply_profile_delta(&result.operator_id, &delta)
            .await?;
        log_award(&result);
        Ok(result)
    }

    /// Claim an open operation for `profile`.
    ///
    /// Moves the operation Open → InProgress (assigning it) and increments
    /// the operator's active count in one storage call, with an
    /// expected-status check. On error neither change is made.
    pub async fn claim<S>(
        &self,
        profile: &OperatorProfile,
        operation_id: &str,
        store: &S,
    ) -> Result<Operation, EngineError>
    where
        S: OpsboardStorage + ?Sized,
    {
        let operation = store.get_operation(operation_id).await?;
        ensure_transition(&operation, OperationStatus::InProgress)?;
        let limit = self.config.max_active_operations;
        if profile.active_operations >= limit {
            return Err(EngineError::ActiveLimitReached {
                operator_id: profile.id.clone(),
                limit,
            });
        }

        let now = self.clock.now();
        let delta = ProfileDelta {
            active_operations: Some(profile.active_operations.saturating_add(1)),
            last_active_at: Some(now),
            updated_at: Some(now),
            ..ProfileDelta::default()
        };
        let claimed = store
            .transition_with_delta(
                operation_id,
                operation.status,
                OperationStatus::InProgress,
                Some(profile.id.as_str()),
                &profile.id,
                &delta,
            )
            .await?;
        info!(operator = %profile.id, operation = operation_id, "operation claimed");
        Ok(claimed)
    }

    /// Submit an in-progress operation for review.
    pub async fn submit<S>(&self, operation_id: &str, store: &S) -> Result<Operation, EngineError>
    where
        S: OpsboardStorage + ?Sized,
    {
        self.transition(operation_id, OperationStatus::UnderReview, store)
            .await
    }

    /// Cancel an operation that has not reached a terminal status.
    pub async fn cancel<S>(&self, operation_id: &str, store: &S) -> Result<Operation, EngineError>
    where
        S: OpsboardStorage + ?Sized,
    {
        self.transition(operation_id, OperationStatus::Cancelled, store)
            .await
    }

    /// Complete a reviewed operation and award `profile`, at most once.
    ///
    /// The reward is computed first. The operation is then moved
    /// UnderReview → Completed and the profile delta written in a single
    /// storage call, conditional on the stored status. A concurrent or
    /// repeated completion loses the status check and awards nothing. If the
    /// call fails, the operation stays UnderReview, the profile is
    /// unchanged, and `complete` can be retried.
    pub async fn complete<S>(
        &self,
        profile: &OperatorProfile,
        operation_id: &str,
        completion_time: Option<OffsetDateTime>,
        store: &S,
    ) -> Result<AwardResult, EngineError>
    where
        S: OpsboardStorage + ?Sized,
    {
        let operation = store.get_operation(operation_id).await?;
        ensure_transition(&operation, OperationStatus::Completed)?;
        if let Some(assignee) = &operation.assigned_to {
            if assignee != &profile.id {
                return Err(EngineError::NotAssignee {
                    operation_id: operation_id.to_string(),
                    operator_id: profile.id.clone(),
                });
            }
        }
        let AwardPlan { result, delta } = self.plan_award(profile, &operation, completion_time)?;
        store
            .transition_with_delta(
                operation_id,
                OperationStatus::UnderReview,
                OperationStatus::Completed,
                None,
                &profile.id,
                &delta,
            )
            .await?;
        log_award(&result);
        Ok(result)
    }

    async fn transition<S>(
        &self,
        operation_id: &str,
        next: OperationStatus,
        store: &S,
    ) -> Result<Operation, EngineError>
    where
        S: OpsboardStorage + ?Sized,
    {
        let operation = store.get_operation(operation_id).await?;
        ensure_transition(&operation, next)?;
        let updated = store
            .transition_status(operation_id, operation.status, next, None)
            .await?;
        info!(operation = operation_id, from = %operation.status, to = %next, "operation transitioned");
        Ok(updated)
    }
}

fn log_award(result: &AwardResult) {
    info!(
        operator = %result.operator_id,
        operation = %result.operation_id,
        xp = result.xp_earned,
        total_xp = result.total_xp,
        "award persisted"
    );
    if result.rank_changed {
        info!(
            operator = %result.operator_id,
            from = %result.previous_rank,
            to = %result.new_rank,
            "rank up"
        );
    }
}

fn ensure_transition(operation: &Operation, next: OperationStatus) -> Result<(), EngineError> {
    if operation.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition {
            operation_id: operation.id.clone(),
            from: operation.status,
            to: next,
        })
    }
}
