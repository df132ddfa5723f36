//! Reward calculator.
//!
//! XP for a completion is computed from the operation's difficulty,
//! category, priority and deadline against the configured tables:
//!
//! 1. `base_xp` from the difficulty table
//! 2. `category_xp = base_xp * category_multiplier` (1.0 when unlisted)
//! 3. `bonus_xp = priority_bonus + category_xp * time_multiplier`
//! 4. `total = round(category_xp + bonus_xp)`, halves rounding up
//! 5. `max(total, minimum_xp)`
//!
//! All arithmetic uses `rust_decimal::Decimal` with checked operations.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use opsboard_core::{EngineConfig, Operation};

use crate::error::RewardError;

/// Where a completion falls relative to the operation's deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeliness {
    NoDeadline,
    /// More than the buffer remained.
    Early,
    /// Between zero and the buffer remained, inclusive.
    OnTime,
    /// Completed after the deadline.
    Late,
}

/// Every intermediate of one reward computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub base_xp: u64,
    pub category_multiplier: Decimal,
    pub category_xp: Decimal,
    pub priority_bonus: u64,
    pub timeliness: Timeliness,
    pub time_multiplier: Decimal,
    pub bonus_xp: Decimal,
    /// Final XP after rounding and the floor.
    pub total: u64,
    /// Whether the minimum floor raised the rounded amount.
    pub floored: bool,
}

/// Classify a completion against a deadline with the given buffer.
pub fn timeliness(
    deadline: Option<OffsetDateTime>,
    completion_time: OffsetDateTime,
    buffer: Duration,
) -> Timeliness {
    let Some(deadline) = deadline else {
        return Timeliness::NoDeadline;
    };
    let remaining = deadline - completion_time;
    if remaining > buffer {
        Timeliness::Early
    } else if remaining >= Duration::ZERO {
        Timeliness::OnTime
    } else {
        Timeliness::Late
    }
}

/// Compute the full reward breakdown for completing `operation` at
/// `completion_time`.
pub fn reward_breakdown(
    config: &EngineConfig,
    operation: &Operation,
    completion_time: OffsetDateTime,
) -> Result<RewardBreakdown, RewardError> {
    let base_xp = *config
        .difficulty_xp
        .get(&operation.difficulty)
        .ok_or(RewardError::MissingDifficulty(operation.difficulty))?;
    let priority_bonus = *config
        .priority_bonus
        .get(&operation.priority)
        .ok_or(RewardError::MissingPriority(operation.priority))?;
    let category_multiplier = config
        .category_multipliers
        .get(&operation.category)
        .copied()
        .unwrap_or(Decimal::ONE);

    let timing = &config.timing;
    let timeliness = timeliness(
        operation.deadline,
        completion_time,
        Duration::hours(timing.deadline_buffer_hours),
    );
    let time_multiplier = match timeliness {
        Timeliness::NoDeadline => Decimal::ZERO,
        Timeliness::Early => timing.early_bonus,
        Timeliness::OnTime => timing.on_time_bonus,
        Timeliness::Late => -timing.late_penalty,
    };

    let category_xp = Decimal::from(base_xp)
        .checked_mul(category_multiplier)
        .ok_or_else(|| RewardError::Overflow("category XP".to_string()))?;
    let bonus_xp = category_xp
        .checked_mul(time_multiplier)
        .and_then(|timed| timed.checked_add(Decimal::from(priority_bonus)))
        .ok_or_else(|| RewardError::Overflow("bonus XP".to_string()))?;
    let raw = category_xp
        .checked_add(bonus_xp)
        .ok_or_else(|| RewardError::Overflow("total XP".to_string()))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    let rounded = if raw.is_sign_negative() {
        0
    } else {
        raw.to_u64()
            .ok_or_else(|| RewardError::Overflow(format!("total XP {} exceeds u64", raw)))?
    };
    let total = rounded.max(config.minimum_xp);

    Ok(RewardBreakdown {
        base_xp,
        category_multiplier,
        category_xp,
        priority_bonus,
        timeliness,
        time_multiplier,
        bonus_xp,
        total,
        floored: total > rounded,
    })
}

/// XP earned for completing `operation` at `completion_time`.
///
/// Always at least `config.minimum_xp`.
pub fn compute_reward(
    config: &EngineConfig,
    operation: &Operation,
    completion_time: OffsetDateTime,
) -> Result<u64, RewardError> {
    reward_breakdown(config, operation, completion_time).map(|b| b.total)
}

/// The XP an operator would earn by finishing `operation` at `now`, for
/// display on the board.
pub fn preview_reward(
    config: &EngineConfig,
    operation: &Operation,
    now: OffsetDateTime,
) -> Result<u64, RewardError> {
    compute_reward(config, operation, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsboard_core::{Category, Difficulty, Priority};
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

    fn op(category: Category, difficulty: Difficulty, priority: Priority) -> Operation {
        Operation::new("op-1", "test", category, difficulty, priority)
    }

    #[test]
    fn beginner_development_medium_no_deadline_is_85() {
        let b = reward_breakdown(
            &EngineConfig::default(),
            &op(Category::Development, Difficulty::Beginner, Priority::Medium),
            NOW,
        )
        .unwrap();
        assert_eq!(b.base_xp, 50);
        assert_eq!(b.category_xp, Decimal::new(60, 0));
        assert_eq!(b.bonus_xp, Decimal::new(25, 0));
        assert_eq!(b.timeliness, Timeliness::NoDeadline);
        assert_eq!(b.total, 85);
        assert!(!b.floored);
    }

    #[test]
    fn every_combination_meets_category_xp_and_floor() {
        let config = EngineConfig::default();
        for &difficulty in Difficulty::ALL {
            for &category in Category::ALL {
                for &priority in Priority::ALL {
                    let operation = op(category, difficulty, priority);
                    let xp = compute_reward(&config, &operation, NOW).unwrap();
                    let multiplier = config
                        .category_multipliers
                        .get(&category)
                        .copied()
                        .unwrap_or(Decimal::ONE);
                    let category_xp = (Decimal::from(config.difficulty_xp[&difficulty])
                        * multiplier)
                        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                        .to_u64()
                        .unwrap();
                    assert!(
                        xp >= category_xp,
                        "{difficulty}/{category}/{priority}: {xp} < {category_xp}"
                    );
                    assert!(xp >= 10);
                }
            }
        }
    }

    #[test]
    fn unlisted_category_uses_multiplier_one() {
        let b = reward_breakdown(
            &EngineConfig::default(),
            &op(Category::Marketing, Difficulty::Intermediate, Priority::Low),
            NOW,
        )
        .unwrap();
        assert_eq!(b.category_multiplier, Decimal::ONE);
        assert_eq!(b.total, 100);
    }

    #[test]
    fn deadline_one_hour_ahead_is_on_time() {
        let operation = op(Category::Design, Difficulty::Intermediate, Priority::Low)
            .with_deadline(NOW + Duration::hours(1));
        let b = reward_breakdown(&EngineConfig::default(), &operation, NOW).unwrap();
        assert_eq!(b.timeliness, Timeliness::OnTime);
        // 100 * 1.0 = 100; bonus = 0 + 100 * 0.10 = 10
        assert_eq!(b.total, 110);
    }

    #[test]
    fn deadline_48_hours_ahead_is_early() {
        let operation = op(Category::Design, Difficulty::Intermediate, Priority::Low)
            .with_deadline(NOW + Duration::hours(48));
        let b = reward_breakdown(&EngineConfig::default(), &operation, NOW).unwrap();
        assert_eq!(b.timeliness, Timeliness::Early);
        assert_eq!(b.total, 120);
    }

    #[test]
    fn deadline_one_hour_past_is_late() {
        let operation = op(Category::Design, Difficulty::Intermediate, Priority::Low)
            .with_deadline(NOW - Duration::hours(1));
        let b = reward_breakdown(&EngineConfig::default(), &operation, NOW).unwrap();
        assert_eq!(b.timeliness, Timeliness::Late);
        assert_eq!(b.total, 90);
    }

    #[test]
    fn buffer_edges_are_on_time() {
        let buffer = Duration::hours(24);
        assert_eq!(
            timeliness(Some(NOW + buffer), NOW, buffer),
            Timeliness::OnTime
        );
        assert_eq!(timeliness(Some(NOW), NOW, buffer), Timeliness::OnTime);
        assert_eq!(
            timeliness(Some(NOW + buffer + Duration::seconds(1)), NOW, buffer),
            Timeliness::Early
        );
        assert_eq!(
            timeliness(Some(NOW - Duration::seconds(1)), NOW, buffer),
            Timeliness::Late
        );
    }

    #[test]
    fn half_xp_rounds_up() {
        // 50 * 0.7 = 35; late: 35 - 3.5 = 31.5 -> 32
        let operation = op(Category::Documentation, Difficulty::Beginner, Priority::Low)
            .with_deadline(NOW - Duration::hours(3));
        assert_eq!(
            compute_reward(&EngineConfig::default(), &operation, NOW).unwrap(),
            32
        );
    }

    #[test]
    fn late_penalty_cannot_drop_below_floor() {
        let mut config = EngineConfig::default();
        config.difficulty_xp.insert(Difficulty::Beginner, 8);
        // 8 * 0.7 = 5.6; late: 5.6 - 0.56 = 5.04 -> 5 -> floored to 10
        let operation = op(Category::Documentation, Difficulty::Beginner, Priority::Low)
            .with_deadline(NOW - Duration::hours(1));
        let b = reward_breakdown(&config, &operation, NOW).unwrap();
        assert_eq!(b.total, 10);
        assert!(b.floored);
    }

    #[test]
    fn largest_valid_buffer_classifies_as_on_time() {
        let mut config = EngineConfig::default();
        config.timing.deadline_buffer_hours = opsboard_core::TimingConfig::MAX_BUFFER_HOURS;
        config.validate().unwrap();
        let operation = op(Category::Design, Difficulty::Intermediate, Priority::Low)
            .with_deadline(NOW + Duration::days(365));
        let b = reward_breakdown(&config, &operation, NOW).unwrap();
        assert_eq!(b.timeliness, Timeliness::OnTime);
        assert_eq!(b.total, 110);
    }

    #[test]
    fn missing_difficulty_entry_is_rejected() {
        let mut config = EngineConfig::default();
        config.difficulty_xp.remove(&Difficulty::Advanced);
        let err = compute_reward(
            &config,
            &op(Category::Research, Difficulty::Advanced, Priority::High),
            NOW,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RewardError::MissingDifficulty(Difficulty::Advanced)
        ));
    }

    #[test]
    fn missing_priority_entry_is_rejected() {
        let mut config = EngineConfig::default();
        config.priority_bonus.remove(&Priority::Critical);
        let err = compute_reward(
            &config,
            &op(Category::Research, Difficulty::Advanced, Priority::Critical),
            NOW,
        )
        .unwrap_err();
        assert!(matches!(err, RewardError::MissingPriority(Priority::Critical)));
    }

    #[test]
    fn advanced_research_critical_early() {
        // 200 * 1.1 = 220; bonus = 100 + 220 * 0.2 = 144; total 364
        let operation = op(Category::Research, Difficulty::Advanced, Priority::Critical)
            .with_deadline(NOW + Duration::days(3));
        assert_eq!(
            compute_reward(&EngineConfig::default(), &operation, NOW).unwrap(),
            364
        );
    }
}
