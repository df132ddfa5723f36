//! Reward and rank lookup tables.
//!
//! Every table the engine consults lives here as ordered data, so adding a
//! category or a rank tier is a configuration change. Defaults reproduce the
//! standard board economy; a TOML file can override any table wholesale.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{Category, Difficulty, Priority, Rank};

/// One step of the rank ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTier {
    pub rank: Rank,
    /// Minimum cumulative XP to hold this rank.
    pub min_xp: u64,
}

/// Deadline-relative timing adjustments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Finishing more than this many hours before the deadline counts as early.
    pub deadline_buffer_hours: i64,
    /// Fraction of category XP added when early.
    pub early_bonus: Decimal,
    /// Fraction of category XP added when on time (inside the buffer).
    pub on_time_bonus: Decimal,
    /// Fraction of category XP subtracted when past the deadline.
    pub late_penalty: Decimal,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            deadline_buffer_hours: 24,
            early_bonus: Decimal::new(20, 2),
            on_time_bonus: Decimal::new(10, 2),
            late_penalty: Decimal::new(10, 2),
        }
    }
}

impl TimingConfig {
    /// Longest accepted buffer; larger values do not fit a `time::Duration`.
    pub const MAX_BUFFER_HOURS: i64 = i64::MAX / 3600;

    /// The buffer must be within `0..=MAX_BUFFER_HOURS` and every fraction
    /// non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=Self::MAX_BUFFER_HOURS).contains(&self.deadline_buffer_hours) {
            return Err(ConfigError::InvalidSetting {
                field: "timing.deadline_buffer_hours",
                message: format!(
                    "must be between 0 and {}, got {}",
                    Self::MAX_BUFFER_HOURS,
                    self.deadline_buffer_hours
                ),
            });
        }
        for (field, value) in [
            ("timing.early_bonus", self.early_bonus),
            ("timing.on_time_bonus", self.on_time_bonus),
            ("timing.late_penalty", self.late_penalty),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ConfigError::InvalidSetting {
                    field,
                    message: format!("must be >= 0, got {}", value),
                });
            }
        }
        Ok(())
    }
}

/// Engine configuration: lookup tables plus board limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Floor applied to every computed reward.
    pub minimum_xp: u64,
    /// Maximum operations an operator may hold at once through `claim`.
    pub max_active_operations: u32,
    pub difficulty_xp: BTreeMap<Difficulty, u64>,
    /// Categories missing from this table use a multiplier of 1.0.
    pub category_multipliers: BTreeMap<Category, Decimal>,
    pub priority_bonus: BTreeMap<Priority, u64>,
    pub timing: TimingConfig,
    /// Ascending by `min_xp`, first tier at 0.
    pub rank_ladder: Vec<RankTier>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let difficulty_xp = BTreeMap::from([
            (Difficulty::Beginner, 50),
            (Difficulty::Intermediate, 100),
            (Difficulty::Advanced, 200),
        ]);
        let category_multipliers = BTreeMap::from([
            (Category::Development, Decimal::new(12, 1)),
            (Category::Design, Decimal::new(10, 1)),
            (Category::Content, Decimal::new(8, 1)),
            (Category::Testing, Decimal::new(9, 1)),
            (Category::Documentation, Decimal::new(7, 1)),
            (Category::Research, Decimal::new(11, 1)),
        ]);
        let priority_bonus = BTreeMap::from([
            (Priority::Low, 0),
            (Priority::Medium, 25),
            (Priority::High, 50),
            (Priority::Critical, 100),
        ]);
        let rank_ladder = vec![
            RankTier {
                rank: Rank::Apprentice,
                min_xp: 0,
            },
            RankTier {
                rank: Rank::Journeyman,
                min_xp: 1_000,
            },
            RankTier {
                rank: Rank::Expert,
                min_xp: 5_000,
            },
            RankTier {
                rank: Rank::Master,
                min_xp: 15_000,
            },
        ];
        EngineConfig {
            minimum_xp: 10,
            max_active_operations: 5,
            difficulty_xp,
            category_multipliers,
            priority_bonus,
            timing: TimingConfig::default(),
            rank_ladder,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document. Missing sections take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check table completeness and ladder shape.
    ///
    /// Every difficulty and priority must have an entry; the category table
    /// may be partial. The ladder must start at 0 and be strictly ascending
    /// with each rank appearing once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for difficulty in Difficulty::ALL {
            if !self.difficulty_xp.contains_key(difficulty) {
                return Err(ConfigError::MissingDifficulty(difficulty.to_string()));
            }
        }
        for priority in Priority::ALL {
            if !self.priority_bonus.contains_key(priority) {
                return Err(ConfigError::MissingPriority(priority.to_string()));
            }
        }
        if let Some((category, m)) = self
            .category_multipliers
            .iter()
            .find(|(_, m)| m.is_sign_negative())
        {
            return Err(ConfigError::InvalidSetting {
                field: "category_multipliers",
                message: format!("multiplier for '{}' is negative: {}", category, m),
            });
        }
        self.timing.validate()?;
        validate_ladder(&self.rank_ladder)
    }
}

/// Check that a ladder is non-empty, starts at 0 XP, is strictly ascending and
/// names each rank once.
pub fn validate_ladder(ladder: &[RankTier]) -> Result<(), ConfigError> {
    let first = ladder
        .first()
        .ok_or_else(|| ConfigError::InvalidLadder("ladder is empty".to_string()))?;
    if first.min_xp != 0 {
        return Err(ConfigError::InvalidLadder(format!(
            "first tier '{}' must start at 0 XP, got {}",
            first.rank, first.min_xp
        )));
    }
    for pair in ladder.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        if upper.min_xp <= lower.min_xp {
            return Err(ConfigError::InvalidLadder(format!(
                "tier '{}' ({}) does not exceed '{}' ({})",
                upper.rank, upper.min_xp, lower.rank, lower.min_xp
            )));
        }
    }
    for (i, tier) in ladder.iter().enumerate() {
        if ladder[..i].iter().any(|t| t.rank == tier.rank) {
            return Err(ConfigError::InvalidLadder(format!(
                "rank '{}' appears more than once",
                tier.rank
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn default_config_survives_toml() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        assert_eq!(
            EngineConfig::from_toml_str("").unwrap(),
            EngineConfig::default()
        );
    }

    #[test]
    fn partial_override_keeps_other_tables() {
        let config = EngineConfig::from_toml_str(
            r#"
minimum_xp = 25

[category_multipliers]
marketing = "1.5"
"#,
        )
        .unwrap();
        assert_eq!(config.minimum_xp, 25);
        assert_eq!(config.category_multipliers.len(), 1);
        assert_eq!(
            config.category_multipliers[&Category::Marketing],
            Decimal::new(15, 1)
        );
        assert_eq!(config.difficulty_xp[&Difficulty::Advanced], 200);
    }

    #[test]
    fn incomplete_difficulty_table_is_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
[difficulty_xp]
beginner = 50
advanced = 200
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingDifficulty(ref d) if d == "intermediate"));
    }

    #[test]
    fn unknown_table_key_is_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
[priority_bonus]
low = 0
medium = 25
high = 50
critical = 100
blocker = 500
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn oversized_deadline_buffer_is_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
[timing]
deadline_buffer_hours = 9223372036854775807
"#,
        )
        .unwrap_err();
        assert!(
            matches!(
                err,
                ConfigError::InvalidSetting {
                    field: "timing.deadline_buffer_hours",
                    ..
                }
            ),
            "{err}"
        );

        let mut config = EngineConfig::default();
        config.timing.deadline_buffer_hours = TimingConfig::MAX_BUFFER_HOURS;
        config.validate().unwrap();
        config.timing.deadline_buffer_hours = TimingConfig::MAX_BUFFER_HOURS + 1;
        assert!(config.validate().is_err());
        config.timing.deadline_buffer_hours = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_timing_fractions_are_rejected() {
        for field in ["early_bonus", "on_time_bonus", "late_penalty"] {
            let mut config = EngineConfig::default();
            let value = Decimal::new(-5, 2);
            match field {
                "early_bonus" => config.timing.early_bonus = value,
                "on_time_bonus" => config.timing.on_time_bonus = value,
                _ => config.timing.late_penalty = value,
            }
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains(field), "{field}: {err}");
        }

        let mut config = EngineConfig::default();
        config.timing.late_penalty = Decimal::ZERO;
        config.validate().unwrap();
    }

    #[test]
    fn ladder_must_start_at_zero() {
        let mut config = EngineConfig::default();
        config.rank_ladder[0].min_xp = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLadder(_))
        ));
    }

    #[test]
    fn ladder_must_be_strictly_ascending() {
        let mut config = EngineConfig::default();
        config.rank_ladder[2].min_xp = 1_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("does not exceed"), "{err}");
    }

    #[test]
    fn ladder_rejects_duplicate_rank() {
        let mut config = EngineConfig::default();
        config.rank_ladder[3].rank = Rank::Expert;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"), "{err}");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opsboard.toml");
        std::fs::write(&path, "max_active_operations = 2\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.max_active_operations, 2);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/opsboard.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
