//! Rank ledger: cumulative XP to rank.
//!
//! Rank is a pure, monotone function of XP over an ascending threshold
//! table. There is no demotion path and nothing above the top tier.

use serde::{Deserialize, Serialize};

use opsboard_core::{validate_ladder, ConfigError, EngineConfig, Rank, RankTier};

/// Where a profile stands on the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankProgress {
    pub rank: Rank,
    pub next_rank: Option<Rank>,
    /// XP earned since reaching `rank`.
    pub xp_into_rank: u64,
    /// XP still needed for `next_rank`; `None` at the top tier.
    pub xp_to_next: Option<u64>,
    /// Progress through the current tier, 0..=100. Always 100 at the top tier.
    pub percent: u8,
}

/// A validated, ascending rank ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankLedger {
    tiers: Vec<RankTier>,
}

impl RankLedger {
    pub fn new(tiers: Vec<RankTier>) -> Result<Self, ConfigError> {
        validate_ladder(&tiers)?;
        Ok(RankLedger { tiers })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::new(config.rank_ladder.clone())
    }

    pub fn tiers(&self) -> &[RankTier] {
        &self.tiers
    }

    /// Index of the highest tier whose threshold is <= `total_xp`.
    fn tier_index(&self, total_xp: u64) -> usize {
        // The first tier starts at 0, so the partition point is at least 1.
        self.tiers
            .partition_point(|tier| tier.min_xp <= total_xp)
            .saturating_sub(1)
    }

    /// The highest rank whose threshold is at or below `total_xp`.
    ///
    /// A profile sitting exactly on a threshold holds the higher rank.
    pub fn rank_for(&self, total_xp: u64) -> Rank {
        self.tiers[self.tier_index(total_xp)].rank
    }

    /// XP remaining until the next rank, or `None` at the top rank.
    pub fn xp_to_next_rank(&self, total_xp: u64) -> Option<u64> {
        self.tiers
            .get(self.tier_index(total_xp) + 1)
            .map(|next| next.min_xp - total_xp)
    }

    pub fn rank_progress(&self, total_xp: u64) -> RankProgress {
        let index = self.tier_index(total_xp);
        let current = self.tiers[index];
        let next = self.tiers.get(index + 1);
        let xp_into_rank = total_xp - current.min_xp;
        let percent = match next {
            Some(next) => {
                let span = next.min_xp - current.min_xp;
                // span > 0 by ladder validation; result < 100
                (u128::from(xp_into_rank) * 100 / u128::from(span)) as u8
            }
            None => 100,
        };
        RankProgress {
            rank: current.rank,
            next_rank: next.map(|t| t.rank),
            xp_into_rank,
            xp_to_next: next.map(|t| t.min_xp - total_xp),
            percent,
        }
    }
}

impl Default for RankLedger {
    fn default() -> Self {
        RankLedger {
            tiers: EngineConfig::default().rank_ladder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_resolve_to_higher_rank() {
        let ledger = RankLedger::default();
        assert_eq!(ledger.rank_for(0), Rank::Apprentice);
        assert_eq!(ledger.rank_for(999), Rank::Apprentice);
        assert_eq!(ledger.rank_for(1_000), Rank::Journeyman);
        assert_eq!(ledger.rank_for(4_999), Rank::Journeyman);
        assert_eq!(ledger.rank_for(5_000), Rank::Expert);
        assert_eq!(ledger.rank_for(14_999), Rank::Expert);
        assert_eq!(ledger.rank_for(15_000), Rank::Master);
        assert_eq!(ledger.rank_for(999_999), Rank::Master);
        assert_eq!(ledger.rank_for(u64::MAX), Rank::Master);
    }

    #[test]
    fn xp_to_next_rank_values() {
        let ledger = RankLedger::default();
        assert_eq!(ledger.xp_to_next_rank(0), Some(1_000));
        assert_eq!(ledger.xp_to_next_rank(4_000), Some(1_000));
        assert_eq!(ledger.xp_to_next_rank(14_999), Some(1));
        assert_eq!(ledger.xp_to_next_rank(15_000), None);
        assert_eq!(ledger.xp_to_next_rank(20_000), None);
    }

    #[test]
    fn rank_is_monotone_in_xp() {
        let ledger = RankLedger::default();
        let mut previous = ledger.rank_for(0);
        for xp in (0..20_000).step_by(37) {
            let rank = ledger.rank_for(xp);
            assert!(rank >= previous, "rank dropped at {xp}");
            previous = rank;
        }
    }

    #[test]
    fn progress_through_tier() {
        let ledger = RankLedger::default();
        let p = ledger.rank_progress(3_000);
        assert_eq!(p.rank, Rank::Journeyman);
        assert_eq!(p.next_rank, Some(Rank::Expert));
        assert_eq!(p.xp_into_rank, 2_000);
        assert_eq!(p.xp_to_next, Some(2_000));
        assert_eq!(p.percent, 50);
    }

    #[test]
    fn progress_at_top_rank_is_full() {
        let p = RankLedger::default().rank_progress(16_000);
        assert_eq!(p.rank, Rank::Master);
        assert_eq!(p.next_rank, None);
        assert_eq!(p.xp_into_rank, 1_000);
        assert_eq!(p.percent, 100);
    }

    #[test]
    fn custom_ladder_is_data_only() {
        let ledger = RankLedger::new(vec![
            RankTier {
                rank: Rank::Apprentice,
                min_xp: 0,
            },
            RankTier {
                rank: Rank::Master,
                min_xp: 100,
            },
        ])
        .unwrap();
        assert_eq!(ledger.rank_for(99), Rank::Apprentice);
        assert_eq!(ledger.rank_for(100), Rank::Master);
        assert_eq!(ledger.xp_to_next_rank(40), Some(60));
    }

    #[test]
    fn empty_ladder_is_rejected() {
        assert!(matches!(
            RankLedger::new(Vec::new()),
            Err(ConfigError::InvalidLadder(_))
        ));
    }
}
