//! opsboard-engine -- reward, rank progression, and board recommendation.
//!
//! Leaf-first:
//!
//! - [`reward`] -- operation attributes + completion time → XP
//! - [`rank`] -- cumulative XP → rank and distance to the next rank
//! - [`progression`] -- applies rewards to profiles through the
//!   persistence collaborator
//! - [`board`] -- skill filter and urgency sort over operations
//!
//! The engine holds no shared mutable state. Its only suspension points are
//! calls into the storage collaborators from `opsboard-storage`.

pub mod board;
pub mod clock;
pub mod error;
pub mod progression;
pub mod rank;
pub mod reward;

pub use board::{filter_by_skills, recommend, select, sort_by_urgency, BoardFilter};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{EngineError, RewardError};
pub use progression::{AwardPlan, AwardResult, ProgressionCoordinator};
pub use rank::{RankLedger, RankProgress};
pub use reward::{compute_reward, preview_reward, reward_breakdown, RewardBreakdown, Timeliness};
