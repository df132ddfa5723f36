use std::collections::BTreeSet;

use opsboard_core::{OperatorProfile, Rank};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A profile as held by a storage backend.
///
/// Backends persist rank next to XP. The engine never reads `rank` back;
/// it recomputes rank from `profile.xp` every time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(flatten)]
    pub profile: OperatorProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Rank>,
}

impl From<OperatorProfile> for ProfileRecord {
    fn from(profile: OperatorProfile) -> Self {
        ProfileRecord {
            profile,
            rank: None,
        }
    }
}

/// A partial profile update. Only `Some` fields are written; each one
/// overwrites the stored value (last write wins, no merging).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Rank>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_operations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_operations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_earned: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<BTreeSet<String>>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_active_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl ProfileDelta {
    pub fn is_empty(&self) -> bool {
        *self == ProfileDelta::default()
    }

    /// Overwrite every field this delta carries.
    pub fn apply_to(&self, record: &mut ProfileRecord) {
        let profile = &mut record.profile;
        if let Some(xp) = self.xp {
            profile.xp = xp;
        }
        if let Some(rank) = self.rank {
            record.rank = Some(rank);
        }
        if let Some(active) = self.active_operations {
            profile.active_operations = active;
        }
        if let Some(completed) = self.completed_operations {
            profile.completed_operations = completed;
        }
        if let Some(tokens) = self.tokens_earned {
            profile.tokens_earned = tokens;
        }
        if let Some(name) = &self.display_name {
            profile.display_name = name.clone();
        }
        if let Some(skills) = &self.skills {
            profile.skills = skills.clone();
        }
        if let Some(at) = self.last_active_at {
            profile.last_active_at = Some(at);
        }
        if let Some(at) = self.updated_at {
            profile.updated_at = Some(at);
        }
    }
}
