//! Operation and operator data model.
//!
//! All enumerations serialize as snake_case strings. Parsing goes through
//! `FromStr`, so an unknown difficulty or priority in incoming data surfaces
//! as a [`ConfigError::UnknownVariant`] instead of a silent default. Going
//! through `String` also keeps the enums usable as map keys in both JSON and
//! TOML tables.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ConfigError;

// ──────────────────────────────────────────────
// Fixed enumerations
// ──────────────────────────────────────────────

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every member, in declaration (ascending) order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(ConfigError::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ConfigError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

string_enum! {
    /// How hard an operation is. Ordered: Beginner < Intermediate < Advanced.
    Difficulty, "difficulty" {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

string_enum! {
    /// Triage priority. Ordered: Low < Medium < High < Critical.
    Priority, "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

string_enum! {
    /// Kind of work. Informational: categories without a multiplier entry
    /// are rewarded at 1.0.
    Category, "category" {
        Development => "development",
        Design => "design",
        Content => "content",
        Testing => "testing",
        Documentation => "documentation",
        Research => "research",
        Marketing => "marketing",
        Community => "community",
    }
}

string_enum! {
    /// Workflow position of an operation.
    ///
    /// Open → InProgress → UnderReview → Completed, with Cancelled reachable
    /// from any non-terminal status. There are no back-transitions.
    OperationStatus, "status" {
        Open => "open",
        InProgress => "in_progress",
        UnderReview => "under_review",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

string_enum! {
    /// Named progression tier. Ordered by ascending XP threshold.
    Rank, "rank" {
        Apprentice => "apprentice",
        Journeyman => "journeyman",
        Expert => "expert",
        Master => "master",
    }
}

impl OperationStatus {
    /// Completed and Cancelled accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Cancelled)
    }

    /// Whether the workflow allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: OperationStatus) -> bool {
        use OperationStatus::*;
        match (self, next) {
            (Open, InProgress) | (InProgress, UnderReview) | (UnderReview, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

// ──────────────────────────────────────────────
// Operation
// ──────────────────────────────────────────────

/// Reward as advertised on an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDescriptor {
    /// Listed base XP. The awarded amount is computed from difficulty,
    /// category, priority and timing, not taken from here.
    pub xp: u64,
    /// Token payout credited verbatim on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Decimal>,
    /// Currency tag for `tokens`, e.g. `"OPS"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// A unit of assignable work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub priority: Priority,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
    pub status: OperationStatus,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<OffsetDateTime>,
    pub reward: RewardDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<u32>,
}

impl Operation {
    /// Build an open operation with no deadline, no skills and no tokens.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: Category,
        difficulty: Difficulty,
        priority: Priority,
    ) -> Self {
        Operation {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category,
            difficulty,
            priority,
            required_skills: BTreeSet::new(),
            status: OperationStatus::Open,
            deadline: None,
            reward: RewardDescriptor {
                xp: 0,
                tokens: None,
                currency: None,
            },
            created_by: None,
            assigned_to: None,
            created_at: None,
            estimated_hours: None,
        }
    }

    pub fn with_deadline(mut self, deadline: OffsetDateTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, status: OperationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_tokens(mut self, tokens: Decimal, currency: impl Into<String>) -> Self {
        self.reward.tokens = Some(tokens);
        self.reward.currency = Some(currency.into());
        self
    }
}

// ──────────────────────────────────────────────
// Operator profile
// ──────────────────────────────────────────────

/// An operator as stored by the external data store.
///
/// Rank is not a field: it is always derived from `xp` through the rank
/// ladder so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    /// Cumulative XP. Never decreases through the award flow.
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub active_operations: u32,
    #[serde(default)]
    pub completed_operations: u32,
    #[serde(default)]
    pub tokens_earned: Decimal,
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

impl OperatorProfile {
    /// A freshly onboarded operator: zero XP, nothing active.
    pub fn new(id: impl Into<String>) -> Self {
        OperatorProfile {
            id: id.into(),
            display_name: String::new(),
            skills: BTreeSet::new(),
            xp: 0,
            active_operations: 0,
            completed_operations: 0,
            tokens_earned: Decimal::ZERO,
            last_active_at: None,
            updated_at: None,
        }
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_xp(mut self, xp: u64) -> Self {
        self.xp = xp;
        self
    }
}
