//! Recommendation and sort pipeline for the operations board.
//!
//! Narrowing is by skill overlap: an operation matches when at least one of
//! its required skills is among the operator's. Ordering is "most urgent
//! first": priority descending, then deadline ascending with undated
//! operations last, then original order (the sort is stable).

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use opsboard_core::{Category, Operation, OperationStatus, OperatorProfile};
use opsboard_storage::{OperationSource, StorageError};

/// Keep operations whose required skills intersect `skills`.
///
/// An empty `skills` set matches nothing; so does an operation with no
/// required skills.
pub fn filter_by_skills(operations: &[Operation], skills: &BTreeSet<String>) -> Vec<Operation> {
    operations
        .iter()
        .filter(|op| !op.required_skills.is_disjoint(skills))
        .cloned()
        .collect()
}

/// Urgency ordering: priority descending, then earliest deadline, then
/// dated before undated.
pub fn urgency_cmp(a: &Operation, b: &Operation) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Stable sort by [`urgency_cmp`]. Idempotent.
pub fn sort_by_urgency(mut operations: Vec<Operation>) -> Vec<Operation> {
    operations.sort_by(urgency_cmp);
    operations
}

/// Skill-filter then urgency-sort.
pub fn select(operations: &[Operation], skills: &BTreeSet<String>) -> Vec<Operation> {
    sort_by_urgency(filter_by_skills(operations, skills))
}

/// Board-level filters applied before recommendation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardFilter {
    pub status: Option<OperationStatus>,
    pub category: Option<Category>,
    /// Case-insensitive substring match against title and description.
    pub search: Option<String>,
    /// Maximum results after sorting (0 = no limit).
    pub limit: usize,
}

impl BoardFilter {
    /// Open operations only, no other constraint.
    pub fn open() -> Self {
        BoardFilter {
            status: Some(OperationStatus::Open),
            ..BoardFilter::default()
        }
    }

    pub fn matches(&self, operation: &Operation) -> bool {
        if self.status.is_some_and(|s| operation.status != s) {
            return false;
        }
        if self.category.is_some_and(|c| operation.category != c) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                operation.title.to_lowercase().contains(&needle)
                    || operation.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }

    /// Filter, then truncate to `limit`. Order is preserved.
    pub fn apply(&self, operations: &[Operation]) -> Vec<Operation> {
        let matching = operations.iter().filter(|op| self.matches(op)).cloned();
        if self.limit == 0 {
            matching.collect()
        } else {
            matching.take(self.limit).collect()
        }
    }
}

/// Fetch operations from `source` and recommend them to `profile`.
///
/// The status filter is pushed to the source; the rest of `filter` and the
/// limit are applied after skill matching and sorting so the most urgent
/// work survives truncation.
pub async fn recommend<S>(
    source: &S,
    profile: &OperatorProfile,
    filter: &BoardFilter,
) -> Result<Vec<Operation>, StorageError>
where
    S: OperationSource + ?Sized,
{
    let pool = source.list_operations(filter.status, 0).await?;
    let ranked = select(&pool, &profile.skills);
    let filtered = BoardFilter {
        status: None,
        ..filter.clone()
    }
    .apply(&ranked);
    tracing::debug!(
        operator = %profile.id,
        pool = pool.len(),
        recommended = filtered.len(),
        "board recommendations computed"
    );
    Ok(filtered)
}
