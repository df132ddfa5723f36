use std::future::Future;
use std::sync::Arc;

use opsboard_core::{OperationStatus, OperatorProfile};

use super::{make_operation, TestResult};
use crate::{OpsboardStorage, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "concurrent",
            "concurrent_completions_exactly_one_wins",
            concurrent_completions_exactly_one_wins(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "concurrent_claims_exactly_one_assignee",
            concurrent_claims_exactly_one_assignee(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "concurrent_deltas_different_profiles_all_apply",
            concurrent_deltas_different_profiles_all_apply(factory).await,
        ),
    ]
}

// ── Concurrent completion: exactly one wins ─────────────────────────────────

/// N tasks race to move the same operation UnderReview → Completed. Exactly
/// one succeeds; the rest must get StatusConflict.
async fn concurrent_completions_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    storage
        .put_operation(make_operation("op-1", OperationStatus::UnderReview))
        .await
        .map_err(|e| format!("put: {e}"))?;

    let mut handles = Vec::new();
    for _ in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            match s
                .transition_status(
                    "op-1",
                    OperationStatus::UnderReview,
                    OperationStatus::Completed,
                    None,
                )
                .await
            {
                Ok(_) => Ok(true),
                Err(StorageError::StatusConflict { .. }) => Ok(false),
                Err(e) => Err(e),
            }
        }));
    }

    let (winners, losers) = tally(handles).await?;
    if winners != 1 {
        return Err(format!("expected exactly 1 winner, got {winners}"));
    }
    if losers != N - 1 {
        return Err(format!("expected {} losers, got {losers}", N - 1));
    }
    Ok(())
}

// ── Concurrent claim: one assignee survives ─────────────────────────────────

/// N operators race to claim the same open operation. Exactly one claim
/// succeeds and the stored assignee is the winner's.
async fn concurrent_claims_exactly_one_assignee<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    storage
        .put_operation(make_operation("op-1", OperationStatus::Open))
        .await
        .map_err(|e| format!("put: {e}"))?;

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            let operator = format!("operator-{i}");
            match s
                .transition_status(
                    "op-1",
                    OperationStatus::Open,
                    OperationStatus::InProgress,
                    Some(operator.as_str()),
                )
                .await
            {
                Ok(op) => Ok(op.assigned_to),
                Err(StorageError::StatusConflict { .. }) => Ok(None),
                Err(e) => Err(e),
            }
        }));
    }

    let mut winner = None;
    for handle in handles {
        let assigned = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
        if let Some(assignee) = assigned {
            if winner.replace(assignee).is_some() {
                return Err("more than one claim succeeded".to_string());
            }
        }
    }
    let winner = winner.ok_or_else(|| "no claim succeeded".to_string())?;

    let stored = storage
        .get_operation("op-1")
        .await
        .map_err(|e| e.to_string())?;
    if stored.assigned_to.as_deref() != Some(winner.as_str()) {
        return Err(format!(
            "stored assignee {:?} differs from winner {winner}",
            stored.assigned_to
        ));
    }
    Ok(())
}

// ── Concurrent deltas to different profiles: all apply ──────────────────────

/// N tasks each write a different profile. All should succeed with no
/// cross-talk between records.
async fn concurrent_deltas_different_profiles_all_apply<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    for i in 0..N {
        storage
            .create_profile(OperatorProfile::new(format!("operator-{i}")))
            .await
            .map_err(|e| format!("create: {e}"))?;
    }

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            let delta = crate::ProfileDelta {
                xp: Some(100 * (i as u64 + 1)),
                ..crate::ProfileDelta::default()
            };
            s.apply_profile_delta(&format!("operator-{i}"), &delta)
                .await
                .map(|()| true)
        }));
    }
    let (applied, _) = tally(handles).await?;
    if applied != N {
        return Err(format!("expected {N} deltas applied, got {applied}"));
    }

    for i in 0..N {
        let rec = storage
            .get_profile(&format!("operator-{i}"))
            .await
            .map_err(|e| e.to_string())?;
        let expected = 100 * (i as u64 + 1);
        if rec.profile.xp != expected {
            return Err(format!(
                "operator-{i}: expected xp {expected}, got {}",
                rec.profile.xp
            ));
        }
    }
    Ok(())
}

async fn tally(
    handles: Vec<tokio::task::JoinHandle<Result<bool, StorageError>>>,
) -> Result<(usize, usize), String> {
    let mut winners = 0usize;
    let mut losers = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
        if won {
            winners += 1;
        } else {
            losers += 1;
        }
    }
    Ok((winners, losers))
}
