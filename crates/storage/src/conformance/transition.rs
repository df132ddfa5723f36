use std::future::Future;

use opsboard_core::{OperationStatus, OperatorProfile};

use super::{make_operation, TestResult};
use crate::{OpsboardStorage, ProfileDelta, StorageError};

pub(super) async fn run_transition_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "transition",
            "transition_from_expected_succeeds",
            transition_from_expected_succeeds(factory).await,
        ),
        TestResult::from_result(
            "transition",
            "transition_sets_assignee",
            transition_sets_assignee(factory).await,
        ),
        TestResult::from_result(
            "transition",
            "stale_expected_returns_conflict",
            stale_expected_returns_conflict(factory).await,
        ),
        TestResult::from_result(
            "transition",
            "conflict_leaves_record_untouched",
            conflict_leaves_record_untouched(factory).await,
        ),
        TestResult::from_result(
            "transition",
            "transition_unknown_returns_not_found",
            transition_unknown_returns_not_found(factory).await,
        ),
        TestResult::from_result(
            "transition",
            "transition_with_delta_applies_both",
            transition_with_delta_applies_both(factory).await,
        ),
        TestResult::from_result(
            "transition",
            "transition_with_delta_conflict_writes_nothing",
            transition_with_delta_conflict_writes_nothing(factory).await,
        ),
        TestResult::from_result(
            "transition",
            "transition_with_delta_missing_profile_writes_nothing",
            transition_with_delta_missing_profile_writes_nothing(factory).await,
        ),
    ]
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn transition_from_expected_succeeds<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put_operation(make_operation("op-1", OperationStatus::UnderReview))
        .await
        .map_err(|e| e.to_string())?;
    let updated = s
        .transition_status(
            "op-1",
            OperationStatus::UnderReview,
            OperationStatus::Completed,
            None,
        )
        .await
        .map_err(|e| e.to_string())?;
    if updated.status != OperationStatus::Completed {
        return Err(format!("returned status {}, expected completed", updated.status));
    }
    let read = s.get_operation("op-1").await.map_err(|e| e.to_string())?;
    if read.status != OperationStatus::Completed {
        return Err(format!("stored status {}, expected completed", read.status));
    }
    Ok(())
}

async fn transition_sets_assignee<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put_operation(make_operation("op-1", OperationStatus::Open))
        .await
        .map_err(|e| e.to_string())?;
    s.transition_status(
        "op-1",
        OperationStatus::Open,
        OperationStatus::InProgress,
        Some("operator-9"),
    )
    .await
    .map_err(|e| e.to_string())?;
    let read = s.get_operation("op-1").await.map_err(|e| e.to_string())?;
    if read.assigned_to.as_deref() != Some("operator-9") {
        return Err(format!("expected assignee operator-9, got {:?}", read.assigned_to));
    }
    Ok(())
}

async fn stale_expected_returns_conflict<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put_operation(make_operation("op-1", OperationStatus::Completed))
        .await
        .map_err(|e| e.to_string())?;
    match s
        .transition_status(
            "op-1",
            OperationStatus::UnderReview,
            OperationStatus::Completed,
            None,
        )
        .await
    {
        Err(StorageError::StatusConflict {
            expected, actual, ..
        }) if expected == OperationStatus::UnderReview
            && actual == OperationStatus::Completed =>
        {
            Ok(())
        }
        other => Err(format!("expected StatusConflict, got {:?}", other)),
    }
}

async fn conflict_leaves_record_untouched<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let op = make_operation("op-1", OperationStatus::InProgress);
    s.put_operation(op.clone())
        .await
        .map_err(|e| e.to_string())?;
    let _ = s
        .transition_status(
            "op-1",
            OperationStatus::Open,
            OperationStatus::InProgress,
            Some("intruder"),
        )
        .await;
    let read = s.get_operation("op-1").await.map_err(|e| e.to_string())?;
    if read != op {
        return Err(format!("record changed after conflict: {:?}", read));
    }
    Ok(())
}

async fn transition_unknown_returns_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s
        .transition_status(
            "missing",
            OperationStatus::Open,
            OperationStatus::InProgress,
            None,
        )
        .await
    {
        Err(StorageError::OperationNotFound { .. }) => Ok(()),
        other => Err(format!("expected OperationNotFound, got {:?}", other)),
    }
}

// ── Combined transition + profile delta ─────────────────────────────────────

fn xp_delta(xp: u64) -> ProfileDelta {
    ProfileDelta {
        xp: Some(xp),
        ..ProfileDelta::default()
    }
}

async fn transition_with_delta_applies_both<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.create_profile(OperatorProfile::new("operator-1"))
        .await
        .map_err(|e| e.to_string())?;
    s.put_operation(make_operation("op-1", OperationStatus::UnderReview))
        .await
        .map_err(|e| e.to_string())?;

    let updated = s
        .transition_with_delta(
            "op-1",
            OperationStatus::UnderReview,
            OperationStatus::Completed,
            None,
            "operator-1",
            &xp_delta(85),
        )
        .await
        .map_err(|e| e.to_string())?;
    if updated.status != OperationStatus::Completed {
        return Err(format!("returned status {}, expected completed", updated.status));
    }
    let rec = s.get_profile("operator-1").await.map_err(|e| e.to_string())?;
    if rec.profile.xp != 85 {
        return Err(format!("profile xp {}, expected 85", rec.profile.xp));
    }
    Ok(())
}

async fn transition_with_delta_conflict_writes_nothing<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.create_profile(OperatorProfile::new("operator-1"))
        .await
        .map_err(|e| e.to_string())?;
    s.put_operation(make_operation("op-1", OperationStatus::Completed))
        .await
        .map_err(|e| e.to_string())?;

    match s
        .transition_with_delta(
            "op-1",
            OperationStatus::UnderReview,
            OperationStatus::Completed,
            None,
            "operator-1",
            &xp_delta(85),
        )
        .await
    {
        Err(StorageError::StatusConflict { .. }) => {}
        Ok(_) => return Err("expected StatusConflict, got Ok".to_string()),
        Err(e) => return Err(format!("expected StatusConflict, got {e}")),
    }
    let rec = s.get_profile("operator-1").await.map_err(|e| e.to_string())?;
    if rec.profile.xp != 0 {
        return Err(format!("profile xp {} after conflict, expected 0", rec.profile.xp));
    }
    Ok(())
}

async fn transition_with_delta_missing_profile_writes_nothing<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put_operation(make_operation("op-1", OperationStatus::UnderReview))
        .await
        .map_err(|e| e.to_string())?;

    match s
        .transition_with_delta(
            "op-1",
            OperationStatus::UnderReview,
            OperationStatus::Completed,
            None,
            "ghost",
            &xp_delta(85),
        )
        .await
    {
        Err(StorageError::ProfileNotFound { .. }) => {}
        Ok(_) => return Err("expected ProfileNotFound, got Ok".to_string()),
        Err(e) => return Err(format!("expected ProfileNotFound, got {e}")),
    }
    let read = s.get_operation("op-1").await.map_err(|e| e.to_string())?;
    if read.status != OperationStatus::UnderReview {
        return Err(format!("stored status {}, expected under_review", read.status));
    }
    Ok(())
}
