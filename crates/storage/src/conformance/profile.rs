use std::future::Future;

use opsboard_core::{OperatorProfile, Rank};
use rust_decimal::Decimal;

use super::TestResult;
use crate::{OpsboardStorage, ProfileDelta, StorageError};

pub(super) async fn run_profile_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "profile",
            "create_then_get_returns_profile",
            create_then_get_returns_profile(factory).await,
        ),
        TestResult::from_result(
            "profile",
            "duplicate_create_returns_profile_exists",
            duplicate_create_returns_profile_exists(factory).await,
        ),
        TestResult::from_result(
            "profile",
            "get_unknown_returns_not_found",
            get_unknown_returns_not_found(factory).await,
        ),
        TestResult::from_result(
            "profile",
            "delta_writes_only_given_fields",
            delta_writes_only_given_fields(factory).await,
        ),
        TestResult::from_result(
            "profile",
            "later_delta_wins",
            later_delta_wins(factory).await,
        ),
        TestResult::from_result(
            "profile",
            "delta_on_unknown_returns_not_found",
            delta_on_unknown_returns_not_found(factory).await,
        ),
    ]
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn create_then_get_returns_profile<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let profile = OperatorProfile::new("operator-1")
        .with_skills(["rust", "sql"])
        .with_xp(120);
    s.create_profile(profile.clone())
        .await
        .map_err(|e| e.to_string())?;

    let rec = s
        .get_profile("operator-1")
        .await
        .map_err(|e| e.to_string())?;
    if rec.profile != profile {
        return Err(format!("expected {:?}, got {:?}", profile, rec.profile));
    }
    Ok(())
}

async fn duplicate_create_returns_profile_exists<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.create_profile(OperatorProfile::new("operator-1"))
        .await
        .map_err(|e| e.to_string())?;
    match s.create_profile(OperatorProfile::new("operator-1")).await {
        Err(StorageError::ProfileExists { operator_id }) if operator_id == "operator-1" => Ok(()),
        other => Err(format!("expected ProfileExists, got {:?}", other)),
    }
}

async fn get_unknown_returns_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_profile("ghost").await {
        Err(StorageError::ProfileNotFound { operator_id }) if operator_id == "ghost" => Ok(()),
        other => Err(format!("expected ProfileNotFound, got {:?}", other)),
    }
}

async fn delta_writes_only_given_fields<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut profile = OperatorProfile::new("operator-1").with_skills(["design"]);
    profile.active_operations = 3;
    s.create_profile(profile).await.map_err(|e| e.to_string())?;

    let delta = ProfileDelta {
        xp: Some(1_050),
        rank: Some(Rank::Journeyman),
        tokens_earned: Some(Decimal::new(75, 0)),
        ..ProfileDelta::default()
    };
    s.apply_profile_delta("operator-1", &delta)
        .await
        .map_err(|e| e.to_string())?;

    let rec = s
        .get_profile("operator-1")
        .await
        .map_err(|e| e.to_string())?;
    if rec.profile.xp != 1_050 || rec.rank != Some(Rank::Journeyman) {
        return Err(format!(
            "expected xp 1050 / journeyman, got {} / {:?}",
            rec.profile.xp, rec.rank
        ));
    }
    if rec.profile.tokens_earned != Decimal::new(75, 0) {
        return Err(format!(
            "expected 75 tokens, got {}",
            rec.profile.tokens_earned
        ));
    }
    if rec.profile.active_operations != 3 || !rec.profile.skills.contains("design") {
        return Err("fields absent from the delta were modified".to_string());
    }
    Ok(())
}

async fn later_delta_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.create_profile(OperatorProfile::new("operator-1"))
        .await
        .map_err(|e| e.to_string())?;
    for xp in [500, 200] {
        let delta = ProfileDelta {
            xp: Some(xp),
            ..ProfileDelta::default()
        };
        s.apply_profile_delta("operator-1", &delta)
            .await
            .map_err(|e| e.to_string())?;
    }
    let rec = s
        .get_profile("operator-1")
        .await
        .map_err(|e| e.to_string())?;
    if rec.profile.xp != 200 {
        return Err(format!("expected last write (200) to win, got {}", rec.profile.xp));
    }
    Ok(())
}

async fn delta_on_unknown_returns_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let delta = ProfileDelta {
        xp: Some(10),
        ..ProfileDelta::default()
    };
    match s.apply_profile_delta("ghost", &delta).await {
        Err(StorageError::ProfileNotFound { .. }) => Ok(()),
        other => Err(format!("expected ProfileNotFound, got {:?}", other)),
    }
}
