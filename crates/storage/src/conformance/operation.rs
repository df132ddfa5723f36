use std::future::Future;

use opsboard_core::OperationStatus;

use super::{make_operation, TestResult};
use crate::{OpsboardStorage, StorageError};

pub(super) async fn run_operation_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "operation",
            "put_then_get_returns_operation",
            put_then_get_returns_operation(factory).await,
        ),
        TestResult::from_result(
            "operation",
            "put_replaces_existing",
            put_replaces_existing(factory).await,
        ),
        TestResult::from_result(
            "operation",
            "get_unknown_returns_not_found",
            get_unknown_returns_not_found(factory).await,
        ),
        TestResult::from_result(
            "operation",
            "list_filters_by_status",
            list_filters_by_status(factory).await,
        ),
        TestResult::from_result(
            "operation",
            "list_respects_limit",
            list_respects_limit(factory).await,
        ),
        TestResult::from_result(
            "operation",
            "list_empty_store_is_empty",
            list_empty_store_is_empty(factory).await,
        ),
    ]
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn put_then_get_returns_operation<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let op = make_operation("op-1", OperationStatus::Open).with_skills(["rust"]);
    s.put_operation(op.clone())
        .await
        .map_err(|e| e.to_string())?;
    let read = s.get_operation("op-1").await.map_err(|e| e.to_string())?;
    if read != op {
        return Err(format!("expected {:?}, got {:?}", op, read));
    }
    Ok(())
}

async fn put_replaces_existing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put_operation(make_operation("op-1", OperationStatus::Open))
        .await
        .map_err(|e| e.to_string())?;
    let mut replacement = make_operation("op-1", OperationStatus::Open);
    replacement.title = "Renamed".to_string();
    s.put_operation(replacement)
        .await
        .map_err(|e| e.to_string())?;

    let all = s.list_operations(None, 0).await.map_err(|e| e.to_string())?;
    if all.len() != 1 {
        return Err(format!("expected 1 operation after upsert, got {}", all.len()));
    }
    if all[0].title != "Renamed" {
        return Err(format!("expected replaced title, got {:?}", all[0].title));
    }
    Ok(())
}

async fn get_unknown_returns_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_operation("missing").await {
        Err(StorageError::OperationNotFound { operation_id }) if operation_id == "missing" => {
            Ok(())
        }
        other => Err(format!("expected OperationNotFound, got {:?}", other)),
    }
}

async fn list_filters_by_status<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for (id, status) in [
        ("op-1", OperationStatus::Open),
        ("op-2", OperationStatus::InProgress),
        ("op-3", OperationStatus::Open),
        ("op-4", OperationStatus::Completed),
    ] {
        s.put_operation(make_operation(id, status))
            .await
            .map_err(|e| e.to_string())?;
    }

    let open = s
        .list_operations(Some(OperationStatus::Open), 0)
        .await
        .map_err(|e| e.to_string())?;
    let mut ids: Vec<&str> = open.iter().map(|op| op.id.as_str()).collect();
    ids.sort_unstable();
    if ids != ["op-1", "op-3"] {
        return Err(format!("expected [op-1, op-3], got {:?}", ids));
    }

    let all = s.list_operations(None, 0).await.map_err(|e| e.to_string())?;
    if all.len() != 4 {
        return Err(format!("expected 4 operations unfiltered, got {}", all.len()));
    }
    Ok(())
}

async fn list_respects_limit<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for i in 0..5 {
        s.put_operation(make_operation(&format!("op-{i}"), OperationStatus::Open))
            .await
            .map_err(|e| e.to_string())?;
    }
    let limited = s
        .list_operations(Some(OperationStatus::Open), 3)
        .await
        .map_err(|e| e.to_string())?;
    if limited.len() != 3 {
        return Err(format!("expected 3 with limit=3, got {}", limited.len()));
    }
    Ok(())
}

async fn list_empty_store_is_empty<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: OpsboardStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let all = s.list_operations(None, 0).await.map_err(|e| e.to_string())?;
    if !all.is_empty() {
        return Err(format!("expected empty list, got {} entries", all.len()));
    }
    Ok(())
}
