use std::path::Path;
use std::process;

use opsboard_core::{EngineConfig, Operation, OperatorProfile};
use opsboard_engine::{AwardResult, EngineError, ProgressionCoordinator};
use opsboard_storage::{MemoryStore, ProfileRecord, ProfileStore};

use super::{parse_time, print_json, read_json};
use crate::{report_error, runtime, OutputFormat};

/// Award `operation` to the profile stored at `profile_path`.
///
/// The profile file is the persistence target: it is rewritten with the
/// updated profile only after the award succeeded.
pub(crate) fn cmd_award(
    config: EngineConfig,
    profile_path: &Path,
    operation_path: &Path,
    at: Option<&str>,
    dry_run: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let profile: OperatorProfile = read_json(profile_path, "profile", output, quiet);
    let operation: Operation = read_json(operation_path, "operation", output, quiet);
    let completed_at = parse_time(at, output, quiet);

    let coordinator = match ProgressionCoordinator::new(config) {
        Ok(c) => c,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let result = if dry_run {
        coordinator
            .plan_award(&profile, &operation, completed_at)
            .map(|plan| plan.result)
    } else {
        let store = MemoryStore::with_data(vec![ProfileRecord::from(profile.clone())], Vec::new());
        let rt = runtime(output, quiet);
        rt.block_on(async {
            let result = coordinator
                .award(&profile, &operation, completed_at, &store)
                .await?;
            let updated = store.get_profile(&profile.id).await?;
            write_profile(profile_path, &updated.profile, output, quiet);
            Ok::<_, EngineError>(result)
        })
    };

    match result {
        Ok(result) => print_result(&result, dry_run, output, quiet),
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

fn write_profile(path: &Path, profile: &OperatorProfile, output: OutputFormat, quiet: bool) {
    let written = serde_json::to_string_pretty(profile)
        .map_err(|e| e.to_string())
        .and_then(|json| std::fs::write(path, json + "\n").map_err(|e| e.to_string()));
    if let Err(e) = written {
        let msg = format!("error: failed to write profile {}: {}", path.display(), e);
        report_error(&msg, output, quiet);
        process::exit(1);
    }
    tracing::debug!(path = %path.display(), xp = profile.xp, "profile written");
}

fn print_result(result: &AwardResult, dry_run: bool, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => print_json(result),
        OutputFormat::Text => {
            let prefix = if dry_run { "would award" } else { "awarded" };
            println!(
                "{} {} XP to {} for {} (total {} XP)",
                prefix, result.xp_earned, result.operator_id, result.operation_id, result.total_xp
            );
            if quiet {
                return;
            }
            if let Some(tokens) = result.tokens {
                println!(
                    "tokens: {} {}",
                    tokens,
                    result.currency.as_deref().unwrap_or_default()
                );
            }
            if result.rank_changed {
                println!("rank up: {} -> {}", result.previous_rank, result.new_rank);
            } else {
                println!("rank: {}", result.new_rank);
            }
        }
    }
}
