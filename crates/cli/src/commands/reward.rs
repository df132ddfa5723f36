use std::path::Path;
use std::process;

use opsboard_core::{EngineConfig, Operation};
use opsboard_engine::{reward_breakdown, Timeliness};
use time::OffsetDateTime;

use super::{fmt_time, parse_time, print_json, read_json};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_reward(
    config: &EngineConfig,
    operation_path: &Path,
    at: Option<&str>,
    output: OutputFormat,
    quiet: bool,
) {
    let operation: Operation = read_json(operation_path, "operation", output, quiet);
    let completed_at = parse_time(at, output, quiet).unwrap_or_else(OffsetDateTime::now_utc);

    let breakdown = match reward_breakdown(config, &operation, completed_at) {
        Ok(b) => b,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "operation_id": operation.id,
            "completed_at": fmt_time(completed_at),
            "xp": breakdown.total,
            "breakdown": breakdown,
        })),
        OutputFormat::Text => {
            println!("{}: {} XP", operation.id, breakdown.total);
            if quiet {
                return;
            }
            println!("  base      {} ({})", breakdown.base_xp, operation.difficulty);
            println!(
                "  category  x{} ({}) = {}",
                breakdown.category_multiplier, operation.category, breakdown.category_xp
            );
            println!("  priority  +{} ({})", breakdown.priority_bonus, operation.priority);
            println!(
                "  timing    {} x{}",
                timeliness_label(breakdown.timeliness),
                breakdown.time_multiplier
            );
            if breakdown.floored {
                println!("  raised to minimum of {} XP", config.minimum_xp);
            }
        }
    }
}

fn timeliness_label(t: Timeliness) -> &'static str {
    match t {
        Timeliness::NoDeadline => "no deadline",
        Timeliness::Early => "early",
        Timeliness::OnTime => "on time",
        Timeliness::Late => "late",
    }
}
