use std::process;

use opsboard_core::EngineConfig;
use opsboard_engine::RankLedger;

use super::print_json;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_rank(config: &EngineConfig, xp: u64, output: OutputFormat, quiet: bool) {
    let ledger = match RankLedger::from_config(config) {
        Ok(l) => l,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    let progress = ledger.rank_progress(xp);

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "xp": xp,
            "progress": progress,
        })),
        OutputFormat::Text => match (progress.next_rank, progress.xp_to_next) {
            (Some(next), Some(remaining)) => println!(
                "{} ({}%), {} XP to {}",
                progress.rank, progress.percent, remaining, next
            ),
            _ => println!("{} (top rank)", progress.rank),
        },
    }
}
