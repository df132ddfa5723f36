use std::path::Path;
use std::process;

use opsboard_core::{Category, EngineConfig, Operation, OperationStatus, OperatorProfile};
use opsboard_engine::{preview_reward, recommend, BoardFilter};
use opsboard_storage::MemoryStore;
use time::OffsetDateTime;

use super::{fmt_time, print_json, read_json};
use crate::{report_error, runtime, OutputFormat};

pub(crate) struct BoardOptions<'a> {
    pub operations: &'a Path,
    pub skills: Vec<String>,
    pub status: &'a str,
    pub category: Option<&'a str>,
    pub search: Option<String>,
    pub limit: usize,
}

pub(crate) fn cmd_board(
    config: &EngineConfig,
    opts: BoardOptions<'_>,
    output: OutputFormat,
    quiet: bool,
) {
    let operations: Vec<Operation> = read_json(opts.operations, "operations", output, quiet);

    let status = if opts.status.eq_ignore_ascii_case("any") {
        None
    } else {
        match opts.status.parse::<OperationStatus>() {
            Ok(s) => Some(s),
            Err(e) => {
                report_error(&format!("error: {}", e), output, quiet);
                process::exit(1);
            }
        }
    };
    let category = match opts.category.map(str::parse::<Category>).transpose() {
        Ok(c) => c,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    let filter = BoardFilter {
        status,
        category,
        search: opts.search,
        limit: opts.limit,
    };
    let viewer = OperatorProfile::new("cli").with_skills(opts.skills);
    let store = MemoryStore::with_data(Vec::new(), operations);

    let board = match runtime(output, quiet).block_on(recommend(&store, &viewer, &filter)) {
        Ok(b) => b,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let now = OffsetDateTime::now_utc();
    let mut rows = Vec::with_capacity(board.len());
    for operation in &board {
        match preview_reward(config, operation, now) {
            Ok(xp) => rows.push((operation, xp)),
            Err(e) => {
                report_error(&format!("error: {}: {}", operation.id, e), output, quiet);
                process::exit(1);
            }
        }
    }

    match output {
        OutputFormat::Json => {
            let items: Vec<serde_json::Value> = rows
                .iter()
                .map(|(operation, xp)| {
                    serde_json::json!({
                        "operation": operation,
                        "preview_xp": xp,
                    })
                })
                .collect();
            print_json(&items);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                if !quiet {
                    println!("no matching operations");
                }
                return;
            }
            for (operation, xp) in rows {
                let due = operation
                    .deadline
                    .map(|d| format!(" due {}", fmt_time(d)))
                    .unwrap_or_default();
                println!(
                    "{:<10} {:<9} {:>5} XP  {}{}",
                    operation.id,
                    operation.priority.as_str(),
                    xp,
                    operation.title,
                    due
                );
            }
        }
    }
}
