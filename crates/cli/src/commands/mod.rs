pub(crate) mod award;
pub(crate) mod board;
pub(crate) mod rank;
pub(crate) mod reward;

use std::path::Path;
use std::process;

use opsboard_core::EngineConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::{report_error, OutputFormat};

/// Load `--config` or fall back to the built-in tables. Exits on any error.
pub(crate) fn load_config(path: Option<&Path>, output: OutputFormat, quiet: bool) -> EngineConfig {
    let Some(path) = path else {
        return EngineConfig::default();
    };
    match EngineConfig::load(path).and_then(|config| config.validate().map(|()| config)) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "engine config loaded");
            config
        }
        Err(e) => {
            if !quiet {
                match output {
                    OutputFormat::Json => eprintln!("{}", e.to_json_value()),
                    OutputFormat::Text => eprintln!("error: {}", e),
                }
            }
            process::exit(1);
        }
    }
}

/// Read and deserialize a JSON file. Exits on any error.
pub(crate) fn read_json<T: DeserializeOwned>(
    path: &Path,
    what: &str,
    output: OutputFormat,
    quiet: bool,
) -> T {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error: {} file not found: {}: {}", what, path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error: invalid {} JSON in {}: {}", what, path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Parse an optional RFC 3339 `--at` value.
pub(crate) fn parse_time(
    at: Option<&str>,
    output: OutputFormat,
    quiet: bool,
) -> Option<OffsetDateTime> {
    let at = at?;
    match OffsetDateTime::parse(at, &Rfc3339) {
        Ok(t) => Some(t),
        Err(e) => {
            let msg = format!("error: invalid --at timestamp '{}': {}", at, e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}

/// Format an RFC 3339 timestamp for text output.
pub(crate) fn fmt_time(t: OffsetDateTime) -> String {
    t.format(&Rfc3339).unwrap_or_else(|_| t.to_string())
}
