mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Opsboard reward and progression engine.
#[derive(Parser)]
#[command(name = "opsboard", version, about = "Opsboard reward and progression engine")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Engine configuration TOML (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log engine decisions to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the XP an operation is worth
    Reward {
        /// Path to the operation JSON file
        operation: PathBuf,
        /// Completion time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Resolve the rank for a cumulative XP total
    Rank {
        /// Cumulative XP
        xp: u64,
    },

    /// Recommend operations matching a skill set, most urgent first
    Board {
        /// Path to a JSON array of operations
        operations: PathBuf,
        /// Comma-separated operator skills
        #[arg(long, value_delimiter = ',')]
        skills: Vec<String>,
        /// Only operations with this status ("any" disables the filter)
        #[arg(long, default_value = "open")]
        status: String,
        /// Only operations in this category
        #[arg(long)]
        category: Option<String>,
        /// Case-insensitive text search over title and description
        #[arg(long)]
        search: Option<String>,
        /// Maximum number of results (0 = no limit)
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },

    /// Award a completed operation to a profile and update the profile file
    Award {
        /// Path to the operator profile JSON file
        profile: PathBuf,
        /// Path to the operation JSON file
        operation: PathBuf,
        /// Completion time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
        /// Compute the award without writing the profile
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref(), cli.output, cli.quiet);

    match cli.command {
        Commands::Reward { operation, at } => {
            commands::reward::cmd_reward(&config, &operation, at.as_deref(), cli.output, cli.quiet);
        }
        Commands::Rank { xp } => {
            commands::rank::cmd_rank(&config, xp, cli.output, cli.quiet);
        }
        Commands::Board {
            operations,
            skills,
            status,
            category,
            search,
            limit,
        } => {
            commands::board::cmd_board(
                &config,
                commands::board::BoardOptions {
                    operations: &operations,
                    skills,
                    status: &status,
                    category: category.as_deref(),
                    search,
                    limit,
                },
                cli.output,
                cli.quiet,
            );
        }
        Commands::Award {
            profile,
            operation,
            at,
            dry_run,
        } => {
            commands::award::cmd_award(
                config,
                &profile,
                &operation,
                at.as_deref(),
                dry_run,
                cli.output,
                cli.quiet,
            );
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins unless `--verbose` is set.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Build a current-thread runtime for the async engine entry points.
pub(crate) fn runtime(output: OutputFormat, quiet: bool) -> tokio::runtime::Runtime {
    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("error: failed to start runtime: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
