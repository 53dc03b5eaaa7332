// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Frilans - freelance listing aggregator.
//!
//! This is the binary entry point: the long-running `serve` daemon plus
//! one-shot operator commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod jobs;
mod profile;
mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use frilans_config::FrilansConfig;
use frilans_core::FrilansError;

/// Frilans - freelance listings, filtered per subscriber and delivered to Telegram.
#[derive(Parser, Debug)]
#[command(name = "frilans", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the fetch, digest, and purge schedules until interrupted.
    Serve,
    /// Run one fetch cycle and deliver instant notifications.
    Cycle {
        /// Print the cycle report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Send any daily digests that are due now.
    Digest {
        #[arg(long)]
        json: bool,
    },
    /// Remove data older than the retention window.
    Purge {
        #[arg(long)]
        json: bool,
    },
    /// Show store statistics, recent delivery failures, and recent activity.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
        /// Number of recent failures to list.
        #[arg(long, default_value_t = 10)]
        failures: usize,
        /// Number of recent audit entries to list.
        #[arg(long, default_value_t = 10)]
        audit: usize,
    },
    /// Inspect or change a subscriber profile.
    Profile {
        /// Telegram user id of the subscriber.
        user_id: i64,
        #[command(subcommand)]
        op: profile::ProfileOp,
    },
}

fn load_config(path: Option<&std::path::Path>) -> FrilansConfig {
    let result = match path {
        Some(p) => frilans_config::load_and_validate_path(p),
        None => frilans_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            frilans_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("frilans={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn report_adjustments(config: &FrilansConfig) {
    for adjustment in &config.adjustments {
        tracing::warn!(
            key = adjustment.key,
            configured = adjustment.configured,
            applied = adjustment.applied,
            "configured value below floor, raised"
        );
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());
    init_tracing(&config.daemon.log_level);
    report_adjustments(&config);

    let result: Result<(), FrilansError> = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Cycle { json }) => jobs::run_cycle_once(config, json).await,
        Some(Commands::Digest { json }) => jobs::run_digest_once(config, json).await,
        Some(Commands::Purge { json }) => jobs::run_purge_once(config, json).await,
        Some(Commands::Status {
            json,
            plain,
            failures,
            audit,
        }) => status::run_status(&config, json, plain, failures, audit).await,
        Some(Commands::Profile { user_id, op }) => {
            profile::run_profile(&config, user_id, op).await
        }
        None => {
            println!("frilans: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    #[tracing_test::traced_test]
    fn floor_adjustments_are_logged() {
        let config =
            frilans_config::load_and_validate_str("[collector]\nfetch_interval_mins = 5\n")
                .unwrap();
        report_adjustments(&config);
        assert!(logs_contain("configured value below floor"));
        assert!(logs_contain("collector.fetch_interval_mins"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_profile_budget_command() {
        let cli = Cli::try_parse_from([
            "frilans", "profile", "42", "set-budget", "--min", "10000", "--max", "50000",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Profile { user_id, op }) => {
                assert_eq!(user_id, 42);
                assert!(matches!(
                    op,
                    profile::ProfileOp::SetBudget {
                        min: Some(_),
                        max: Some(_)
                    }
                ));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["frilans", "status", "--json", "--config", "/tmp/f.toml"])
            .unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/f.toml")));
    }
}
