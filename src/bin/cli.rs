//! Archivist CLI
//!
//! Local entry point for ingestion runs and corpus inspection.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use archivist::{
    error::Result,
    models::{Config, Corpus, RunLogEntry},
    pipeline::{self, ResetConfirm, RunOptions, RunOutcome, checkpoint},
    source::DiscordConnector,
    storage::{LocalStore, StoreGateway},
};

/// archivist - Guild chat history archiver
#[derive(Parser, Debug)]
#[command(
    name = "archivist",
    version,
    about = "Archives guild chat history into a deduplicated local corpus"
)]
struct Cli {
    /// Path to storage directory containing config and data files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch new messages and merge them into the corpus
    Sync {
        /// Cap on retained messages, for bounded test runs
        #[arg(long)]
        limit: Option<usize>,

        /// Drop the corpus and refetch the full history (asks first)
        #[arg(long)]
        reset: bool,

        /// Answer the reset confirmation with yes
        #[arg(long)]
        yes: bool,
    },

    /// Show corpus status
    Info,

    /// Show recent run-log entries
    Runs {
        /// Number of entries to show
        #[arg(long, default_value_t = 10)]
        count: usize,
    },

    /// Validate configuration files
    Validate,
}

/// Interactive reset confirmation on stdin.
struct StdinConfirm {
    assume_yes: bool,
}

impl ResetConfirm for StdinConfirm {
    fn confirm_reset(&self) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("This deletes the existing corpus and refetches everything. Type 'yes' to continue: ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        line.trim().eq_ignore_ascii_case("yes")
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    let store = LocalStore::new(&cli.storage_dir, &config.storage);

    match cli.command {
        Command::Sync { limit, reset, yes } => {
            let connector = DiscordConnector::new(config.source.clone());
            let confirm = StdinConfirm { assume_yes: yes };
            let allowlist_path = cli.storage_dir.join(&config.ingest.allowlist_file);
            let opts = RunOptions { limit, reset };

            // Only startup failures (credential, allow-list) escape here
            // and flip the exit status; anything later is in the run log.
            let outcome = pipeline::run_ingest(
                &connector,
                &store,
                &confirm,
                &config,
                &allowlist_path,
                &opts,
            )
            .await?;

            match outcome {
                RunOutcome::Completed(summary) => {
                    log::info!(
                        "Added {} rows; corpus now has {} rows",
                        summary.rows_added,
                        summary.total_rows
                    );
                    if summary.containers_failed > 0 {
                        log::warn!(
                            "{} containers failed and were skipped",
                            summary.containers_failed
                        );
                    }
                    if summary.cap_reached {
                        log::info!("Stopped at the requested limit");
                    }
                }
                RunOutcome::Failed { error } => {
                    log::error!("Run failed: {error}");
                }
                RunOutcome::Aborted => {
                    log::info!("Aborted; nothing was changed");
                }
            }
        }

        Command::Info => match store.read_corpus().await? {
            Some(bytes) => {
                let corpus = Corpus::decode(&bytes)?;
                log::info!("Corpus: {} rows", corpus.len());
                if !corpus.malformed.is_empty() {
                    log::warn!("{} rows no longer decode", corpus.malformed.len());
                }
                match checkpoint::resolve(&corpus) {
                    Some(ts) => log::info!("Checkpoint: {}", ts),
                    None => log::info!("Checkpoint: none (next run is a full scan)"),
                }
            }
            None => log::info!("No corpus found yet."),
        },

        Command::Runs { count } => match store.read_log().await? {
            Some(bytes) => {
                for entry in RunLogEntry::decode_lines(&bytes).iter().rev().take(count) {
                    let error = if entry.error_message.is_empty() {
                        String::new()
                    } else {
                        format!(" error={}", entry.error_message)
                    };
                    log::info!(
                        "{} success={} rows_added={} total={} duration={:.1}m{}",
                        entry.run_time,
                        entry.success,
                        entry.rows_added,
                        entry.total_rows,
                        entry.duration_minutes,
                        error
                    );
                }
            }
            None => log::info!("No runs logged yet."),
        },

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK");
        }
    }

    Ok(())
}
