//! Run orchestration.
//!
//! One invocation = one run: resolve the checkpoint, fetch, normalize,
//! merge, persist, log. Pipeline failures after startup are caught here
//! exactly once and routed into the run log; only the pre-fetch fatal
//! cases (credential, allow-list) propagate to the caller.

use std::path::Path;
use std::time::Instant;

use chrono::Utc;

use crate::error::Result;
use crate::models::{Config, Corpus, Record, RunLogEntry};
use crate::pipeline::allowlist::AllowList;
use crate::pipeline::{checkpoint, fetch, merge, normalize};
use crate::source::{Connector, MessageSource};
use crate::storage::StoreGateway;

/// Caller-supplied knobs for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Global cap on retained messages
    pub limit: Option<usize>,

    /// Destructive reset: drop the corpus and refetch everything
    pub reset: bool,
}

/// How a run ended. `Failed` is a logged, clean exit, not an error.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunSummary),
    Failed { error: String },
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub rows_added: usize,
    pub total_rows: usize,

    /// Messages retained by the fetch stage before merging
    pub retained: usize,

    pub containers_failed: usize,
    pub cap_reached: bool,
}

/// Asks the operator to approve a destructive reset.
pub trait ResetConfirm: Send + Sync {
    fn confirm_reset(&self) -> bool;
}

/// Execute one full ingestion run.
pub async fn run_ingest(
    connector: &dyn Connector,
    store: &dyn StoreGateway,
    confirm: &dyn ResetConfirm,
    config: &Config,
    allowlist_path: &Path,
    opts: &RunOptions,
) -> Result<RunOutcome> {
    // A declined reset aborts before anything is touched or logged.
    if opts.reset && !confirm.confirm_reset() {
        log::info!("Reset declined; nothing was changed");
        return Ok(RunOutcome::Aborted);
    }

    let allow = AllowList::load(allowlist_path)?;
    log::info!("Allow-list loaded: {} authors", allow.len());

    let session = connector.connect().await?;

    let run_time = Utc::now();
    let timer = Instant::now();

    let result = execute(session.as_ref(), store, &allow, config, opts).await;
    let duration_minutes = timer.elapsed().as_secs_f64() / 60.0;
    let limit = opts.limit.map(|l| l as u64);

    let (outcome, entry) = match result {
        Ok(summary) => {
            log::info!(
                "Run complete: {} rows added, {} total rows",
                summary.rows_added,
                summary.total_rows
            );
            let entry = RunLogEntry::success(
                run_time,
                summary.rows_added as u64,
                summary.total_rows as u64,
                duration_minutes,
                limit,
                opts.reset,
            );
            (RunOutcome::Completed(summary), entry)
        }
        Err(error) => {
            let message = error.to_string();
            log::error!("Run failed: {}", message);
            let entry =
                RunLogEntry::failure(run_time, message.clone(), duration_minutes, limit, opts.reset);
            (RunOutcome::Failed { error: message }, entry)
        }
    };

    // A broken audit log must not change the run's outcome.
    if let Err(error) = append_entry(store, &entry).await {
        log::error!("Failed to append run log entry: {}", error);
    }

    Ok(outcome)
}

/// The fallible pipeline body; every error raised here lands in the log.
async fn execute(
    source: &dyn MessageSource,
    store: &dyn StoreGateway,
    allow: &AllowList,
    config: &Config,
    opts: &RunOptions,
) -> Result<RunSummary> {
    let corpus = if opts.reset {
        log::info!("Reset confirmed; starting from an empty corpus");
        Corpus::empty()
    } else {
        checkpoint::load_corpus(store).await
    };

    let cursor = checkpoint::resolve(&corpus);
    match cursor {
        Some(ts) => log::info!("Resuming after {}", ts),
        None => log::info!("No checkpoint; fetching the full history"),
    }

    let outcome = fetch::fetch_all(source, cursor, allow, opts.limit, &config.source).await?;
    log::info!(
        "Fetched {} messages, retained {} ({} containers failed)",
        outcome.fetched_total(),
        outcome.messages.len(),
        outcome.failed_containers()
    );

    let incoming: Vec<Record> = outcome.messages.iter().map(normalize::normalize).collect();
    let merged = merge::merge(corpus, incoming);

    store.write_corpus(&merged.corpus.encode()?).await?;

    Ok(RunSummary {
        rows_added: merged.rows_added,
        total_rows: merged.corpus.len(),
        retained: outcome.messages.len(),
        containers_failed: outcome.failed_containers(),
        cap_reached: outcome.cap_reached,
    })
}

async fn append_entry(store: &dyn StoreGateway, entry: &RunLogEntry) -> Result<()> {
    store.append_log(&entry.encode_line()?).await
}
