//! Paginated fetch across the guild/channel/thread hierarchy.
//!
//! Channels fan out through a bounded concurrency pool; each worker
//! drains a channel and its threads page by page, filters by the
//! allow-list, and hands its batch back to the single consumer loop.
//! Per-container failures become report rows, never run failures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{RawMessage, SourceConfig};
use crate::pipeline::allowlist::AllowList;
use crate::source::{ContainerRef, GuildRef, HistoryCursor, MessageSource, SourceMessage};

/// Cooperative cancellation token for the global retain cap.
///
/// One claim per retained message; once the cap is spent every loop
/// boundary observes exhaustion and stops scheduling work. In-flight
/// requests are allowed to drain.
#[derive(Debug)]
pub struct RetainBudget {
    cap: Option<usize>,
    used: AtomicUsize,
}

impl RetainBudget {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            cap,
            used: AtomicUsize::new(0),
        }
    }

    /// Claim one retain slot. Returns false once the cap is spent.
    pub fn try_claim(&self) -> bool {
        match self.cap {
            None => {
                self.used.fetch_add(1, Ordering::Relaxed);
                true
            }
            Some(cap) => self
                .used
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                    (used < cap).then(|| used + 1)
                })
                .is_ok(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        match self.cap {
            None => false,
            Some(cap) => self.used.load(Ordering::SeqCst) >= cap,
        }
    }

    /// Messages retained so far.
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }
}

/// What a report row covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Guild,
    Channel,
    Thread,
}

/// Per-container traversal result. Failures are data the orchestrator
/// can inspect, not exceptions.
#[derive(Debug, Clone)]
pub struct ContainerReport {
    pub guild: String,
    pub container: String,
    pub kind: ContainerKind,

    /// Messages seen, allow-listed or not
    pub fetched: usize,

    /// Messages that passed the allow-list and claimed a cap slot
    pub retained: usize,

    pub error: Option<String>,
}

impl ContainerReport {
    fn new(guild: &str, container: &str, kind: ContainerKind) -> Self {
        Self {
            guild: guild.to_string(),
            container: container.to_string(),
            kind,
            fetched: 0,
            retained: 0,
            error: None,
        }
    }

    fn failure(guild: &str, container: &str, kind: ContainerKind, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(guild, container, kind)
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything the fetch stage hands to the orchestrator.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub messages: Vec<RawMessage>,
    pub reports: Vec<ContainerReport>,
    pub cap_reached: bool,
}

impl FetchOutcome {
    pub fn failed_containers(&self) -> usize {
        self.reports.iter().filter(|r| r.failed()).count()
    }

    pub fn fetched_total(&self) -> usize {
        self.reports.iter().map(|r| r.fetched).sum()
    }
}

/// Shared traversal state handed to every worker.
struct Walk<'a> {
    source: &'a dyn MessageSource,
    allow: &'a AllowList,
    budget: &'a RetainBudget,
    cursor: Option<DateTime<Utc>>,
    page_size: usize,
    delay: Duration,
}

/// Walk the full hierarchy and collect every retained message.
///
/// Only a failure to list the guilds themselves aborts the fetch; any
/// narrower failure is confined to its container's report row.
pub async fn fetch_all(
    source: &dyn MessageSource,
    cursor: Option<DateTime<Utc>>,
    allow: &AllowList,
    cap: Option<usize>,
    config: &SourceConfig,
) -> Result<FetchOutcome> {
    let budget = RetainBudget::new(cap);
    let walk = Walk {
        source,
        allow,
        budget: &budget,
        cursor,
        page_size: config.page_size,
        delay: Duration::from_millis(config.request_delay_ms),
    };
    let concurrency = config.max_concurrent.max(1);

    let mut messages = Vec::new();
    let mut reports = Vec::new();

    let guilds = source.guilds().await?;
    log::info!("Fetching from {} guilds", guilds.len());

    'guilds: for guild in &guilds {
        if budget.is_exhausted() {
            break;
        }
        log::info!("Guild {}: listing channels", guild.name);

        let channels = match source.channels(guild).await {
            Ok(channels) => channels,
            Err(error) => {
                log::warn!("Failed to list channels for guild {}: {}", guild.name, error);
                reports.push(ContainerReport::failure(
                    &guild.name,
                    &guild.name,
                    ContainerKind::Guild,
                    error,
                ));
                continue;
            }
        };

        let mut jobs = stream::iter(
            channels
                .into_iter()
                .map(|channel| fetch_channel(&walk, guild, channel)),
        )
        .buffer_unordered(concurrency);

        while let Some(batch) = jobs.next().await {
            messages.extend(batch.messages);
            reports.extend(batch.reports);

            if budget.is_exhausted() {
                log::info!("Retain cap reached; stopping traversal");
                break 'guilds;
            }
        }
    }

    Ok(FetchOutcome {
        messages,
        reports,
        cap_reached: budget.is_exhausted(),
    })
}

#[derive(Default)]
struct ChannelBatch {
    messages: Vec<RawMessage>,
    reports: Vec<ContainerReport>,
}

/// Drain one channel and all of its threads.
async fn fetch_channel(walk: &Walk<'_>, guild: &GuildRef, channel: ContainerRef) -> ChannelBatch {
    let mut batch = ChannelBatch::default();

    log::info!("Fetching #{}", channel.name);
    let report = drain_container(
        walk,
        &guild.name,
        &channel,
        ContainerKind::Channel,
        &mut batch.messages,
    )
    .await;
    batch.reports.push(report);

    if walk.budget.is_exhausted() {
        return batch;
    }

    let threads = match walk.source.threads(&channel).await {
        Ok(threads) => threads,
        Err(error) => {
            log::warn!("Failed to list threads for #{}: {}", channel.name, error);
            batch.reports.push(ContainerReport::failure(
                &guild.name,
                &channel.name,
                ContainerKind::Thread,
                error,
            ));
            return batch;
        }
    };

    for thread in threads {
        if walk.budget.is_exhausted() {
            break;
        }
        log::info!("Fetching thread {} (in #{})", thread.name, channel.name);
        let report = drain_container(
            walk,
            &guild.name,
            &thread,
            ContainerKind::Thread,
            &mut batch.messages,
        )
        .await;
        batch.reports.push(report);
    }

    batch
}

/// Page through one container's history after the cursor.
async fn drain_container(
    walk: &Walk<'_>,
    guild_name: &str,
    container: &ContainerRef,
    kind: ContainerKind,
    out: &mut Vec<RawMessage>,
) -> ContainerReport {
    let mut report = ContainerReport::new(guild_name, &container.name, kind);
    let mut cursor = HistoryCursor::Start(walk.cursor);

    loop {
        if walk.budget.is_exhausted() {
            break;
        }

        let page = match walk
            .source
            .history_page(container, &cursor, walk.page_size)
            .await
        {
            Ok(page) => page,
            Err(error) => {
                log::warn!("Failed to fetch history for {}: {}", container.name, error);
                report.error = Some(error.to_string());
                break;
            }
        };
        if page.is_empty() {
            break;
        }

        let short_page = page.len() < walk.page_size;
        if let Some(last) = page.last() {
            cursor = HistoryCursor::After(last.id.clone());
        }

        for message in page {
            report.fetched += 1;
            if !walk.allow.contains(&message.author) {
                continue;
            }
            if !walk.budget.try_claim() {
                break;
            }
            report.retained += 1;
            out.push(raw_message(container, message));
        }

        if short_page {
            break;
        }
        if !walk.delay.is_zero() {
            tokio::time::sleep(walk.delay).await;
        }
    }

    report
}

/// Attach container context and fold reaction counts while the upstream
/// message object is still in hand.
fn raw_message(container: &ContainerRef, message: SourceMessage) -> RawMessage {
    let total_reaction_count = message.reactions.iter().sum();
    let max_reaction_count = message.reactions.iter().copied().max().unwrap_or(0);

    let (channel, thread) = match &container.parent {
        Some(parent) => (parent.clone(), Some(container.name.clone())),
        None => (container.name.clone(), None),
    };

    RawMessage {
        guild_id: container.guild_id.clone(),
        container_id: container.id.clone(),
        message_id: message.id,
        author: message.author,
        body: message.body,
        timestamp: message.timestamp,
        channel,
        thread,
        attachment_urls: message.attachments,
        total_reaction_count,
        max_reaction_count,
    }
}
