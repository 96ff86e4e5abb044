// src/source/mod.rs

//! Upstream chat source abstraction.
//!
//! The pipeline only ever talks to [`MessageSource`]; the shipped
//! implementation is the Discord REST API in [`discord`].

pub mod discord;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

pub use discord::DiscordConnector;

/// A top-level guild visible to the session.
#[derive(Debug, Clone)]
pub struct GuildRef {
    pub id: String,
    pub name: String,
}

/// A channel or thread whose history can be paginated.
#[derive(Debug, Clone)]
pub struct ContainerRef {
    pub guild_id: String,
    pub id: String,
    pub name: String,

    /// Parent channel name when this container is a thread
    pub parent: Option<String>,
}

impl ContainerRef {
    pub fn is_thread(&self) -> bool {
        self.parent.is_some()
    }
}

/// One message as returned by the upstream, before any filtering.
#[derive(Debug, Clone)]
pub struct SourceMessage {
    pub id: String,
    pub author: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,

    /// Attachment URLs in upstream order
    pub attachments: Vec<String>,

    /// Per-emoji reaction counts
    pub reactions: Vec<u64>,
}

/// Continuation token for paging through one container's history.
#[derive(Debug, Clone)]
pub enum HistoryCursor {
    /// First page: everything strictly after the checkpoint, or the full
    /// history when no checkpoint exists
    Start(Option<DateTime<Utc>>),

    /// Subsequent pages: everything after the given message id
    After(String),
}

/// An authenticated session over the upstream hierarchy.
///
/// `history_page` returns pages oldest-first; the final message of a page
/// is the continuation point, and a page shorter than `page_size` ends the
/// walk.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn guilds(&self) -> Result<Vec<GuildRef>>;

    async fn channels(&self, guild: &GuildRef) -> Result<Vec<ContainerRef>>;

    async fn threads(&self, channel: &ContainerRef) -> Result<Vec<ContainerRef>>;

    async fn history_page(
        &self,
        container: &ContainerRef,
        cursor: &HistoryCursor,
        page_size: usize,
    ) -> Result<Vec<SourceMessage>>;
}

/// Opens an authenticated session, exactly once per run.
///
/// The returned session owns its connection state and tears it down when
/// dropped, whichever way the run exits.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn MessageSource>>;
}
