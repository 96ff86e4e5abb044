//! In-memory source for tests: a small guild tree with injectable
//! per-container failures and real pagination behavior.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::source::{Connector, ContainerRef, GuildRef, HistoryCursor, MessageSource, SourceMessage};

#[derive(Debug, Clone, Default)]
pub struct MockSource {
    guilds: Vec<GuildRef>,
    channels: HashMap<String, Vec<ContainerRef>>,
    threads: HashMap<String, Vec<ContainerRef>>,
    history: HashMap<String, Vec<SourceMessage>>,
    fail_containers: HashSet<String>,
    fail_channel_listing: HashSet<String>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guild(mut self, id: &str, name: &str) -> Self {
        self.guilds.push(GuildRef {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_channel(mut self, guild_id: &str, id: &str, name: &str) -> Self {
        self.channels
            .entry(guild_id.to_string())
            .or_default()
            .push(ContainerRef {
                guild_id: guild_id.to_string(),
                id: id.to_string(),
                name: name.to_string(),
                parent: None,
            });
        self
    }

    /// Register a thread under an existing channel.
    pub fn with_thread(mut self, channel_id: &str, id: &str, name: &str) -> Self {
        let channel = self
            .channels
            .values()
            .flatten()
            .find(|c| c.id == channel_id)
            .cloned()
            .unwrap_or_else(|| panic!("mock thread {id} added before channel {channel_id}"));
        self.threads
            .entry(channel_id.to_string())
            .or_default()
            .push(ContainerRef {
                guild_id: channel.guild_id.clone(),
                id: id.to_string(),
                name: name.to_string(),
                parent: Some(channel.name.clone()),
            });
        self
    }

    pub fn with_message(mut self, container_id: &str, message: SourceMessage) -> Self {
        self.history
            .entry(container_id.to_string())
            .or_default()
            .push(message);
        self
    }

    /// Make `history_page` fail for the given container.
    pub fn fail_container(mut self, container_id: &str) -> Self {
        self.fail_containers.insert(container_id.to_string());
        self
    }

    /// Make `channels` fail for the given guild.
    pub fn fail_channel_listing(mut self, guild_id: &str) -> Self {
        self.fail_channel_listing.insert(guild_id.to_string());
        self
    }

    pub fn connector(self) -> MockConnector {
        MockConnector {
            source: self,
            fail_login: false,
        }
    }
}

#[async_trait]
impl MessageSource for MockSource {
    async fn guilds(&self) -> Result<Vec<GuildRef>> {
        Ok(self.guilds.clone())
    }

    async fn channels(&self, guild: &GuildRef) -> Result<Vec<ContainerRef>> {
        if self.fail_channel_listing.contains(&guild.id) {
            return Err(AppError::fetch(&guild.name, "channel listing unavailable"));
        }
        Ok(self.channels.get(&guild.id).cloned().unwrap_or_default())
    }

    async fn threads(&self, channel: &ContainerRef) -> Result<Vec<ContainerRef>> {
        Ok(self.threads.get(&channel.id).cloned().unwrap_or_default())
    }

    async fn history_page(
        &self,
        container: &ContainerRef,
        cursor: &HistoryCursor,
        page_size: usize,
    ) -> Result<Vec<SourceMessage>> {
        if self.fail_containers.contains(&container.id) {
            return Err(AppError::fetch(&container.name, "access denied"));
        }

        let all = self.history.get(&container.id).cloned().unwrap_or_default();
        let remaining: Vec<SourceMessage> = match cursor {
            HistoryCursor::Start(None) => all,
            HistoryCursor::Start(Some(ts)) => {
                all.into_iter().filter(|m| m.timestamp > *ts).collect()
            }
            HistoryCursor::After(id) => {
                let id: u64 = id.parse().unwrap_or(0);
                all.into_iter()
                    .filter(|m| m.id.parse::<u64>().unwrap_or(0) > id)
                    .collect()
            }
        };

        Ok(remaining.into_iter().take(page_size).collect())
    }
}

#[derive(Debug, Clone)]
pub struct MockConnector {
    pub source: MockSource,
    pub fail_login: bool,
}

impl MockConnector {
    pub fn failing_login(mut self) -> Self {
        self.fail_login = true;
        self
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn MessageSource>> {
        if self.fail_login {
            return Err(AppError::auth("mock credential rejected"));
        }
        Ok(Box::new(self.source.clone()))
    }
}

/// Build a plain message with the given numeric id and author.
pub fn message(id: u64, author: &str, timestamp: chrono::DateTime<chrono::Utc>) -> SourceMessage {
    SourceMessage {
        id: id.to_string(),
        author: author.to_string(),
        body: format!("message {id}"),
        timestamp,
        attachments: vec![],
        reactions: vec![],
    }
}
