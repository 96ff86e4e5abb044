//! Discord REST API v10 source implementation.
//!
//! Bot-token authentication, snowflake-based `after` pagination, and a
//! single retry on rate-limit responses.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;
use crate::source::{Connector, ContainerRef, GuildRef, HistoryCursor, MessageSource, SourceMessage};

/// Milliseconds between the Unix epoch and the Discord epoch (2015-01-01).
const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// Channel type for guild text channels.
const GUILD_TEXT: u8 = 0;

/// Largest snowflake strictly below every id minted after `ts`.
///
/// Passing this as `after` yields exactly the messages created in a later
/// millisecond than `ts`, which is the exclusive lower bound the
/// checkpoint contract asks for.
fn snowflake_after(ts: DateTime<Utc>) -> u64 {
    let ms = ts.timestamp_millis() - DISCORD_EPOCH_MS;
    if ms < 0 {
        return 0;
    }
    ((ms as u64 + 1) << 22) - 1
}

/// Connector that logs in with a bot token from the environment.
pub struct DiscordConnector {
    config: SourceConfig,
}

impl DiscordConnector {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for DiscordConnector {
    async fn connect(&self) -> Result<Box<dyn MessageSource>> {
        let token = std::env::var(&self.config.token_env)
            .map_err(|_| AppError::auth(format!("{} is not set", self.config.token_env)))?;
        let session = DiscordSession::login(&self.config, &token).await?;
        Ok(Box::new(session))
    }
}

/// An authenticated REST session.
pub struct DiscordSession {
    client: Client,
    base: String,
}

impl DiscordSession {
    /// Authenticate against the API and verify the token.
    pub async fn login(config: &SourceConfig, token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bot {token}"))
            .map_err(|_| AppError::auth("token contains invalid header characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        let session = Self {
            client,
            base: config.api_base.trim_end_matches('/').to_string(),
        };

        let response = session
            .client
            .get(session.endpoint("users/@me")?)
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED
            || response.status() == StatusCode::FORBIDDEN
        {
            return Err(AppError::auth("credential rejected by the upstream"));
        }
        let user: ApiUser = response.error_for_status()?.json().await?;
        log::info!("Logged in as {}", user.username);

        Ok(session)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/{}", self.base, path))?)
    }

    /// GET a JSON payload, retrying a couple of times on rate limits.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let mut attempts = 0;
        loop {
            let response = self.client.get(url.clone()).send().await?;
            if response.status() == StatusCode::TOO_MANY_REQUESTS && attempts < 2 {
                attempts += 1;
                let wait = response
                    .json::<ApiRateLimit>()
                    .await
                    .map(|r| r.retry_after)
                    .unwrap_or(1.0);
                log::warn!("Rate limited; retrying in {:.1}s", wait);
                tokio::time::sleep(Duration::from_secs_f64(wait)).await;
                continue;
            }
            return Ok(response.error_for_status()?.json::<T>().await?);
        }
    }
}

#[async_trait]
impl MessageSource for DiscordSession {
    async fn guilds(&self) -> Result<Vec<GuildRef>> {
        let mut guilds = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut url = self.endpoint("users/@me/guilds")?;
            url.query_pairs_mut().append_pair("limit", "200");
            if let Some(after) = &after {
                url.query_pairs_mut().append_pair("after", after);
            }

            let page: Vec<ApiGuild> = self.get_json(url).await?;
            let full = page.len() == 200;
            after = page.last().map(|g| g.id.clone());
            guilds.extend(page.into_iter().map(|g| GuildRef {
                id: g.id,
                name: g.name,
            }));

            if !full {
                return Ok(guilds);
            }
        }
    }

    async fn channels(&self, guild: &GuildRef) -> Result<Vec<ContainerRef>> {
        let url = self.endpoint(&format!("guilds/{}/channels", guild.id))?;
        let channels: Vec<ApiChannel> = self.get_json(url).await?;

        Ok(channels
            .into_iter()
            .filter(|c| c.kind == GUILD_TEXT)
            .map(|c| ContainerRef {
                guild_id: guild.id.clone(),
                name: c.name.unwrap_or_else(|| c.id.clone()),
                id: c.id,
                parent: None,
            })
            .collect())
    }

    async fn threads(&self, channel: &ContainerRef) -> Result<Vec<ContainerRef>> {
        // Active threads are listed per guild, archived ones per channel.
        let active_url = self.endpoint(&format!("guilds/{}/threads/active", channel.guild_id))?;
        let active: ApiThreadList = self.get_json(active_url).await?;

        let archived_url =
            self.endpoint(&format!("channels/{}/threads/archived/public", channel.id))?;
        let archived: ApiThreadList = self.get_json(archived_url).await?;

        let mut seen = std::collections::HashSet::new();
        let mut threads = Vec::new();
        for thread in active.threads.into_iter().chain(archived.threads) {
            if thread.parent_id.as_deref() != Some(channel.id.as_str()) {
                continue;
            }
            if !seen.insert(thread.id.clone()) {
                continue;
            }
            threads.push(ContainerRef {
                guild_id: channel.guild_id.clone(),
                name: thread.name.unwrap_or_else(|| thread.id.clone()),
                id: thread.id,
                parent: Some(channel.name.clone()),
            });
        }
        Ok(threads)
    }

    async fn history_page(
        &self,
        container: &ContainerRef,
        cursor: &HistoryCursor,
        page_size: usize,
    ) -> Result<Vec<SourceMessage>> {
        let after = match cursor {
            HistoryCursor::Start(None) => "0".to_string(),
            HistoryCursor::Start(Some(ts)) => snowflake_after(*ts).to_string(),
            HistoryCursor::After(id) => id.clone(),
        };

        let mut url = self.endpoint(&format!("channels/{}/messages", container.id))?;
        url.query_pairs_mut()
            .append_pair("limit", &page_size.to_string())
            .append_pair("after", &after);

        // The API returns newest-first; the trait contract is oldest-first.
        let mut messages: Vec<ApiMessage> = self.get_json(url).await?;
        messages.sort_by_key(|m| m.id.parse::<u64>().unwrap_or(0));

        Ok(messages
            .into_iter()
            .map(|m| SourceMessage {
                id: m.id,
                author: m.author.username,
                body: m.content,
                timestamp: m.timestamp,
                attachments: m.attachments.into_iter().map(|a| a.url).collect(),
                reactions: m.reactions.into_iter().map(|r| r.count).collect(),
            })
            .collect())
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct ApiUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct ApiGuild {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiChannel {
    id: String,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: u8,
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiThreadList {
    threads: Vec<ApiChannel>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    id: String,
    content: String,
    timestamp: DateTime<Utc>,
    author: ApiUser,
    #[serde(default)]
    attachments: Vec<ApiAttachment>,
    #[serde(default)]
    reactions: Vec<ApiReaction>,
}

#[derive(Debug, Deserialize)]
struct ApiAttachment {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiReaction {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiRateLimit {
    retry_after: f64,
}
