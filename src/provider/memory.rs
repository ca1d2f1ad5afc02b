//! In-memory guild provider for testing and single-process use
//!
//! Holds guilds, channels, ban lists and audit trails in memory. Audit
//! responses can be scripted per call to reproduce the platform's
//! audit-log write lag, and ban-list or delivery failures can be injected.

use super::{GuildProvider, Subscription};
use crate::error::{ApiError, ModLogError, Result};
use crate::types::{
    AuditLogFilter, AuditRecord, ChannelId, Guild, GuildId, LifecycleEvent, RenderedLogEntry,
    UserId,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

const UNKNOWN_GUILD_CODE: u32 = 10004;

/// An entry accepted by `send`
#[derive(Debug, Clone)]
pub struct DeliveredEntry {
    pub guild: GuildId,
    pub channel: ChannelId,
    pub entry: RenderedLogEntry,
}

/// Scripted result for one audit trail fetch
pub type AuditResponse = std::result::Result<Vec<AuditRecord>, ApiError>;

#[derive(Default)]
struct GuildState {
    channels: HashSet<ChannelId>,
    bans: HashSet<UserId>,
    ban_list_failure: Option<ApiError>,
    can_view_audit_log: bool,
    /// Most recent first
    audit_log: Vec<AuditRecord>,
    scripted_audit: VecDeque<AuditResponse>,
    send_failures: HashMap<ChannelId, ApiError>,
}

#[derive(Default)]
struct MemoryState {
    guilds: HashMap<GuildId, GuildState>,
    delivered: Vec<DeliveredEntry>,
    audit_fetches: usize,
}

/// In-memory `GuildProvider`
#[derive(Default)]
pub struct MemoryGuildProvider {
    state: Arc<RwLock<MemoryState>>,
    subscribers: RwLock<Vec<mpsc::UnboundedSender<LifecycleEvent>>>,
}

impl MemoryGuildProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a guild; the bot may read its audit log by default
    pub async fn add_guild(&self, guild: &Guild) {
        let mut state = self.state.write().await;
        state.guilds.entry(guild.id).or_insert_with(|| GuildState {
            can_view_audit_log: true,
            ..Default::default()
        });
    }

    pub async fn add_channel(&self, guild: GuildId, channel: ChannelId) {
        self.with_guild(guild, |g| {
            g.channels.insert(channel);
        })
        .await;
    }

    pub async fn remove_channel(&self, guild: GuildId, channel: ChannelId) {
        self.with_guild(guild, |g| {
            g.channels.remove(&channel);
        })
        .await;
    }

    pub async fn ban(&self, guild: GuildId, user: UserId) {
        self.with_guild(guild, |g| {
            g.bans.insert(user);
        })
        .await;
    }

    /// Make every ban list fetch for the guild fail
    pub async fn fail_ban_list(&self, guild: GuildId, error: ApiError) {
        self.with_guild(guild, |g| g.ban_list_failure = Some(error))
            .await;
    }

    pub async fn set_audit_access(&self, guild: GuildId, allowed: bool) {
        self.with_guild(guild, |g| g.can_view_audit_log = allowed)
            .await;
    }

    /// Append an audit entry as the most recent one
    pub async fn record_audit(&self, guild: GuildId, record: AuditRecord) {
        self.with_guild(guild, |g| g.audit_log.insert(0, record))
            .await;
    }

    /// Queue responses returned by successive audit fetches
    ///
    /// Once the script is drained, fetches fall back to the recorded trail.
    pub async fn script_audit_responses(&self, guild: GuildId, responses: Vec<AuditResponse>) {
        self.with_guild(guild, |g| g.scripted_audit.extend(responses))
            .await;
    }

    /// Make delivery to one channel fail with `error`
    pub async fn fail_send(&self, guild: GuildId, channel: ChannelId, error: ApiError) {
        self.with_guild(guild, |g| {
            g.send_failures.insert(channel, error);
        })
        .await;
    }

    /// Every entry delivered so far, oldest first
    pub async fn delivered(&self) -> Vec<DeliveredEntry> {
        self.state.read().await.delivered.clone()
    }

    /// Number of audit trail fetches served, including denied ones
    pub async fn audit_fetch_count(&self) -> usize {
        self.state.read().await.audit_fetches
    }

    /// Open a subscription to events passed to `emit`
    pub async fn subscribe(&self) -> MemorySubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().await.push(tx);
        MemorySubscription { rx }
    }

    /// Publish a lifecycle event to every open subscription
    pub async fn emit(&self, event: LifecycleEvent) {
        let mut subscribers = self.subscribers.write().await;
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Close all subscriptions; their `next()` returns `None` once drained
    pub async fn shutdown(&self) {
        self.subscribers.write().await.clear();
    }

    async fn with_guild<F>(&self, guild: GuildId, f: F)
    where
        F: FnOnce(&mut GuildState),
    {
        let mut state = self.state.write().await;
        f(state.guilds.entry(guild).or_insert_with(|| GuildState {
            can_view_audit_log: true,
            ..Default::default()
        }));
    }
}

fn unknown_guild() -> ModLogError {
    ModLogError::Api(ApiError::with_code(UNKNOWN_GUILD_CODE, "Unknown Guild"))
}

#[async_trait]
impl GuildProvider for MemoryGuildProvider {
    async fn fetch_audit_entries(
        &self,
        guild: GuildId,
        filter: &AuditLogFilter,
    ) -> Result<Vec<AuditRecord>> {
        let mut state = self.state.write().await;
        state.audit_fetches += 1;
        let g = state.guilds.get_mut(&guild).ok_or_else(unknown_guild)?;

        if !g.can_view_audit_log {
            return Err(ModLogError::Api(ApiError::with_code(
                50013,
                "Missing Permissions",
            )));
        }

        if let Some(response) = g.scripted_audit.pop_front() {
            return response.map_err(ModLogError::Api);
        }

        Ok(g.audit_log
            .iter()
            .filter(|r| r.action == filter.action)
            .take(filter.limit)
            .cloned()
            .collect())
    }

    async fn fetch_bans(&self, guild: GuildId) -> Result<HashSet<UserId>> {
        let state = self.state.read().await;
        let g = state.guilds.get(&guild).ok_or_else(unknown_guild)?;
        match &g.ban_list_failure {
            Some(err) => Err(ModLogError::Api(err.clone())),
            None => Ok(g.bans.clone()),
        }
    }

    async fn can_view_audit_log(&self, guild: GuildId) -> bool {
        let state = self.state.read().await;
        state
            .guilds
            .get(&guild)
            .map(|g| g.can_view_audit_log)
            .unwrap_or(false)
    }

    async fn channel_exists(&self, guild: GuildId, channel: ChannelId) -> bool {
        let state = self.state.read().await;
        state
            .guilds
            .get(&guild)
            .map(|g| g.channels.contains(&channel))
            .unwrap_or(false)
    }

    async fn send(
        &self,
        guild: GuildId,
        channel: ChannelId,
        entry: &RenderedLogEntry,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let g = state.guilds.get(&guild).ok_or_else(unknown_guild)?;

        if let Some(err) = g.send_failures.get(&channel) {
            return Err(ModLogError::Api(err.clone()));
        }
        if !g.channels.contains(&channel) {
            return Err(ModLogError::Api(ApiError::with_code(10003, "Unknown Channel")));
        }

        state.delivered.push(DeliveredEntry {
            guild,
            channel,
            entry: entry.clone(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Subscription fed by `MemoryGuildProvider::emit`
pub struct MemorySubscription {
    rx: mpsc::UnboundedReceiver<LifecycleEvent>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next(&mut self) -> Result<Option<LifecycleEvent>> {
        Ok(self.rx.recv().await)
    }
}
