//! Guild provider trait: the seam to the chat platform transport
//!
//! The transport (gateway connection, REST client, cache) lives outside this
//! crate. `GuildProvider` is everything the moderation log pipeline needs
//! from it: audit trail reads, ban list reads, a permission probe, channel
//! lookup, and delivery.

use crate::error::Result;
use crate::types::{AuditLogFilter, AuditRecord, ChannelId, GuildId, LifecycleEvent, RenderedLogEntry, UserId};
use async_trait::async_trait;
use std::collections::HashSet;

pub mod memory;

/// Core trait for chat platform backends
#[async_trait]
pub trait GuildProvider: Send + Sync {
    /// Fetch audit entries of one action type, most recent first
    async fn fetch_audit_entries(
        &self,
        guild: GuildId,
        filter: &AuditLogFilter,
    ) -> Result<Vec<AuditRecord>>;

    /// Fetch the ids of every user currently banned from the guild
    async fn fetch_bans(&self, guild: GuildId) -> Result<HashSet<UserId>>;

    /// Whether the bot account may read the guild's audit trail
    async fn can_view_audit_log(&self, guild: GuildId) -> bool;

    /// Whether the channel still exists in the guild
    async fn channel_exists(&self, guild: GuildId, channel: ChannelId) -> bool;

    /// Deliver a rendered entry to a channel
    ///
    /// Permission failures surface as `ModLogError::Api` carrying the
    /// platform's code and message; classification is the caller's job.
    async fn send(
        &self,
        guild: GuildId,
        channel: ChannelId,
        entry: &RenderedLogEntry,
    ) -> Result<()>;

    /// Provider name (e.g., "memory", "gateway")
    fn name(&self) -> &str;
}

/// Async stream of lifecycle events from the transport
#[async_trait]
pub trait Subscription: Send {
    /// Receive the next event, or `None` once the transport has shut down
    async fn next(&mut self) -> Result<Option<LifecycleEvent>>;
}
