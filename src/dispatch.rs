//! Log dispatch: deliver rendered entries to the configured channel
//!
//! An unconfigured category, a deleted channel, or a channel the bot may
//! not post in are all silent skips. Everything else is returned to the
//! caller for reporting.

use crate::error::{ApiError, ModLogError, Result};
use crate::provider::GuildProvider;
use crate::state::LogChannels;
use crate::types::{Guild, RenderedLogEntry};
use std::sync::Arc;

/// Classified delivery failure
#[derive(Debug)]
pub enum DeliveryFailure {
    /// The bot lacks access to, or send permission in, the destination
    PermissionDenied(ApiError),
    /// Anything else; surfaced to the error reporter
    Unclassified(ModLogError),
}

impl DeliveryFailure {
    pub fn classify(err: ModLogError) -> Self {
        match err {
            ModLogError::Api(api) if api.is_missing_permission() => {
                DeliveryFailure::PermissionDenied(api)
            }
            other => DeliveryFailure::Unclassified(other),
        }
    }
}

/// Delivers rendered entries to per-guild log channels
#[derive(Clone)]
pub struct LogDispatcher {
    provider: Arc<dyn GuildProvider>,
    channels: LogChannels,
}

impl LogDispatcher {
    pub fn new(provider: Arc<dyn GuildProvider>, channels: LogChannels) -> Self {
        Self { provider, channels }
    }

    pub fn channels(&self) -> &LogChannels {
        &self.channels
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Deliver `entry` to the guild's channel for its category
    ///
    /// Returns `Ok(true)` when the entry was delivered or deliberately
    /// skipped; an `Err` is always an unclassified failure.
    pub async fn deliver(&self, guild: &Guild, entry: RenderedLogEntry) -> Result<bool> {
        tracing::debug!(guild = %guild.id, category = %entry.category, "Adding mod log entry");

        let Some(channel) = self.channels.channel_for(guild.id, entry.category).await? else {
            tracing::debug!(guild = %guild.id, category = %entry.category, "Log not configured");
            return Ok(true);
        };

        if !self.provider.channel_exists(guild.id, channel).await {
            tracing::debug!(
                guild = %guild.id,
                channel = %channel,
                category = %entry.category,
                "Configured log channel no longer exists"
            );
            return Ok(true);
        }

        match self.provider.send(guild.id, channel, &entry).await {
            Ok(()) => Ok(true),
            Err(e) => match DeliveryFailure::classify(e) {
                DeliveryFailure::PermissionDenied(api) => {
                    tracing::warn!(
                        guild = %guild.id,
                        channel = %channel,
                        error = %api,
                        "Cannot post to log channel"
                    );
                    Ok(true)
                }
                DeliveryFailure::Unclassified(e) => Err(e),
            },
        }
    }
}
