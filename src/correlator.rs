//! Audit trail correlation
//!
//! Ban notifications arrive without the moderator or the reason. Both live
//! in the guild's audit trail, which the platform may update a moment
//! after the notification fires, so the most recent entry is re-read a
//! bounded number of times until it matches the affected user.

use crate::error::{ModLogError, Result};
use crate::provider::GuildProvider;
use crate::retry::RetryPolicy;
use crate::types::{AuditAction, AuditLogFilter, AuditRecord, Correlation, Guild, User, UserId};
use std::sync::Arc;

/// Placeholder reason used when no audit entry matched the target
pub const NO_MATCHING_ENTRY: &str = "ERROR: Unable to find matching log entry";

/// Recovers moderator and reason for moderation events
#[derive(Clone)]
pub struct AuditCorrelator {
    provider: Arc<dyn GuildProvider>,
    retry: RetryPolicy,
    fetch_limit: usize,
}

impl AuditCorrelator {
    pub fn new(provider: Arc<dyn GuildProvider>, retry: RetryPolicy, fetch_limit: usize) -> Self {
        Self {
            provider,
            retry,
            fetch_limit,
        }
    }

    /// Find the audit entry recording `action` against `target`
    ///
    /// Only `TargetMismatch` is retried. `AuditReadDenied` and transport
    /// failures end the search on the attempt that produced them.
    pub async fn find_responsible_moderator(
        &self,
        guild: &Guild,
        target: &User,
        action: AuditAction,
    ) -> Result<AuditRecord> {
        self.retry
            .run(
                |e: &ModLogError| matches!(e, ModLogError::TargetMismatch { .. }),
                |attempt| async move {
                    tracing::debug!(
                        guild = %guild.id,
                        target = %target.id,
                        ?action,
                        attempt,
                        "Reading audit log"
                    );
                    match self.latest_audit_entry(guild, action).await? {
                        Some(record) if record.target_id == Some(target.id) => Ok(record),
                        other => Err(ModLogError::TargetMismatch {
                            expected: target.id,
                            found: other.and_then(|r| r.target_id),
                        }),
                    }
                },
            )
            .await
    }

    /// Correlate, downgrading the recoverable failures to a placeholder
    ///
    /// A missing match or a denied audit read still yields a log entry with
    /// an `unknown` moderator; any other failure is returned to the caller.
    pub async fn correlate(
        &self,
        guild: &Guild,
        target: &User,
        action: AuditAction,
    ) -> Result<Correlation> {
        match self.find_responsible_moderator(guild, target, action).await {
            Ok(record) => Ok(record.into()),
            Err(ModLogError::TargetMismatch { .. }) => {
                tracing::warn!(
                    guild = %guild.id,
                    target = %target.id,
                    ?action,
                    "No matching audit log entry"
                );
                Ok(Correlation::placeholder(NO_MATCHING_ENTRY))
            }
            Err(e @ ModLogError::AuditReadDenied { .. }) => {
                tracing::warn!(guild = %guild.id, error = %e, "Audit log not readable");
                Ok(Correlation::placeholder(format!("ERROR: {}", e)))
            }
            Err(e) => Err(e),
        }
    }

    /// Whether `user` is on the guild's current ban list
    pub async fn is_user_banned(&self, guild: &Guild, user: UserId) -> Result<bool> {
        let bans = self.provider.fetch_bans(guild.id).await?;
        Ok(bans.contains(&user))
    }

    async fn latest_audit_entry(
        &self,
        guild: &Guild,
        action: AuditAction,
    ) -> Result<Option<AuditRecord>> {
        if !self.provider.can_view_audit_log(guild.id).await {
            return Err(ModLogError::AuditReadDenied {
                guild: guild.name.clone(),
            });
        }

        let filter = AuditLogFilter {
            action,
            limit: self.fetch_limit,
        };
        let entries = self
            .provider
            .fetch_audit_entries(guild.id, &filter)
            .await
            .map_err(|e| match e {
                ModLogError::Api(api) if api.is_missing_permission() => {
                    ModLogError::AuditReadDenied {
                        guild: guild.name.clone(),
                    }
                }
                other => other,
            })?;

        Ok(entries.into_iter().next())
    }
}
