//! Moderation log service: one pipeline per lifecycle event
//!
//! Each event runs correlate → render → dispatch in sequence. Every
//! pipeline is its own error boundary: failures end in the error reporter
//! with the hook's context and never reach the event bus.

use crate::bus::EventBus;
use crate::config::ModLogConfig;
use crate::correlator::AuditCorrelator;
use crate::dispatch::LogDispatcher;
use crate::error::Result;
use crate::provider::GuildProvider;
use crate::render;
use crate::report::{ErrorReport, ErrorReporter, ReportField};
use crate::state::{ConfigStore, LogChannels};
use crate::types::{AuditAction, EventKind, Guild, LifecycleEvent, Member, PipelineOutcome, User};
use chrono::Utc;
use std::sync::Arc;
use tracing::Instrument;

/// Event hooks, named as they appear in error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    GuildMemberAdd,
    GuildMemberRemove,
    GuildBanAdd,
    GuildBanRemove,
    Warn,
}

impl Hook {
    pub fn name(&self) -> &'static str {
        match self {
            Hook::GuildMemberAdd => "GuildMemberAdd",
            Hook::GuildMemberRemove => "GuildMemberRemove",
            Hook::GuildBanAdd => "guildBanAdd",
            Hook::GuildBanRemove => "guildBanRemove",
            Hook::Warn => "warn",
        }
    }

    /// Report field name for the user the event is about
    pub fn subject_label(&self) -> &'static str {
        match self {
            Hook::GuildMemberAdd => "User that joined",
            Hook::GuildMemberRemove => "User that left",
            Hook::GuildBanAdd => "Banned User",
            Hook::GuildBanRemove => "Unbanned User",
            Hook::Warn => "Warned User",
        }
    }
}

/// The moderation log pipeline
pub struct ModLogService {
    correlator: AuditCorrelator,
    dispatcher: LogDispatcher,
    reporter: Arc<dyn ErrorReporter>,
    config: ModLogConfig,
}

impl ModLogService {
    pub fn new(
        provider: Arc<dyn GuildProvider>,
        store: Arc<dyn ConfigStore>,
        reporter: Arc<dyn ErrorReporter>,
        config: ModLogConfig,
    ) -> Self {
        let correlator = AuditCorrelator::new(
            provider.clone(),
            config.audit_retry,
            config.audit_fetch_limit,
        );
        let dispatcher = LogDispatcher::new(provider, LogChannels::new(store));
        Self {
            correlator,
            dispatcher,
            reporter,
            config,
        }
    }

    pub fn channels(&self) -> &LogChannels {
        self.dispatcher.channels()
    }

    pub fn config(&self) -> &ModLogConfig {
        &self.config
    }

    /// Get the provider name
    pub fn provider_name(&self) -> &str {
        self.dispatcher.provider_name()
    }

    /// Register one handler per lifecycle event kind
    pub async fn register(self: &Arc<Self>, bus: &EventBus) {
        for kind in EventKind::ALL {
            let service = Arc::clone(self);
            bus.on(kind, move |event| {
                let service = Arc::clone(&service);
                async move {
                    service.handle(event).await;
                }
            })
            .await;
        }
        tracing::info!(
            service = %self.config.service_name,
            provider = self.provider_name(),
            "Moderation log handlers registered"
        );
    }

    /// Run the pipeline for one event to its terminal state
    pub async fn handle(&self, event: LifecycleEvent) -> PipelineOutcome {
        let span = tracing::debug_span!(
            "modlog",
            run_id = %format!("run-{}", uuid::Uuid::new_v4()),
            kind = ?event.kind(),
            guild = %event.guild().id
        );

        async move {
            let outcome = match &event {
                LifecycleEvent::MemberJoined { member } => self.handle_member_joined(member).await,
                LifecycleEvent::MemberLeft { member } => self.handle_member_left(member).await,
                LifecycleEvent::BanAdded { guild, user } => self.handle_ban_added(guild, user).await,
                LifecycleEvent::BanRemoved { guild, user } => {
                    self.handle_ban_removed(guild, user).await
                }
            };
            tracing::debug!(?outcome, "Pipeline finished");
            outcome
        }
        .instrument(span)
        .await
    }

    pub async fn handle_member_joined(&self, member: &Member) -> PipelineOutcome {
        tracing::debug!("[ModLog:{}] User {} joined", member.guild.name, member.user.tag());

        let entry = render::member_joined(member, Utc::now());
        let result = self.dispatcher.deliver(&member.guild, entry).await;
        self.finish(Hook::GuildMemberAdd, &member.user, &member.guild, result)
            .await
    }

    /// Leaves of banned users are suppressed; the ban entry covers them
    pub async fn handle_member_left(&self, member: &Member) -> PipelineOutcome {
        tracing::debug!("[ModLog:{}] User {} left", member.guild.name, member.user.tag());

        let banned = match self.correlator.is_user_banned(&member.guild, member.id()).await {
            Ok(banned) => banned,
            Err(e) => {
                tracing::warn!(
                    guild = %member.guild.id,
                    user = %member.id(),
                    error = %e,
                    "Ban list unavailable, logging leave"
                );
                false
            }
        };

        if banned {
            tracing::debug!(guild = %member.guild.id, user = %member.id(), "Leave suppressed, user is banned");
            return PipelineOutcome::Suppressed;
        }

        let entry = render::member_left(member, Utc::now());
        let result = self.dispatcher.deliver(&member.guild, entry).await;
        self.finish(Hook::GuildMemberRemove, &member.user, &member.guild, result)
            .await
    }

    pub async fn handle_ban_added(&self, guild: &Guild, user: &User) -> PipelineOutcome {
        tracing::debug!("[ModLog:{}] User {} banned", guild.name, user.tag());

        let result = async {
            let log = self
                .correlator
                .correlate(guild, user, AuditAction::MemberBanAdd)
                .await?;
            let entry = render::banned(user, log.reason.as_deref(), log.moderator.as_ref(), Utc::now());
            self.dispatcher.deliver(guild, entry).await
        }
        .await;
        self.finish(Hook::GuildBanAdd, user, guild, result).await
    }

    pub async fn handle_ban_removed(&self, guild: &Guild, user: &User) -> PipelineOutcome {
        tracing::debug!("[ModLog:{}] User {} unbanned", guild.name, user.tag());

        let result = async {
            let log = self
                .correlator
                .correlate(guild, user, AuditAction::MemberBanRemove)
                .await?;
            let entry = render::unbanned(user, log.moderator.as_ref(), Utc::now());
            self.dispatcher.deliver(guild, entry).await
        }
        .await;
        self.finish(Hook::GuildBanRemove, user, guild, result).await
    }

    /// Log a warning issued by a moderator command
    pub async fn log_warn(
        &self,
        guild: &Guild,
        user: &User,
        reason: Option<&str>,
        moderator: Option<&User>,
    ) -> PipelineOutcome {
        tracing::debug!("[ModLog:{}] User {} warned", guild.name, user.tag());

        let entry = render::warned(user, reason, moderator, Utc::now());
        let result = self.dispatcher.deliver(guild, entry).await;
        self.finish(Hook::Warn, user, guild, result).await
    }

    async fn finish(
        &self,
        hook: Hook,
        subject: &User,
        guild: &Guild,
        result: Result<bool>,
    ) -> PipelineOutcome {
        match result {
            Ok(_) => PipelineOutcome::Delivered,
            Err(e) => {
                let fields = vec![
                    ReportField::new("Service", self.config.service_name.as_str()),
                    ReportField::new("Hook", hook.name()),
                    ReportField::new(hook.subject_label(), subject.to_string()),
                    ReportField::new("Guild", guild.to_string()),
                ];
                self.reporter.report(ErrorReport::new(&e, fields)).await;
                PipelineOutcome::Reported
            }
        }
    }
}
