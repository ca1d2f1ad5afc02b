//! # guild-modlog
//!
//! Moderation and membership event logging for community bots.
//!
//! ## Overview
//!
//! `guild-modlog` listens for member join/leave and ban/unban events,
//! recovers the responsible moderator and reason from the guild's audit
//! trail, renders a log entry and posts it to the channel configured for
//! the guild. The chat platform itself sits behind the `GuildProvider`
//! trait.
//!
//! ## Quick Start
//!
//! ```rust
//! use guild_modlog::{
//!     EventBus, Guild, LogCategory, MemoryConfigStore, MemoryGuildProvider, ModLogConfig,
//!     ModLogService, TracingErrorReporter, ChannelId, User,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> guild_modlog::Result<()> {
//! let provider = Arc::new(MemoryGuildProvider::new());
//! let guild = Guild::new(1, "Overwatch Mains");
//! provider.add_guild(&guild).await;
//! provider.add_channel(guild.id, ChannelId(42)).await;
//!
//! let service = Arc::new(ModLogService::new(
//!     provider.clone(),
//!     Arc::new(MemoryConfigStore::new()),
//!     Arc::new(TracingErrorReporter),
//!     ModLogConfig::default(),
//! ));
//! service.channels().enable(guild.id, LogCategory::ModLog, ChannelId(42)).await?;
//!
//! // Wire the four lifecycle handlers and feed transport events to the bus
//! let bus = EventBus::new();
//! service.register(&bus).await;
//! let subscription = provider.subscribe().await;
//! tokio::spawn(async move { bus.run(subscription).await });
//!
//! // Warnings come from the moderator command, not the event bus
//! service
//!     .log_warn(&guild, &User::new(7, "spammer"), Some("caps"), None)
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **EventBus**: routes lifecycle events to handlers, one task per event
//! - **AuditCorrelator**: matches ban events to audit entries with bounded retry
//! - **render**: pure constructors for each log entry kind
//! - **LogDispatcher**: resolves the destination channel and classifies delivery failures
//! - **ModLogService**: the per-event pipeline and its error boundary

pub mod bus;
pub mod config;
pub mod correlator;
pub mod dispatch;
pub mod error;
pub mod provider;
pub mod render;
pub mod report;
pub mod retry;
pub mod service;
pub mod state;
pub mod types;

// Re-export core types
pub use bus::{EventBus, Handler};
pub use config::ModLogConfig;
pub use correlator::{AuditCorrelator, NO_MATCHING_ENTRY};
pub use dispatch::{DeliveryFailure, LogDispatcher};
pub use error::{ApiError, ModLogError, Result};
pub use provider::{GuildProvider, Subscription};
pub use report::{ErrorReport, ErrorReporter, MemoryErrorReporter, ReportField, TracingErrorReporter};
pub use retry::RetryPolicy;
pub use service::{Hook, ModLogService};
pub use state::{ConfigStore, FileConfigStore, LogChannels, MemoryConfigStore};
pub use types::{
    AuditAction, AuditLogFilter, AuditRecord, ChannelId, ColorTag, Correlation, EntryField,
    EventKind, Guild, GuildId, LifecycleEvent, LogCategory, Member, PipelineOutcome,
    RenderedLogEntry, User, UserId,
};

// Re-export the in-memory provider for convenience
pub use provider::memory::{DeliveredEntry, MemoryGuildProvider, MemorySubscription};
