//! Core types for the moderation log pipeline
//!
//! All types use camelCase JSON serialization for wire compatibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map($name)
            }
        }
    };
}

snowflake!(
    /// Guild (group) identifier
    GuildId
);
snowflake!(
    /// User identifier
    UserId
);
snowflake!(
    /// Channel identifier
    ChannelId
);

/// A guild the bot moderates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guild {
    pub id: GuildId,
    pub name: String,
}

impl Guild {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: GuildId(id),
            name: name.into(),
        }
    }
}

/// Guilds display as their name
impl fmt::Display for Guild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A platform user, independent of any guild membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,

    pub username: String,

    /// Legacy four-digit discriminator; absent for migrated accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            username: username.into(),
            discriminator: None,
            avatar_url: None,
        }
    }

    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = Some(discriminator.into());
        self
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// `username#discriminator`, or the bare username
    pub fn tag(&self) -> String {
        match &self.discriminator {
            Some(d) => format!("{}#{}", self.username, d),
            None => self.username.clone(),
        }
    }
}

/// Users display as a mention
impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<@{}>", self.id)
    }
}

/// A user's membership in a specific guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub guild: Guild,
    pub user: User,

    /// Guild nickname, falling back to the username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl Member {
    pub fn new(guild: Guild, user: User) -> Self {
        Self {
            guild,
            user,
            nickname: None,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user.username)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.user, f)
    }
}

/// Lifecycle event kinds the pipeline subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    MemberJoined,
    MemberLeft,
    BanAdded,
    BanRemoved,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::MemberJoined,
        EventKind::MemberLeft,
        EventKind::BanAdded,
        EventKind::BanRemoved,
    ];
}

/// A membership or ban lifecycle event emitted by the transport
///
/// Ban events carry the guild separately: the banned user is often no
/// longer a member by the time the event arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum LifecycleEvent {
    MemberJoined { member: Member },
    MemberLeft { member: Member },
    BanAdded { guild: Guild, user: User },
    BanRemoved { guild: Guild, user: User },
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::MemberJoined { .. } => EventKind::MemberJoined,
            LifecycleEvent::MemberLeft { .. } => EventKind::MemberLeft,
            LifecycleEvent::BanAdded { .. } => EventKind::BanAdded,
            LifecycleEvent::BanRemoved { .. } => EventKind::BanRemoved,
        }
    }

    pub fn guild(&self) -> &Guild {
        match self {
            LifecycleEvent::MemberJoined { member } | LifecycleEvent::MemberLeft { member } => {
                &member.guild
            }
            LifecycleEvent::BanAdded { guild, .. } | LifecycleEvent::BanRemoved { guild, .. } => {
                guild
            }
        }
    }

    pub fn user(&self) -> &User {
        match self {
            LifecycleEvent::MemberJoined { member } | LifecycleEvent::MemberLeft { member } => {
                &member.user
            }
            LifecycleEvent::BanAdded { user, .. } | LifecycleEvent::BanRemoved { user, .. } => {
                user
            }
        }
    }
}

/// Administrative action types recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    MemberBanAdd,
    MemberBanRemove,
}

/// Query parameters for the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogFilter {
    pub action: AuditAction,
    pub limit: usize,
}

/// One entry of a guild's administrative audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub action: AuditAction,

    /// Affected user, absent when the target was not a user
    pub target_id: Option<UserId>,

    /// Moderator that performed the action, absent when unknown
    pub executor: Option<User>,

    pub reason: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(action: AuditAction, target_id: UserId, executor: User) -> Self {
        Self {
            action,
            target_id: Some(target_id),
            executor: Some(executor),
            reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Who performed a moderation action, and why
///
/// `moderator: None` renders as `unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    pub moderator: Option<User>,
    pub reason: Option<String>,
}

impl Correlation {
    /// Stand-in used when the audit trail could not be correlated
    pub fn placeholder(reason: impl Into<String>) -> Self {
        Self {
            moderator: None,
            reason: Some(reason.into()),
        }
    }
}

impl From<AuditRecord> for Correlation {
    fn from(record: AuditRecord) -> Self {
        Self {
            moderator: record.executor,
            reason: record.reason,
        }
    }
}

/// Log category: selects which configured channel receives an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    /// Membership churn: joins and leaves
    JoinLog,
    /// Moderation actions: warns, bans, unbans
    ModLog,
}

impl LogCategory {
    pub const ALL: [LogCategory; 2] = [LogCategory::JoinLog, LogCategory::ModLog];

    pub fn name(&self) -> &'static str {
        match self {
            LogCategory::JoinLog => "JoinLog",
            LogCategory::ModLog => "ModLog",
        }
    }

    /// Guild data key holding the destination channel id
    pub fn datakey(&self) -> &'static str {
        match self {
            LogCategory::JoinLog => "modTools.joinLogChannel",
            LogCategory::ModLog => "modTools.modLogChannel",
        }
    }

    /// Resolve a category by name, case-insensitively
    pub fn from_name(name: &str) -> crate::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| crate::ModLogError::UnknownLogType(name.to_string()))
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Color coding of a rendered entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorTag {
    Info,
    Neutral,
    Warn,
    Danger,
    Success,
}

impl ColorTag {
    /// RGB value used by the platform's embed renderer
    pub fn rgb(&self) -> u32 {
        match self {
            ColorTag::Info => 0x1ABC9C,
            ColorTag::Neutral => 0x95A5A6,
            ColorTag::Warn => 0xC27C0E,
            ColorTag::Danger => 0x992D22,
            ColorTag::Success => 0x1F8B4C,
        }
    }
}

/// A named field attached to a rendered entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryField {
    pub name: String,
    pub value: String,
}

/// A log entry ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedLogEntry {
    pub category: LogCategory,

    /// Title line, e.g. "spammer#0001 banned"
    pub title: String,

    /// Subject avatar shown next to the title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,

    pub color: ColorTag,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderator: Option<EntryField>,

    pub timestamp: DateTime<Utc>,
}

/// Terminal state of one pipeline invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Entry delivered, or silently skipped by the dispatcher
    Delivered,
    /// No entry produced (leave of a banned user)
    Suppressed,
    /// Failure handed to the error reporter
    Reported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_tag_and_display() {
        let user = User::new(123, "spammer").with_discriminator("0001");
        assert_eq!(user.tag(), "spammer#0001");
        assert_eq!(user.to_string(), "<@123>");

        let migrated = User::new(7, "newstyle");
        assert_eq!(migrated.tag(), "newstyle");
    }

    #[test]
    fn test_member_display_name_falls_back_to_username() {
        let guild = Guild::new(1, "G1");
        let member = Member::new(guild.clone(), User::new(5, "alice"));
        assert_eq!(member.display_name(), "alice");

        let member = member.with_nickname("Al");
        assert_eq!(member.display_name(), "Al");
        assert_eq!(member.id(), UserId(5));
        assert_eq!(member.to_string(), "<@5>");
    }

    #[test]
    fn test_guild_display_is_name() {
        assert_eq!(Guild::new(1, "Overwatch Mains").to_string(), "Overwatch Mains");
    }

    #[test]
    fn test_event_accessors() {
        let guild = Guild::new(1, "G1");
        let user = User::new(9, "bob");
        let event = LifecycleEvent::BanAdded {
            guild: guild.clone(),
            user: user.clone(),
        };
        assert_eq!(event.kind(), EventKind::BanAdded);
        assert_eq!(event.guild(), &guild);
        assert_eq!(event.user(), &user);

        let event = LifecycleEvent::MemberLeft {
            member: Member::new(guild.clone(), user.clone()),
        };
        assert_eq!(event.kind(), EventKind::MemberLeft);
        assert_eq!(event.guild().id, GuildId(1));
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = LifecycleEvent::BanRemoved {
            guild: Guild::new(1, "G1"),
            user: User::new(2, "u").with_avatar("https://cdn/a.png"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"banRemoved\""));
        assert!(json.contains("\"avatarUrl\":\"https://cdn/a.png\""));
        assert!(!json.contains("discriminator"));

        let parsed: LifecycleEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_snowflake_parse() {
        assert_eq!("42".parse::<ChannelId>().unwrap(), ChannelId(42));
        assert!("abc".parse::<ChannelId>().is_err());
        assert_eq!(serde_json::to_string(&UserId(5)).unwrap(), "5");
    }

    #[test]
    fn test_log_category_from_name() {
        assert_eq!(LogCategory::from_name("modlog").unwrap(), LogCategory::ModLog);
        assert_eq!(LogCategory::from_name("JoinLog").unwrap(), LogCategory::JoinLog);
        assert!(matches!(
            LogCategory::from_name("netModLog"),
            Err(crate::ModLogError::UnknownLogType(name)) if name == "netModLog"
        ));
    }

    #[test]
    fn test_log_category_datakeys_distinct() {
        assert_ne!(LogCategory::JoinLog.datakey(), LogCategory::ModLog.datakey());
    }

    #[test]
    fn test_color_tag_rgb_values() {
        assert_eq!(ColorTag::Info.rgb(), 0x1ABC9C);
        assert_eq!(ColorTag::Neutral.rgb(), 0x95A5A6);
        assert_eq!(ColorTag::Warn.rgb(), 0xC27C0E);
        assert_eq!(ColorTag::Danger.rgb(), 0x992D22);
        assert_eq!(ColorTag::Success.rgb(), 0x1F8B4C);
    }

    #[test]
    fn test_correlation_from_record() {
        let record = AuditRecord::new(AuditAction::MemberBanAdd, UserId(1), User::new(2, "mod"))
            .with_reason("spam");
        let correlation = Correlation::from(record);
        assert_eq!(correlation.moderator.unwrap().id, UserId(2));
        assert_eq!(correlation.reason.as_deref(), Some("spam"));

        let placeholder = Correlation::placeholder("ERROR: x");
        assert!(placeholder.moderator.is_none());
    }
}
