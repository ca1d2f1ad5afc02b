//! Log entry rendering
//!
//! Pure constructors, one per outcome. The timestamp is passed in so the
//! same inputs always render the same entry.

use crate::types::{ColorTag, EntryField, LogCategory, Member, RenderedLogEntry, User};
use chrono::{DateTime, Utc};

const MODERATOR_FIELD: &str = "Moderator:";

pub fn member_joined(member: &Member, timestamp: DateTime<Utc>) -> RenderedLogEntry {
    RenderedLogEntry {
        category: LogCategory::JoinLog,
        title: format!("{} joined", member.display_name()),
        icon_url: member.user.avatar_url.clone(),
        color: ColorTag::Info,
        description: user_id_line(&member.user),
        moderator: None,
        timestamp,
    }
}

pub fn member_left(member: &Member, timestamp: DateTime<Utc>) -> RenderedLogEntry {
    RenderedLogEntry {
        category: LogCategory::JoinLog,
        title: format!("{} left", member.display_name()),
        icon_url: member.user.avatar_url.clone(),
        color: ColorTag::Neutral,
        description: user_id_line(&member.user),
        moderator: None,
        timestamp,
    }
}

pub fn warned(
    user: &User,
    reason: Option<&str>,
    moderator: Option<&User>,
    timestamp: DateTime<Utc>,
) -> RenderedLogEntry {
    moderation_entry(user, "warned", ColorTag::Warn, Some(reason), moderator, timestamp)
}

pub fn banned(
    user: &User,
    reason: Option<&str>,
    moderator: Option<&User>,
    timestamp: DateTime<Utc>,
) -> RenderedLogEntry {
    moderation_entry(user, "banned", ColorTag::Danger, Some(reason), moderator, timestamp)
}

/// Unban entries carry no reason line
pub fn unbanned(user: &User, moderator: Option<&User>, timestamp: DateTime<Utc>) -> RenderedLogEntry {
    moderation_entry(user, "unbanned", ColorTag::Success, None, moderator, timestamp)
}

fn moderation_entry(
    user: &User,
    verb: &str,
    color: ColorTag,
    reason: Option<Option<&str>>,
    moderator: Option<&User>,
    timestamp: DateTime<Utc>,
) -> RenderedLogEntry {
    let mut description = user_id_line(user);
    if let Some(reason) = reason {
        description.push_str("\nReason: ");
        description.push_str(reason.filter(|r| !r.is_empty()).unwrap_or("`None`"));
    }

    RenderedLogEntry {
        category: LogCategory::ModLog,
        title: format!("{} {}", user.tag(), verb),
        icon_url: user.avatar_url.clone(),
        color,
        description,
        moderator: Some(moderator_field(moderator)),
        timestamp,
    }
}

fn user_id_line(user: &User) -> String {
    format!("User ID: {}", user.id)
}

fn moderator_field(moderator: Option<&User>) -> EntryField {
    let value = match moderator {
        Some(m) => format!("{}\nID: {}", m.tag(), m.id),
        None => "`unknown`".to_string(),
    };
    EntryField {
        name: MODERATOR_FIELD.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Guild;

    fn now() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    fn member() -> Member {
        Member::new(
            Guild::new(1, "G1"),
            User::new(5, "alice").with_avatar("https://cdn/alice.png"),
        )
        .with_nickname("Al")
    }

    fn spammer() -> User {
        User::new(123, "spammer").with_discriminator("0001")
    }

    fn moderator() -> User {
        User::new(900, "M1")
    }

    #[test]
    fn test_member_joined() {
        let entry = member_joined(&member(), now());
        assert_eq!(entry.category, LogCategory::JoinLog);
        assert_eq!(entry.title, "Al joined");
        assert_eq!(entry.color, ColorTag::Info);
        assert_eq!(entry.description, "User ID: 5");
        assert_eq!(entry.icon_url.as_deref(), Some("https://cdn/alice.png"));
        assert!(entry.moderator.is_none());
        assert_eq!(entry.timestamp, now());
    }

    #[test]
    fn test_member_left() {
        let entry = member_left(&member(), now());
        assert_eq!(entry.category, LogCategory::JoinLog);
        assert_eq!(entry.title, "Al left");
        assert_eq!(entry.color, ColorTag::Neutral);
        assert_eq!(entry.description, "User ID: 5");
    }

    #[test]
    fn test_banned_with_reason_and_moderator() {
        let entry = banned(&spammer(), Some("spam"), Some(&moderator()), now());
        assert_eq!(entry.category, LogCategory::ModLog);
        assert_eq!(entry.title, "spammer#0001 banned");
        assert_eq!(entry.color, ColorTag::Danger);
        assert_eq!(entry.description, "User ID: 123\nReason: spam");

        let field = entry.moderator.unwrap();
        assert_eq!(field.name, "Moderator:");
        assert_eq!(field.value, "M1\nID: 900");
    }

    #[test]
    fn test_banned_without_reason_or_moderator() {
        let entry = banned(&spammer(), None, None, now());
        assert_eq!(entry.description, "User ID: 123\nReason: `None`");
        assert_eq!(entry.moderator.unwrap().value, "`unknown`");
    }

    #[test]
    fn test_empty_reason_renders_as_none() {
        let entry = banned(&spammer(), Some(""), Some(&moderator()), now());
        assert_eq!(entry.description, "User ID: 123\nReason: `None`");

        let entry = warned(&spammer(), Some(""), None, now());
        assert_eq!(entry.description, "User ID: 123\nReason: `None`");
    }

    #[test]
    fn test_warned() {
        let entry = warned(&spammer(), Some("caps"), Some(&moderator()), now());
        assert_eq!(entry.category, LogCategory::ModLog);
        assert_eq!(entry.title, "spammer#0001 warned");
        assert_eq!(entry.color, ColorTag::Warn);
        assert_eq!(entry.description, "User ID: 123\nReason: caps");
    }

    #[test]
    fn test_unbanned_has_no_reason_line() {
        let entry = unbanned(&spammer(), None, now());
        assert_eq!(entry.title, "spammer#0001 unbanned");
        assert_eq!(entry.color, ColorTag::Success);
        assert_eq!(entry.description, "User ID: 123");
        assert_eq!(entry.moderator.unwrap().value, "`unknown`");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        assert_eq!(
            banned(&spammer(), Some("spam"), None, now()),
            banned(&spammer(), Some("spam"), None, now())
        );
    }
}
