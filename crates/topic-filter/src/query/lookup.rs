//! Keyword value tables.

use crate::types::{NotificationLevel, TopicStatus};

/// Parsed value of an `in:` keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicState<'a> {
    Pinned,
    Bookmarked,
    /// Comma separated notification level names, unvalidated.
    Levels(&'a str),
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

pub fn lookup_topic_state(value: &str) -> TopicState<'_> {
    match value {
        "pinned" => TopicState::Pinned,
        "bookmarked" => TopicState::Bookmarked,
        other => TopicState::Levels(other),
    }
}

pub fn lookup_notification_level(name: &str) -> Option<NotificationLevel> {
    match name {
        "muted" => Some(NotificationLevel::Muted),
        "regular" => Some(NotificationLevel::Regular),
        "tracking" => Some(NotificationLevel::Tracking),
        "watching" => Some(NotificationLevel::Watching),
        _ => None,
    }
}

pub fn lookup_topic_status(value: &str) -> Option<TopicStatus> {
    match value {
        "open" => Some(TopicStatus::Open),
        "closed" => Some(TopicStatus::Closed),
        "archived" => Some(TopicStatus::Archived),
        "listed" => Some(TopicStatus::Listed),
        "unlisted" => Some(TopicStatus::Unlisted),
        "public" => Some(TopicStatus::Public),
        "deleted" => Some(TopicStatus::Deleted),
        _ => None,
    }
}
