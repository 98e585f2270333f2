//! Identifier and enumeration types shared by the filter compiler.
//!
//! Identifiers are thin newtypes over the storage layer's integer keys so
//! that tag, category, and actor ids cannot be mixed up at call sites.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Primary key of a tag. Alias tags point at a target tag.
    TagId
);
id_newtype!(
    /// Primary key of a category.
    CategoryId
);
id_newtype!(
    /// Identity of the authenticated actor compiling a query.
    ActorId
);

/// Per-actor notification level on a topic membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Muted,
    Regular,
    Tracking,
    Watching,
}

impl NotificationLevel {
    /// Integer stored in `topic_users.notification_level`.
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Muted => 0,
            Self::Regular => 1,
            Self::Tracking => 2,
            Self::Watching => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Muted => "muted",
            Self::Regular => "regular",
            Self::Tracking => "tracking",
            Self::Watching => "watching",
        }
    }
}

/// Values accepted by the `status:` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    Open,
    Closed,
    Archived,
    Listed,
    Unlisted,
    Public,
    Deleted,
}

impl TopicStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Archived => "archived",
            Self::Listed => "listed",
            Self::Unlisted => "unlisted",
            Self::Public => "public",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
