use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{LinkId, Tag, UserId};

/// A saved link with its tag set.
///
/// Links are owned by exactly one user and carry an unordered set of tags
/// (a link cannot have the same tag twice). The tag vector is hydrated
/// sorted by name for stable display and comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Unique identifier from the database.
    pub id: LinkId,
    /// The owning user.
    pub user_id: UserId,
    /// The saved URL.
    pub url: String,
    /// Free-form description.
    pub description: String,
    /// When this link was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// The link's tags, sorted by name.
    pub tags: Vec<Tag>,
}

impl Link {
    /// Returns true when the link carries a tag with the given name.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name() == name)
    }
}

/// A link paired with its click count, for "most clicked" listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickedLink {
    /// The clicked link, tags hydrated.
    pub link: Link,
    /// Total recorded clicks.
    pub clicks: i64,
}
