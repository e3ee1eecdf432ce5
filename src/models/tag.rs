use serde::{Deserialize, Serialize};

use super::TagId;

/// A user-owned tag.
///
/// Tag names are unique per user and always stored lowercase. Tags are
/// created implicitly the first time a link references a new name; they
/// carry no state of their own beyond the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    id: TagId,
    name: String,
}

impl Tag {
    /// Creates a new tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkstash::{Tag, TagId};
    ///
    /// let tag = Tag::new(TagId::new(1), "rust");
    /// assert_eq!(tag.id(), TagId::new(1));
    /// assert_eq!(tag.name(), "rust");
    /// ```
    pub fn new(id: TagId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Returns the tag's unique identifier.
    pub fn id(&self) -> TagId {
        self.id
    }

    /// Returns the tag's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A suggested tag with its usage count.
///
/// Produced by tag discovery: either a tag that co-occurs with the current
/// selection, or one of the user's overall most-used tags. `uses` is the
/// number of links the suggestion was counted over, which differs by tier
/// (co-occurring links for tier one, total links for the fallback tier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSuggestion {
    /// The suggested tag's identifier.
    pub id: TagId,
    /// The suggested tag's name.
    pub name: String,
    /// Number of links backing the suggestion.
    pub uses: i64,
}
