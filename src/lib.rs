pub mod db;
pub mod expression;
pub mod models;
pub mod service;

pub use db::Database;
pub use expression::TagExpression;
pub use models::{ClickedLink, Link, LinkId, Tag, TagId, TagSuggestion, UserId};
pub use service::{LinkService, SearchResults, StoreError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_accessible_from_crate_root() {
        let db = Database::in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn types_accessible_from_crate_root() {
        let tag = Tag::new(TagId::new(1), "test");
        assert_eq!(tag.name(), "test");

        let expr = TagExpression::parse("rust +async -old");
        assert_eq!(expr.encode(), "%2Basync -old rust");

        let service = LinkService::new(Database::in_memory().unwrap());
        let links = service
            .search_links(&UserId::new("nobody"), &expr, None)
            .unwrap();
        assert!(links.is_empty());
    }
}
