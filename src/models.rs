mod ids;
mod link;
mod tag;

pub use ids::{LinkId, TagId, UserId};
pub use link::{ClickedLink, Link};
pub use tag::{Tag, TagSuggestion};
