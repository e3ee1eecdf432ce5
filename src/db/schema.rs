/// Complete database schema for the link store.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// All statements are designed to be run in a single batch.
pub const INITIAL_SCHEMA: &str = r#"
-- Links table: one row per saved URL, owned by exactly one user
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    url TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at INTEGER NOT NULL
);

-- Tags table: names are stored lowercase and are unique per user
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL COLLATE NOCASE,
    UNIQUE (user_id, name)
);

-- Junction table: links to tags (many-to-many, set semantics)
CREATE TABLE IF NOT EXISTS link_tags (
    link_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (link_id, tag_id),
    FOREIGN KEY (link_id) REFERENCES links(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

-- Click counters: one row per link, created lazily on first click
CREATE TABLE IF NOT EXISTS link_clicks (
    link_id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    clicks INTEGER NOT NULL DEFAULT 0 CHECK (clicks >= 0),
    FOREIGN KEY (link_id) REFERENCES links(id) ON DELETE CASCADE
);

-- Index for scoping and sorting a user's links by creation date
CREATE INDEX IF NOT EXISTS idx_links_user_created ON links(user_id, created_at);

-- Index for scoping tag lookups by user
CREATE INDEX IF NOT EXISTS idx_tags_user ON tags(user_id);

-- Indexes for efficient junction table lookups
CREATE INDEX IF NOT EXISTS idx_link_tags_link ON link_tags(link_id);
CREATE INDEX IF NOT EXISTS idx_link_tags_tag ON link_tags(tag_id);

-- Index for "most clicked" listings
CREATE INDEX IF NOT EXISTS idx_link_clicks_user ON link_clicks(user_id);
"#;
