use std::collections::HashSet;

use anyhow::Result;
use rusqlite::OptionalExtension;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    Database, TagExpression,
    models::{ClickedLink, Link, LinkId, Tag, TagId, TagSuggestion, UserId},
};

/// Default and floor for link search results.
///
/// Requests for a smaller limit are not honored: the ranking step needs the
/// full candidate window to stay stable, so the effective limit is always
/// at least this many.
pub const LINK_QUERY_RESULTS_LIMIT: usize = 50;

/// Default and ceiling for tag suggestions.
pub const TAGS_QUERY_RESULTS_LIMIT: usize = 25;

/// Default for "most clicked" listings.
pub const COMMON_LINKS_QUERY_RESULTS_LIMIT: usize = 5;

/// Typed failures for the store operations that callers need to tell apart.
///
/// Everything else surfaces as a plain `anyhow::Error`; these variants are
/// recoverable by downcast when a caller wants to map them to a specific
/// response (a rename conflict, a tag still in use, a click on a foreign
/// link).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No tag with this name exists for the user.
    #[error("tag '{0}' not found")]
    TagNotFound(String),
    /// Renaming to a name already used by another of the user's tags.
    #[error("tag '{0}' already exists")]
    TagNameTaken(String),
    /// Renaming a tag to its current name.
    #[error("tag name not changed")]
    TagNameUnchanged,
    /// Deleting a tag that links still reference.
    #[error("{links} links still using tag '{name}'")]
    TagInUse { name: String, links: i64 },
    /// The link does not exist or belongs to another user.
    #[error("link {0} not found")]
    LinkNotFound(LinkId),
}

/// The combined result of a search request: ranked links plus the tag
/// suggestions used to refine the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// Links ranked by relevance.
    pub links: Vec<Link>,
    /// Suggested tag names, minus anything already in the expression.
    pub common_tags: Vec<String>,
}

/// Service layer providing link and tag operations for the search core.
///
/// `LinkService` owns a `Database` instance and exposes the tag-expression
/// search engine, related/common tag discovery, the click counter, and the
/// tag store operations they depend on. Every operation is scoped by the
/// caller-supplied `UserId`; the service performs no authentication of its
/// own and never caches results across calls.
///
/// # Examples
///
/// ```
/// use linkstash::{Database, LinkService};
///
/// # fn main() -> anyhow::Result<()> {
/// let db = Database::in_memory()?;
/// let service = LinkService::new(db);
/// # Ok(())
/// # }
/// ```
pub struct LinkService {
    db: Database,
}

impl LinkService {
    /// Creates a new LinkService with the given database.
    ///
    /// Takes ownership of the database instance. The service becomes the
    /// sole owner and manages all database operations through its methods.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns a reference to the underlying database.
    ///
    /// Useful for testing or advanced operations that need direct database access.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Creates a new link with the given tags.
    ///
    /// Inserts the link and its tag associations in one transaction. Tags
    /// that do not exist yet for this user are created implicitly; the tag
    /// list is normalized (trimmed, lowercased) and deduplicated first.
    /// Returns the fully populated `Link` with its assigned id and its tag
    /// set sorted by name.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkstash::{Database, LinkService, UserId};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let db = Database::in_memory()?;
    /// let service = LinkService::new(db);
    /// let alice = UserId::new("alice");
    ///
    /// let link = service.create_link(&alice, "https://example.com", "Example", &["Rust", "rust", "work"])?;
    /// assert!(link.id.get() > 0);
    /// assert_eq!(link.tags.len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_link(
        &self,
        user: &UserId,
        url: &str,
        description: &str,
        tags: &[&str],
    ) -> Result<Link> {
        let conn = self.db.connection();
        let now = OffsetDateTime::now_utc().unix_timestamp();

        // Use a transaction for atomicity
        conn.execute("BEGIN TRANSACTION", [])?;

        let result: Result<Link> = (|| {
            conn.execute(
                "INSERT INTO links (user_id, url, description, created_at) VALUES (?1, ?2, ?3, ?4)",
                (user.as_str(), url, description, now),
            )?;

            let link_id = conn.last_insert_rowid();

            // Normalize and deduplicate before touching the tag store
            let mut seen = HashSet::new();
            let mut link_tags = Vec::new();
            for raw_name in tags {
                let name = normalize_tag_name(raw_name);
                if name.is_empty() || !seen.insert(name.clone()) {
                    continue;
                }

                let tag_id = self.get_or_create_tag(user, &name)?;
                conn.execute(
                    "INSERT OR IGNORE INTO link_tags (link_id, tag_id) VALUES (?1, ?2)",
                    (link_id, tag_id.get()),
                )?;
                link_tags.push(Tag::new(tag_id, name));
            }
            link_tags.sort_by(|a, b| a.name().cmp(b.name()));

            Ok(Link {
                id: LinkId::new(link_id),
                user_id: user.clone(),
                url: url.to_string(),
                description: description.to_string(),
                created_at: OffsetDateTime::from_unix_timestamp(now)?,
                tags: link_tags,
            })
        })();

        match result {
            Ok(link) => {
                conn.execute("COMMIT", [])?;
                Ok(link)
            }
            Err(e) => {
                conn.execute("ROLLBACK", []).ok();
                Err(e)
            }
        }
    }

    /// Retrieves a link by its ID, scoped to the owning user.
    ///
    /// Returns `None` if no such link exists or it belongs to a different
    /// user. Neither case is an error; the core does not leak existence
    /// information across users.
    pub fn get_link(&self, user: &UserId, id: LinkId) -> Result<Option<Link>> {
        let conn = self.db.connection();

        let row = conn
            .query_row(
                "SELECT id, url, description, created_at FROM links WHERE id = ?1 AND user_id = ?2",
                (id.get(), user.as_str()),
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((link_id, url, description, created_at)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT t.id, t.name
             FROM tags t
             JOIN link_tags lt ON lt.tag_id = t.id
             WHERE lt.link_id = ?1
             ORDER BY t.name ASC",
        )?;
        let tags = stmt
            .query_map([link_id], |row| {
                Ok(Tag::new(TagId::new(row.get(0)?), row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(Link {
            id: LinkId::new(link_id),
            user_id: user.clone(),
            url,
            description,
            created_at: OffsetDateTime::from_unix_timestamp(created_at)?,
            tags,
        }))
    }

    /// Deletes a link by its ID, scoped to the owning user.
    ///
    /// Idempotent: deleting a non-existent or foreign link is a no-op.
    /// Foreign key cascades remove the tag associations and click counter.
    pub fn delete_link(&self, user: &UserId, id: LinkId) -> Result<()> {
        let conn = self.db.connection();
        conn.execute(
            "DELETE FROM links WHERE id = ?1 AND user_id = ?2",
            (id.get(), user.as_str()),
        )?;
        Ok(())
    }

    /// Gets or creates a tag by name, scoped to the user.
    ///
    /// This is the explicit find-or-create at the storage boundary: the
    /// name is normalized to lowercase, looked up case-insensitively, and
    /// inserted only when missing. Saving a link with a new tag name goes
    /// through here, which is how tags come into existence.
    pub fn get_or_create_tag(&self, user: &UserId, name: &str) -> Result<TagId> {
        let normalized = normalize_tag_name(name);
        if normalized.is_empty() {
            anyhow::bail!("tag name cannot be empty");
        }

        let conn = self.db.connection();
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM tags WHERE user_id = ?1 AND name = ?2",
                (user.as_str(), &normalized),
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(TagId::new(id));
        }

        conn.execute(
            "INSERT INTO tags (user_id, name) VALUES (?1, ?2)",
            (user.as_str(), &normalized),
        )?;
        Ok(TagId::new(conn.last_insert_rowid()))
    }

    /// Renames a tag, carrying all link associations over atomically.
    ///
    /// Pre-validates before committing: the old tag must exist
    /// (`StoreError::TagNotFound`), the new name must differ
    /// (`StoreError::TagNameUnchanged`), and no other tag of the user may
    /// already hold it (`StoreError::TagNameTaken`). Associations reference
    /// the tag by id, so a single validated UPDATE renames everywhere;
    /// searches issued after this call see only the new name.
    pub fn rename_tag(&self, user: &UserId, old: &str, new: &str) -> Result<Tag> {
        let old_name = normalize_tag_name(old);
        let new_name = normalize_tag_name(new);
        if new_name.is_empty() {
            anyhow::bail!("tag name cannot be empty");
        }

        let conn = self.db.connection();
        conn.execute("BEGIN TRANSACTION", [])?;

        let result: Result<Tag> = (|| {
            let tag_id: Option<i64> = conn
                .query_row(
                    "SELECT id FROM tags WHERE user_id = ?1 AND name = ?2",
                    (user.as_str(), &old_name),
                    |row| row.get(0),
                )
                .optional()?;
            let Some(tag_id) = tag_id else {
                return Err(StoreError::TagNotFound(old_name.clone()).into());
            };

            if new_name == old_name {
                return Err(StoreError::TagNameUnchanged.into());
            }

            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM tags WHERE user_id = ?1 AND name = ?2)",
                (user.as_str(), &new_name),
                |row| row.get(0),
            )?;
            if taken {
                return Err(StoreError::TagNameTaken(new_name.clone()).into());
            }

            conn.execute(
                "UPDATE tags SET name = ?1 WHERE id = ?2",
                (&new_name, tag_id),
            )?;

            Ok(Tag::new(TagId::new(tag_id), new_name.clone()))
        })();

        match result {
            Ok(tag) => {
                conn.execute("COMMIT", [])?;
                Ok(tag)
            }
            Err(e) => {
                conn.execute("ROLLBACK", []).ok();
                Err(e)
            }
        }
    }

    /// Deletes a tag, refusing while links still reference it.
    ///
    /// Returns `StoreError::TagInUse` with the live link count when the tag
    /// is still attached to anything, and `StoreError::TagNotFound` when
    /// the user has no tag with this name.
    pub fn delete_tag(&self, user: &UserId, name: &str) -> Result<()> {
        let normalized = normalize_tag_name(name);
        let conn = self.db.connection();

        let tag_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM tags WHERE user_id = ?1 AND name = ?2",
                (user.as_str(), &normalized),
                |row| row.get(0),
            )
            .optional()?;
        let Some(tag_id) = tag_id else {
            return Err(StoreError::TagNotFound(normalized).into());
        };

        let links: i64 = conn.query_row(
            "SELECT COUNT(*) FROM link_tags WHERE tag_id = ?1",
            [tag_id],
            |row| row.get(0),
        )?;
        if links > 0 {
            return Err(StoreError::TagInUse {
                name: normalized,
                links,
            }
            .into());
        }

        conn.execute("DELETE FROM tags WHERE id = ?1", [tag_id])?;
        Ok(())
    }

    /// Returns the user's links carrying the given tag, newest first.
    pub fn links_for_tag(&self, user: &UserId, name: &str) -> Result<Vec<Link>> {
        let normalized = normalize_tag_name(name);
        let conn = self.db.connection();

        let mut stmt = conn.prepare(
            "SELECT l.id
             FROM links l
             JOIN link_tags lt ON lt.link_id = l.id
             JOIN tags t ON t.id = lt.tag_id
             WHERE l.user_id = ?1 AND t.name = ?2
             ORDER BY l.created_at DESC, l.id ASC",
        )?;
        let ids = stmt
            .query_map((user.as_str(), &normalized), |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        self.hydrate_links(user, &ids)
    }

    /// Searches the user's links against a tag expression.
    ///
    /// Filtering: links must carry every `require` tag, none of the
    /// `exclude` tags, and (when the effective include pool
    /// `include ∪ require` is non-empty) at least one pool tag. Ranking:
    /// number of pool tags carried descending, then creation time
    /// descending, then link id ascending, so identical queries against
    /// unchanged data always return identical order. An empty pool falls
    /// back to pure recency.
    ///
    /// The effective limit is `max(limit, 50)`; smaller requests are not
    /// honored because the ranking window must stay stable.
    ///
    /// An unknown user simply has no links: the result is empty, never an
    /// error.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkstash::{Database, LinkService, TagExpression, UserId};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let db = Database::in_memory()?;
    /// let service = LinkService::new(db);
    /// let alice = UserId::new("alice");
    ///
    /// service.create_link(&alice, "https://a", "", &["work", "urgent"])?;
    /// service.create_link(&alice, "https://b", "", &["personal"])?;
    ///
    /// let expr = TagExpression::parse("work");
    /// let links = service.search_links(&alice, &expr, None)?;
    /// assert_eq!(links.len(), 1);
    /// assert_eq!(links[0].url, "https://a");
    /// # Ok(())
    /// # }
    /// ```
    pub fn search_links(
        &self,
        user: &UserId,
        expr: &TagExpression,
        limit: Option<usize>,
    ) -> Result<Vec<Link>> {
        let limit = limit
            .unwrap_or(LINK_QUERY_RESULTS_LIMIT)
            .max(LINK_QUERY_RESULTS_LIMIT);

        let ids = self.search_link_ids(user, expr, limit)?;
        self.hydrate_links(user, &ids)
    }

    /// Runs the ranked id query for `search_links`.
    ///
    /// Kept separate so the hydration step can preserve rank order by
    /// loading links one id at a time.
    fn search_link_ids(
        &self,
        user: &UserId,
        expr: &TagExpression,
        limit: usize,
    ) -> Result<Vec<i64>> {
        let conn = self.db.connection();

        let pool: Vec<String> = expr.positive_pool().into_iter().collect();
        let require: Vec<String> = expr.require().iter().cloned().collect();
        let exclude: Vec<String> = expr.exclude().iter().cloned().collect();
        let require_len = require.len() as i64;
        let limit = limit as i64;
        let user = user.as_str();

        let mut params: Vec<&dyn rusqlite::ToSql> = vec![&user];

        let exclude_clause = if exclude.is_empty() {
            String::new()
        } else {
            format!(
                " AND NOT EXISTS (
                    SELECT 1 FROM link_tags ltx
                    JOIN tags tx ON tx.id = ltx.tag_id
                    WHERE ltx.link_id = l.id AND tx.name IN ({}))",
                placeholders(exclude.len())
            )
        };

        let sql = if pool.is_empty() {
            // No positive filter: browse by recency, exclusions still apply.
            format!(
                "SELECT l.id FROM links l
                 WHERE l.user_id = ?{exclude_clause}
                 ORDER BY l.created_at DESC, l.id ASC
                 LIMIT ?"
            )
        } else {
            let require_clause = if require.is_empty() {
                String::new()
            } else {
                format!(
                    " HAVING (SELECT COUNT(*) FROM link_tags ltr
                              JOIN tags tr ON tr.id = ltr.tag_id
                              WHERE ltr.link_id = l.id AND tr.name IN ({})) = ?",
                    placeholders(require.len())
                )
            };

            format!(
                "SELECT l.id
                 FROM links l
                 JOIN link_tags lt ON lt.link_id = l.id
                 JOIN tags t ON t.id = lt.tag_id
                 WHERE l.user_id = ? AND t.name IN ({}){exclude_clause}
                 GROUP BY l.id{require_clause}
                 ORDER BY COUNT(DISTINCT t.id) DESC, l.created_at DESC, l.id ASC
                 LIMIT ?",
                placeholders(pool.len())
            )
        };

        // Parameter order mirrors clause order in the SQL above
        for name in &pool {
            params.push(name);
        }
        for name in &exclude {
            params.push(name);
        }
        if !require.is_empty() {
            for name in &require {
                params.push(name);
            }
            params.push(&require_len);
        }
        params.push(&limit);

        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(rusqlite::params_from_iter(params), |row| {
                row.get::<_, i64>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    /// Suggests tags to refine or broaden a search.
    ///
    /// Two tiers. When the expression has positive tags, tags co-occurring
    /// with them on the user's links come first, ranked by the number of
    /// links they share with the selection (descending, ties by name).
    /// Whatever room remains is filled with the user's overall most-used
    /// tags (link count descending, ties by name). Tags already present
    /// anywhere in the expression are never suggested. With nothing
    /// selected the result is purely the most-used tier, which is the
    /// "common tags" view shown before any search.
    ///
    /// The effective limit is `min(limit, 25)`.
    pub fn suggest_tags(
        &self,
        user: &UserId,
        expr: &TagExpression,
        limit: Option<usize>,
    ) -> Result<Vec<TagSuggestion>> {
        let limit = limit
            .unwrap_or(TAGS_QUERY_RESULTS_LIMIT)
            .min(TAGS_QUERY_RESULTS_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.db.connection();
        let pool: Vec<String> = expr.positive_pool().into_iter().collect();
        let selected: Vec<String> = expr.selected().into_iter().collect();
        let limit_param = limit as i64;
        let user = user.as_str();

        let mut suggestions: Vec<TagSuggestion> = Vec::new();

        if !pool.is_empty() {
            // Tier one: co-occurrence with the selected positive tags
            let selected_clause = if selected.is_empty() {
                String::new()
            } else {
                format!(" AND t.name NOT IN ({})", placeholders(selected.len()))
            };
            let sql = format!(
                "SELECT t.id, t.name, COUNT(DISTINCT lt.link_id) AS uses
                 FROM tags t
                 JOIN link_tags lt ON lt.tag_id = t.id
                 WHERE t.user_id = ?{selected_clause}
                   AND lt.link_id IN (
                       SELECT lts.link_id FROM link_tags lts
                       JOIN tags ts ON ts.id = lts.tag_id
                       WHERE ts.user_id = ? AND ts.name IN ({}))
                 GROUP BY t.id
                 ORDER BY uses DESC, t.name ASC
                 LIMIT ?",
                placeholders(pool.len())
            );

            let mut params: Vec<&dyn rusqlite::ToSql> = vec![&user];
            for name in &selected {
                params.push(name);
            }
            params.push(&user);
            for name in &pool {
                params.push(name);
            }
            params.push(&limit_param);

            let mut stmt = conn.prepare(&sql)?;
            suggestions = stmt
                .query_map(rusqlite::params_from_iter(params), |row| {
                    Ok(TagSuggestion {
                        id: TagId::new(row.get(0)?),
                        name: row.get(1)?,
                        uses: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
        }

        if suggestions.len() < limit {
            // Fallback tier: overall most-used tags fill the remainder
            let mut skip: Vec<String> = selected.clone();
            skip.extend(suggestions.iter().map(|s| s.name.clone()));

            let skip_clause = if skip.is_empty() {
                String::new()
            } else {
                format!(" AND t.name NOT IN ({})", placeholders(skip.len()))
            };
            let sql = format!(
                "SELECT t.id, t.name, COUNT(lt.link_id) AS uses
                 FROM tags t
                 LEFT JOIN link_tags lt ON lt.tag_id = t.id
                 WHERE t.user_id = ?{skip_clause}
                 GROUP BY t.id
                 ORDER BY uses DESC, t.name ASC
                 LIMIT ?"
            );

            let remaining = (limit - suggestions.len()) as i64;
            let mut params: Vec<&dyn rusqlite::ToSql> = vec![&user];
            for name in &skip {
                params.push(name);
            }
            params.push(&remaining);

            let mut stmt = conn.prepare(&sql)?;
            let fallback = stmt
                .query_map(rusqlite::params_from_iter(params), |row| {
                    Ok(TagSuggestion {
                        id: TagId::new(row.get(0)?),
                        name: row.get(1)?,
                        uses: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            suggestions.extend(fallback);
        }

        Ok(suggestions)
    }

    /// Parses a raw `tags` query string and runs search plus discovery.
    ///
    /// This is the composite operation behind the search endpoint: the
    /// caller hands in the raw string from the URL or search box, and gets
    /// back ranked links together with suggestion names for refining the
    /// query. Suggestion names never repeat tags already in the expression.
    pub fn search(
        &self,
        user: &UserId,
        raw_query: &str,
        limit: Option<usize>,
    ) -> Result<SearchResults> {
        let expr = TagExpression::parse(raw_query);

        let links = self.search_links(user, &expr, limit)?;
        let common_tags = self
            .suggest_tags(user, &expr, None)?
            .into_iter()
            .map(|suggestion| suggestion.name)
            .collect();

        Ok(SearchResults { links, common_tags })
    }

    /// Records one click on a link.
    ///
    /// Verifies the link exists and belongs to the user
    /// (`StoreError::LinkNotFound` otherwise), then bumps the counter with
    /// a single atomic upsert: the row is created at 1 on first click and
    /// incremented in place thereafter. Never read-then-write, so racing
    /// increments from concurrent connections cannot lose updates. Each
    /// call is deliberately a new click event; this is telemetry, not a
    /// ledger. Returns the new count.
    pub fn record_click(&self, user: &UserId, id: LinkId) -> Result<i64> {
        let conn = self.db.connection();

        let owned: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM links WHERE id = ?1 AND user_id = ?2)",
            (id.get(), user.as_str()),
            |row| row.get(0),
        )?;
        if !owned {
            return Err(StoreError::LinkNotFound(id).into());
        }

        let clicks = conn.query_row(
            "INSERT INTO link_clicks (link_id, user_id, clicks) VALUES (?1, ?2, 1)
             ON CONFLICT(link_id) DO UPDATE SET clicks = clicks + 1
             RETURNING clicks",
            (id.get(), user.as_str()),
            |row| row.get(0),
        )?;

        Ok(clicks)
    }

    /// Returns the user's most clicked links, counters attached.
    ///
    /// Ordered by click count descending, ties by link id ascending. Links
    /// that were never clicked have no counter row and do not appear.
    pub fn most_clicked_links(
        &self,
        user: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<ClickedLink>> {
        let limit = limit.unwrap_or(COMMON_LINKS_QUERY_RESULTS_LIMIT) as i64;
        let conn = self.db.connection();

        let mut stmt = conn.prepare(
            "SELECT lc.link_id, lc.clicks
             FROM link_clicks lc
             JOIN links l ON l.id = lc.link_id
             WHERE lc.user_id = ?1
             ORDER BY lc.clicks DESC, lc.link_id ASC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map((user.as_str(), limit), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut clicked = Vec::with_capacity(rows.len());
        for (link_id, clicks) in rows {
            if let Some(link) = self.get_link(user, LinkId::new(link_id))? {
                clicked.push(ClickedLink { link, clicks });
            }
        }

        Ok(clicked)
    }

    /// Loads full links for a list of ids, preserving the given order.
    fn hydrate_links(&self, user: &UserId, ids: &[i64]) -> Result<Vec<Link>> {
        let mut links = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(link) = self.get_link(user, LinkId::new(id))? {
                links.push(link);
            }
        }
        Ok(links)
    }
}

/// Normalizes a tag name for storage and lookup: trimmed and lowercased.
fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Builds a comma-separated placeholder list for a dynamic IN clause.
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
