mod schema;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use rusqlite::Connection;

use schema::INITIAL_SCHEMA;

/// How long a connection waits on a locked database before giving up.
///
/// Click counters are incremented by concurrent writers; the busy timeout
/// makes racing connections retry instead of failing with SQLITE_BUSY.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database wrapper providing connection management and schema initialization.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist.
    /// Automatically initializes the schema on connection open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// Executes all schema statements in a single batch. Uses IF NOT EXISTS
    /// for idempotent execution, so reopening an existing database is safe.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn.execute("PRAGMA foreign_keys = ON", [])?;
        self.conn.execute_batch(INITIAL_SCHEMA)?;
        Ok(())
    }

    /// Returns a reference to the underlying connection.
    ///
    /// Useful for executing custom queries in tests or advanced operations.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn in_memory_opens_successfully() {
        let result = Database::in_memory();
        assert!(result.is_ok());
    }

    #[test]
    fn schema_tables_exist() {
        let db = Database::in_memory().unwrap();

        let tables: Vec<String> = db
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"links".to_string()));
        assert!(tables.contains(&"tags".to_string()));
        assert!(tables.contains(&"link_tags".to_string()));
        assert!(tables.contains(&"link_clicks".to_string()));
    }

    #[test]
    fn schema_indexes_exist() {
        let db = Database::in_memory().unwrap();

        let indexes: Vec<String> = db
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(indexes.contains(&"idx_links_user_created".to_string()));
        assert!(indexes.contains(&"idx_link_tags_link".to_string()));
        assert!(indexes.contains(&"idx_link_tags_tag".to_string()));
        assert!(indexes.contains(&"idx_link_clicks_user".to_string()));
    }

    #[test]
    fn foreign_keys_enabled() {
        let db = Database::in_memory().unwrap();

        let fk_enabled: i32 = db
            .connection()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert_eq!(fk_enabled, 1);
    }

    #[test]
    fn tag_names_unique_per_user_not_globally() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        conn.execute(
            "INSERT INTO tags (user_id, name) VALUES ('alice', 'rust')",
            [],
        )
        .unwrap();

        // Same name for a different user is fine
        conn.execute(
            "INSERT INTO tags (user_id, name) VALUES ('bob', 'rust')",
            [],
        )
        .unwrap();

        // Same name for the same user violates the unique constraint,
        // even with different casing
        let duplicate = conn.execute(
            "INSERT INTO tags (user_id, name) VALUES ('alice', 'Rust')",
            [],
        );
        assert!(duplicate.is_err());
    }

    #[test]
    fn link_tags_cascade_on_link_delete() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        conn.execute(
            "INSERT INTO links (id, user_id, url, created_at) VALUES (1, 'alice', 'https://a', 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tags (id, user_id, name) VALUES (1, 'alice', 'rust')",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO link_tags (link_id, tag_id) VALUES (1, 1)", [])
            .unwrap();

        conn.execute("DELETE FROM links WHERE id = 1", []).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM link_tags", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0, "associations should be CASCADE deleted");
    }

    #[test]
    fn link_cannot_carry_same_tag_twice() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        conn.execute(
            "INSERT INTO links (id, user_id, url, created_at) VALUES (1, 'alice', 'https://a', 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tags (id, user_id, name) VALUES (1, 'alice', 'rust')",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO link_tags (link_id, tag_id) VALUES (1, 1)", [])
            .unwrap();

        let duplicate = conn.execute("INSERT INTO link_tags (link_id, tag_id) VALUES (1, 1)", []);
        assert!(duplicate.is_err(), "join rows have set semantics");
    }

    #[test]
    fn open_creates_database_file() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let result = Database::open(&db_path);
        assert!(result.is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        // Open and close first time
        {
            let db = Database::open(&db_path).unwrap();
            db.connection()
                .execute(
                    "INSERT INTO links (user_id, url, created_at) VALUES ('alice', 'https://a', 0)",
                    [],
                )
                .unwrap();
        }

        // Reopen - schema initialization should not fail
        let db2 = Database::open(&db_path);
        assert!(db2.is_ok());

        // Verify data persisted
        let count: i64 = db2
            .unwrap()
            .connection()
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn clicks_check_constraint_rejects_negative_values() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        conn.execute(
            "INSERT INTO links (id, user_id, url, created_at) VALUES (1, 'alice', 'https://a', 0)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO link_clicks (link_id, user_id, clicks) VALUES (1, 'alice', -1)",
            [],
        );
        assert!(result.is_err());
    }
}
