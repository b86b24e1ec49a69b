//! SQLite-backed users table.
//!
//! One connection behind an async mutex; every operation is a short
//! single-statement transaction, so no pooling is needed.

use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;

const SAMPLE_USERS: &[(&str, &str)] = &[
    ("jasman", "jasman@example.com"),
    ("alice", "alice@example.com"),
    ("bob", "bob@example.com"),
];

#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                email TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert sample rows when the table is empty.
    pub async fn seed_if_empty(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        if count == 0 {
            info!("Seeding users table");
            for (username, email) in SAMPLE_USERS {
                conn.execute(
                    "INSERT INTO users (username, email) VALUES (?1, ?2)",
                    [username, email],
                )?;
            }
        }
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT id, username, email FROM users ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(UserRow {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub async fn insert_user(&self, username: &str, email: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users (username, email) VALUES (?1, ?2)",
            [username, email],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Liveness probe: the simplest query the engine will run.
    pub async fn probe(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.seed_if_empty().await.expect("seed");
        assert_eq!(db.list_users().await.expect("list").len(), 3);

        // A second seed pass must not duplicate rows.
        db.seed_if_empty().await.expect("seed again");
        assert_eq!(db.list_users().await.expect("list").len(), 3);
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let id = db
            .insert_user("carol", "carol@example.com")
            .await
            .expect("insert");
        assert!(id > 0);

        let users = db.list_users().await.expect("list");
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "carol");
        assert_eq!(users[0].email, "carol@example.com");
    }

    #[tokio::test]
    async fn test_probe() {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.probe().await.expect("probe succeeds");
    }
}
