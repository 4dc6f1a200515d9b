use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::selection::types::FavoriteSet;

pub const FAVORITES_KEY: &str = "favoriteTeams";

/// Key/value store for viewer preferences
pub struct PreferenceStore {
    conn: Connection,
}

impl PreferenceStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open preferences database: {}", db_path))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            "#,
        )
        .context("Failed to create preferences table")?;

        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read preference {}", key))?;

        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("Failed to write preference {}", key))?;

        Ok(())
    }

    /// Stored favorites. Missing or unreadable values give an empty set.
    pub fn load_favorites(&self) -> Result<FavoriteSet> {
        let Some(raw) = self.get(FAVORITES_KEY)? else {
            return Ok(FavoriteSet::new());
        };

        match serde_json::from_str::<FavoriteSet>(&raw) {
            Ok(set) => Ok(set),
            Err(e) => {
                warn!(key = FAVORITES_KEY, error = %e, "Stored favorites unreadable, starting empty");
                Ok(FavoriteSet::new())
            }
        }
    }

    pub fn save_favorites(&self, favorites: &FavoriteSet) -> Result<()> {
        let json = serde_json::to_string(favorites).context("Failed to encode favorites")?;
        self.set(FAVORITES_KEY, &json)
    }
}
