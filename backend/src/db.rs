use anyhow::Result;
use shared::Bank;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;

use crate::config::Config;

/// DbConnection owns the pool used for all bank storage
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize the database named by the configuration
    pub async fn init(config: &Config) -> Result<Self> {
        Self::new(&config.database_url, config.db_max_connections).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url, 1).await
    }

    /// Create the banks table if it is missing
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS banks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                location TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get the underlying SQLite pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// All banks in primary-key order
    pub async fn list_banks(&self) -> sqlx::Result<Vec<Bank>> {
        let rows = sqlx::query("SELECT id, name, location FROM banks ORDER BY id")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.iter().map(row_to_bank).collect())
    }

    pub async fn get_bank(&self, id: i64) -> sqlx::Result<Option<Bank>> {
        let row = sqlx::query("SELECT id, name, location FROM banks WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.as_ref().map(row_to_bank))
    }

    /// Insert a bank and return it with the id assigned by SQLite
    pub async fn insert_bank(&self, name: &str, location: &str) -> sqlx::Result<Bank> {
        let row = sqlx::query(
            "INSERT INTO banks (name, location) VALUES (?, ?) RETURNING id, name, location",
        )
        .bind(name)
        .bind(location)
        .fetch_one(self.pool())
        .await?;
        Ok(row_to_bank(&row))
    }

    /// Overwrite the given fields of one bank. `None` arguments keep the stored value.
    /// Returns `None` if no bank has that id.
    pub async fn update_bank(
        &self,
        id: i64,
        name: Option<&str>,
        location: Option<&str>,
    ) -> sqlx::Result<Option<Bank>> {
        let row = sqlx::query(
            r#"
            UPDATE banks
            SET name = COALESCE(?, name), location = COALESCE(?, location)
            WHERE id = ?
            RETURNING id, name, location
            "#,
        )
        .bind(name)
        .bind(location)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.as_ref().map(row_to_bank))
    }

    /// Delete a bank by id. Returns false if it did not exist.
    pub async fn delete_bank(&self, id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM banks WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[cfg(test)]
    pub async fn count_banks(&self) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM banks")
            .fetch_one(self.pool())
            .await
    }
}

fn row_to_bank(row: &SqliteRow) -> Bank {
    Bank {
        id: row.get("id"),
        name: row.get("name"),
        location: row.get("location"),
    }
}
