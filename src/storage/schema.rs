use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::DatabaseError;

// ============================================================================
// Database
// ============================================================================

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InstanceLocked` if another instance of mensa
    /// has the database locked (SQLITE_BUSY, SQLITE_LOCKED, SQLITE_CANTOPEN).
    /// Returns `DatabaseError::Other` for other database errors.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // Set database file permissions BEFORE pool creation so there is no
        // window where the file exists with default umask permissions.
        #[cfg(unix)]
        if path != ":memory:" {
            use std::os::unix::fs::PermissionsExt;
            let db_path = std::path::Path::new(path);
            if db_path.exists() {
                let perms = std::fs::Permissions::from_mode(0o600);
                if let Err(e) = std::fs::set_permissions(path, perms) {
                    tracing::warn!(path = %path, error = %e, "Failed to set database file permissions");
                }
            } else if let Some(parent) = db_path.parent() {
                if parent.exists() {
                    // Pre-create the DB file with mode(0o600) at creation time,
                    // eliminating the TOCTOU window between create and chmod.
                    use std::os::unix::fs::OpenOptionsExt;
                    let _file = std::fs::OpenOptions::new()
                        .write(true)
                        .create_new(true)
                        .mode(0o600)
                        .open(db_path)
                        .ok(); // If creation fails, SQLite will report the error at connect_with.
                }
            }
        }

        // busy_timeout=5000: SQLite waits up to 5 seconds for locks to release
        // before returning SQLITE_BUSY. Handles transient contention between
        // the menu refresh task and UI queries automatically. Using pragma()
        // ensures all connections in the pool inherit this setting.
        // journal_mode=WAL lets history reads proceed while a menu refresh
        // writes (a no-op for :memory: databases in tests).
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(DatabaseError::from_sqlx)?
            .pragma("busy_timeout", "5000")
            .pragma("journal_mode", "WAL");
        // SQLite is single-writer; 5 connections covers peak concurrent readers
        // (menu refresh + history queries + UI reads).
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        let db = Self { pool };
        db.migrate().await.map_err(|e| {
            // Migration errors could also be lock-related
            let error_string = e.to_string().to_lowercase();
            if error_string.contains("database is locked")
                || error_string.contains("database table is locked")
                || error_string.contains("sqlite_busy")
                || error_string.contains("sqlite_locked")
            {
                DatabaseError::InstanceLocked
            } else {
                DatabaseError::Migration(e.to_string())
            }
        })?;
        Ok(db)
    }

    /// Run database migrations atomically within a transaction.
    ///
    /// All schema changes are wrapped in a single transaction so a failure
    /// partway (disk full, power loss) rolls back and leaves the database in
    /// its previous consistent state. SQLite supports DDL inside
    /// transactions, and every statement uses `IF NOT EXISTS`, so re-running
    /// on an existing database is a no-op.
    async fn migrate(&self) -> Result<()> {
        // Enable foreign keys (must be outside transaction, per-connection setting)
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&self.pool)
            .await?;

        sqlx::query("PRAGMA busy_timeout = 5000")
            .execute(&self.pool)
            .await?;

        let mut tx = self.pool.begin().await?;

        // Cached menu, one row per purchasable variant. variant_id comes from
        // the service and is globally unique; order_index preserves the
        // service's presentation order.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS food (
                variant_id INTEGER PRIMARY KEY,
                food_id INTEGER NOT NULL,
                variant_name TEXT NOT NULL,
                food_name TEXT NOT NULL,
                price INTEGER NOT NULL,
                calories INTEGER NOT NULL,
                protein INTEGER NOT NULL,
                fat INTEGER NOT NULL,
                carbohydrates INTEGER NOT NULL,
                category TEXT NOT NULL,
                image_url TEXT NOT NULL,
                order_index INTEGER NOT NULL DEFAULT 0
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_food_food_id ON food(food_id)")
            .execute(&mut *tx)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_food_order ON food(order_index)")
            .execute(&mut *tx)
            .await?;

        // Saved meal history. No foreign key to food: the menu cache is
        // replaced wholesale on every fetch, and history must outlive it.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS food_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                variant_id INTEGER NOT NULL,
                meal_option TEXT NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_history_timestamp ON food_history(timestamp DESC)",
        )
        .execute(&mut *tx)
        .await?;

        // User preferences (key-value store for user settings)
        // Grouped keys use a dotted convention (profile.age, profile.bmr_method);
        // standalone settings use the bare name (theme).
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}
