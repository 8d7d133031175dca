use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior};

use crate::error::AppError;

const MIGRATION_0001: (&str, &str) = (
    "0001_fact_store.sql",
    include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../migrations/0001_fact_store.sql"
    )),
);

fn migrations() -> Vec<(&'static str, &'static str)> {
    vec![MIGRATION_0001]
}

/// Open (creating if needed) the database file.
pub fn open(path: &Path, busy_timeout: Duration) -> Result<Connection, AppError> {
    let conn = Connection::open(path).map_err(|e| {
        AppError::new("DB_OPEN_FAILED", "Failed to open SQLite database")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    configure(conn, busy_timeout)
}

/// Open an existing database file without creating it.
pub fn open_existing(path: &Path, busy_timeout: Duration) -> Result<Connection, AppError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| {
        AppError::new("DB_OPEN_FAILED", "Failed to open existing SQLite database")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    configure(conn, busy_timeout)
}

pub fn open_in_memory() -> Result<Connection, AppError> {
    let conn = Connection::open_in_memory().map_err(|e| {
        AppError::new("DB_OPEN_FAILED", "Failed to open in-memory SQLite database")
            .with_details(e.to_string())
    })?;
    configure(conn, Duration::from_secs(1))
}

fn configure(conn: Connection, busy_timeout: Duration) -> Result<Connection, AppError> {
    conn.busy_timeout(busy_timeout).map_err(|e| {
        AppError::new("DB_OPEN_FAILED", "Failed to set SQLite busy timeout")
            .with_details(e.to_string())
    })?;
    conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(|e| {
        AppError::new("DB_OPEN_FAILED", "Failed to enable foreign keys")
            .with_details(e.to_string())
    })?;
    Ok(conn)
}

pub fn migrate(conn: &mut Connection) -> Result<(), AppError> {
    // Track migrations by name, applying each exactly once, in deterministic order.
    conn.execute_batch(
        r#"
      CREATE TABLE IF NOT EXISTS _migrations (
        name TEXT PRIMARY KEY NOT NULL,
        applied_at TEXT NOT NULL
      );
    "#,
    )
    .map_err(|e| {
        AppError::new(
            "DB_MIGRATIONS_TABLE_FAILED",
            "Failed to ensure migrations table exists",
        )
        .with_details(e.to_string())
    })?;

    let applied: HashSet<String> = {
        let mut stmt = conn.prepare("SELECT name FROM _migrations").map_err(|e| {
            AppError::new(
                "DB_MIGRATIONS_QUERY_FAILED",
                "Failed to query applied migrations",
            )
            .with_details(e.to_string())
        })?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| {
                AppError::new(
                    "DB_MIGRATIONS_QUERY_FAILED",
                    "Failed to read applied migrations",
                )
                .with_details(e.to_string())
            })?;

        rows.collect::<Result<HashSet<_>, _>>().map_err(|e| {
            AppError::new(
                "DB_MIGRATIONS_QUERY_FAILED",
                "Failed to read applied migration row",
            )
            .with_details(e.to_string())
        })?
    };

    for (name, sql) in migrations() {
        if applied.contains(name) {
            continue;
        }
        tracing::debug!(migration = name, "applying migration");

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| {
                AppError::new("DB_TX_FAILED", "Failed to start migration transaction")
                    .with_details(e.to_string())
            })?;

        // Another process may have applied it since the read above.
        let already: Option<i64> = tx
            .query_row("SELECT 1 FROM _migrations WHERE name = ?1", [name], |row| row.get(0))
            .optional()
            .map_err(|e| {
                AppError::new("DB_MIGRATIONS_QUERY_FAILED", "Failed to re-check migration")
                    .with_details(e.to_string())
            })?;
        if already.is_some() {
            continue;
        }

        tx.execute_batch(sql).map_err(|e| {
            AppError::new("DB_MIGRATION_FAILED", format!("Migration {name} failed"))
                .with_details(e.to_string())
        })?;

        tx.execute(
            "INSERT INTO _migrations(name, applied_at) VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ','now'))",
            [name],
        )
        .map_err(|e| {
            AppError::new("DB_MIGRATION_FAILED", format!("Failed to record migration {name}"))
                .with_details(e.to_string())
        })?;

        tx.commit().map_err(|e| {
            AppError::new("DB_TX_FAILED", "Failed to commit migration transaction")
                .with_details(e.to_string())
        })?;
    }

    Ok(())
}
