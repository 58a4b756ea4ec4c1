//! Versioned schema for the local session database
//!
//! Each step runs in its own transaction together with its bookkeeping row,
//! so a crash never leaves a half-applied step recorded.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, instrument};

use crate::error::Result;

/// One schema step
pub struct Migration {
    /// Sequential, starting at 1
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Session token",
        sql: r#"
            -- at most one signed-in account per device
            CREATE TABLE IF NOT EXISTS auth_session (
                slot INTEGER PRIMARY KEY CHECK (slot = 0),
                token TEXT NOT NULL,
                user_id INTEGER,
                saved_at TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Cached profile of the signed-in user",
        sql: r#"
            CREATE TABLE IF NOT EXISTS cached_profile (
                user_id INTEGER PRIMARY KEY,
                profile_json TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );
        "#,
    },
];

/// Highest version this build knows about
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Version recorded in the database, 0 when fresh
pub fn applied_version(conn: &Connection) -> Result<u32> {
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

/// Bring the schema up to [`latest_version`]
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )?;

    let from = applied_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        debug!(version = from, "Schema up to date");
        return Ok(());
    }

    for migration in pending {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
            params![
                migration.version,
                migration.description,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        tx.commit()?;
        debug!(version = migration.version, description = migration.description, "Applied migration");
    }

    info!(from, to = latest_version(), "Session database schema updated");
    Ok(())
}
