//! Local session database
//!
//! Only what must survive a restart lives here: the bearer token and the
//! profile it belongs to. Messages are never stored locally.

mod migrations;
mod session;

use std::path::Path;

use rusqlite::Connection;
use tracing::instrument;

use crate::error::Result;

pub use session::{SessionStore, StoredToken};

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database file and migrate it
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::migrated(Connection::open(path)?)
    }

    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn schema_version(&self) -> Result<u32> {
        migrations::applied_version(&self.conn)
    }

    pub fn sessions(&self) -> SessionStore<'_> {
        SessionStore::new(&self.conn)
    }
}
