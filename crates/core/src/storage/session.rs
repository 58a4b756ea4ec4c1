//! Session token persistence
//!
//! Holds the bearer token of the signed-in account and the last profile
//! fetched for it, so a restart does not require a new login.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::Result;
use crate::models::{AuthSession, User};

/// Stored credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub token: String,
    pub user_id: Option<i64>,
}

/// Session store
pub struct SessionStore<'a> {
    conn: &'a Connection,
}

impl<'a> SessionStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Replace the stored token
    pub fn save_token(&self, token: &str, user_id: Option<i64>) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO auth_session (slot, token, user_id, saved_at)
             VALUES (0, ?1, ?2, ?3)",
            params![token, user_id, Utc::now().to_rfc3339()],
        )?;
        debug!(?user_id, "Session token saved");
        Ok(())
    }

    /// Persist the result of a login or registration
    pub fn save_session(&self, session: &AuthSession) -> Result<()> {
        self.save_token(&session.token, Some(session.id))?;
        self.save_profile(&session.to_user())
    }

    /// Load the stored token, if any
    pub fn load_token(&self) -> Result<Option<StoredToken>> {
        let token = self
            .conn
            .query_row(
                "SELECT token, user_id FROM auth_session WHERE slot = 0",
                [],
                |row| {
                    Ok(StoredToken {
                        token: row.get(0)?,
                        user_id: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(token)
    }

    /// Forget the token and any cached profile
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM auth_session", [])?;
        self.conn.execute("DELETE FROM cached_profile", [])?;
        debug!("Session cleared");
        Ok(())
    }

    /// Cache a fetched profile
    pub fn save_profile(&self, user: &User) -> Result<()> {
        let json = serde_json::to_string(user)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO cached_profile (user_id, profile_json, fetched_at)
             VALUES (?1, ?2, ?3)",
            params![user.id, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Cached profile of the signed-in account
    pub fn load_profile(&self) -> Result<Option<User>> {
        let Some(stored) = self.load_token()? else {
            return Ok(None);
        };
        let Some(user_id) = stored.user_id else {
            return Ok(None);
        };

        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT profile_json FROM cached_profile WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|j| serde_json::from_str::<User>(&j).map_err(Into::into))
            .transpose()
    }
}
