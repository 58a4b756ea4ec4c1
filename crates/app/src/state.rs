//! Application state management

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stayspot_core::{Database, Result, User};
use stayspot_net::ApiClient;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::identity::CachedIdentity;

const DB_FILE: &str = "stayspot.db";

/// Main application state
pub struct AppState {
    pub config: AppConfig,
    db: Mutex<Database>,
    pub api: Arc<ApiClient>,
    pub identity: Arc<CachedIdentity>,
    data_dir: PathBuf,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let data_dir = config.data_path()?;
        std::fs::create_dir_all(&data_dir)?;
        let db = Database::open(data_dir.join(DB_FILE))?;
        Self::with_database(config, db, data_dir)
    }

    /// Build around an already opened database
    pub fn with_database(config: AppConfig, db: Database, data_dir: PathBuf) -> Result<Self> {
        let api = ApiClient::new(&config.api_base_url, config.request_timeout())?;

        let stored = db.sessions().load_token()?;
        if let Some(stored) = stored {
            debug!(user_id = ?stored.user_id, "Restored session token");
            api.set_token(Some(stored.token));
        }

        let api = Arc::new(api);
        let identity = Arc::new(CachedIdentity::new(api.clone()));
        if let Some(profile) = db.sessions().load_profile()? {
            identity.seed(profile);
        }

        info!(api = %api.base_url(), data_dir = %data_dir.display(), "Application state ready");

        Ok(Self {
            config,
            db: Mutex::new(db),
            api,
            identity,
            data_dir,
        })
    }

    pub fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn is_logged_in(&self) -> bool {
        self.api.has_token()
    }

    /// Profile known without a network call
    pub fn known_user(&self) -> Option<User> {
        self.identity.cached().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stayspot_core::AuthSession;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_restores_saved_session() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join(DB_FILE)).unwrap();
        db.sessions()
            .save_session(&AuthSession {
                id: 4,
                name: "Kiran".to_string(),
                email: "kiran@example.com".to_string(),
                token: "tok-4".to_string(),
            })
            .unwrap();

        let state =
            AppState::with_database(AppConfig::default(), db, dir.path().to_path_buf()).unwrap();
        assert!(state.is_logged_in());
        assert_eq!(state.known_user().map(|u| u.id), Some(4));
    }

    #[test]
    fn test_fresh_state_is_logged_out() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            data_dir: Some(dir.path().join("data")),
            ..AppConfig::default()
        };

        let state = AppState::new(config).unwrap();
        assert!(!state.is_logged_in());
        assert!(state.known_user().is_none());
        assert!(state.data_dir().join(DB_FILE).exists());
    }

    #[test]
    fn test_bad_api_url_fails() {
        let db = Database::open_in_memory().unwrap();
        let config = AppConfig {
            api_base_url: "ftp://nowhere".to_string(),
            ..AppConfig::default()
        };
        assert!(AppState::with_database(config, db, PathBuf::from("/tmp")).is_err());
    }
}
