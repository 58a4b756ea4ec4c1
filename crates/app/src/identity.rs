//! Process-wide identity cache

use std::sync::Arc;

use async_trait::async_trait;
use stayspot_core::{IdentityProvider, Result, User};
use tokio::sync::OnceCell;
use tracing::debug;

/// Remembers the first successfully resolved user for the whole process
///
/// Shared by every open chat session. Failures are not cached, so a later
/// session retries after the user logs in.
pub struct CachedIdentity {
    provider: Arc<dyn IdentityProvider>,
    user: OnceCell<User>,
}

impl CachedIdentity {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            user: OnceCell::new(),
        }
    }

    /// Pre-fill from a profile saved at login
    ///
    /// Ignored when a user is already cached.
    pub fn seed(&self, user: User) {
        let _ = self.user.set(user);
    }

    /// Cached user, if resolved
    pub fn cached(&self) -> Option<&User> {
        self.user.get()
    }
}

#[async_trait]
impl IdentityProvider for CachedIdentity {
    async fn current_user(&self) -> Result<User> {
        let user = self
            .user
            .get_or_try_init(|| async {
                debug!("Resolving current user");
                self.provider.current_user().await
            })
            .await?;
        Ok(user.clone())
    }
}
