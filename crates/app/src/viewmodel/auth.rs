//! Authentication view model

use stayspot_core::{AuthSession, Error, IdentityProvider, Result, User};
use tracing::{info, warn};

use crate::state::AppState;

/// Sign in and persist the session token
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<User> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(Error::Validation("Email and password are required".into()));
    }

    let session = state.api.login(email, password).await?;
    remember(state, &session)?;
    info!(user_id = session.id, "Logged in");
    Ok(session.to_user())
}

/// Create an account; the server signs the new user in
pub async fn register(state: &AppState, name: &str, email: &str, password: &str) -> Result<User> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(Error::Validation("Name, email and password are required".into()));
    }

    let session = state.api.register(name, email, password).await?;
    remember(state, &session)?;
    info!(user_id = session.id, "Registered");
    Ok(session.to_user())
}

/// Forget the stored token and profile
pub fn logout(state: &AppState) -> Result<()> {
    state.db().sessions().clear()?;
    state.api.set_token(None);
    info!("Logged out");
    Ok(())
}

/// Current user, from the server when not cached yet
pub async fn whoami(state: &AppState) -> Result<User> {
    if !state.is_logged_in() {
        return Err(Error::NotAuthenticated);
    }

    let user = state.identity.current_user().await?;
    if let Err(e) = state.db().sessions().save_profile(&user) {
        warn!(error = %e, "Could not cache profile");
    }
    Ok(user)
}

fn remember(state: &AppState, session: &AuthSession) -> Result<()> {
    state.db().sessions().save_session(session)?;
    state.identity.seed(session.to_user());
    Ok(())
}
