//! Conversation list view model

use chrono::{DateTime, TimeZone};
use stayspot_core::format::preview_label;
use stayspot_core::{ConversationSummary, IdentityProvider, Result};
use tracing::debug;

use crate::state::AppState;

/// One rendered row of the conversation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRow {
    pub id: i64,
    pub title: String,
    pub location: String,
    /// The other participant; empty while identity is unknown
    pub counterpart: String,
    pub preview: String,
    pub time: String,
}

impl ConversationRow {
    pub fn from_summary<Tz>(summary: &ConversationSummary, me: Option<i64>, now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            id: summary.id,
            title: summary.rental_title.clone().unwrap_or_default(),
            location: summary.rental_location.clone().unwrap_or_default(),
            counterpart: summary.counterpart_name(me).to_string(),
            preview: summary.last_message_preview().to_string(),
            time: summary
                .last_message_time
                .map(|ts| preview_label(&ts, now))
                .unwrap_or_default(),
        }
    }
}

/// Fetch the user's conversations in server order
///
/// Identity failures only blank the counterpart names.
pub async fn load_conversations(state: &AppState) -> Result<Vec<ConversationRow>> {
    let me = match state.identity.current_user().await {
        Ok(user) => Some(user.id),
        Err(e) => {
            debug!(error = %e, "Identity unavailable for conversation list");
            None
        }
    };

    let summaries = state.api.list_conversations().await?;
    let now = chrono::Local::now();
    Ok(summaries
        .iter()
        .map(|summary| ConversationRow::from_summary(summary, me, &now))
        .collect())
}
