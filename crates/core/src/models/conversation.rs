//! Conversation list entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::parse::deserialize_timestamp_opt;

/// One row of the conversation list
///
/// A conversation is between a listing owner and an interested user and is
/// anchored to one listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: i64,
    #[serde(default)]
    pub rental_id: Option<i64>,
    #[serde(default)]
    pub rental_title: Option<String>,
    #[serde(default)]
    pub rental_location: Option<String>,
    #[serde(default, rename = "rental_imageUrl")]
    pub rental_image_url: Option<String>,
    pub owner_id: i64,
    #[serde(default)]
    pub owner_name: Option<String>,
    pub user_id: i64,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp_opt")]
    pub last_message_time: Option<DateTime<Utc>>,
}

impl ConversationSummary {
    /// Name of the other participant
    ///
    /// Empty while the viewer's identity is unknown.
    pub fn counterpart_name(&self, me: Option<i64>) -> &str {
        let name = match me {
            None => return "",
            Some(me) if me == self.owner_id => &self.user_name,
            Some(_) => &self.owner_name,
        };
        name.as_deref().unwrap_or("")
    }

    /// Last message text, or a placeholder for fresh conversations
    pub fn last_message_preview(&self) -> &str {
        match self.last_message.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => "No messages yet.",
        }
    }
}
