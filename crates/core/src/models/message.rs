//! Message model for conversation chat

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::parse::{deserialize_timestamp, serialize_timestamp, RawFlag};

/// Read state of a message as reported by the remote store
///
/// The client never changes this locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadState {
    /// The server did not say
    #[default]
    Unknown,
    Unread,
    Read,
}

impl ReadState {
    pub fn is_read(&self) -> bool {
        matches!(self, ReadState::Read)
    }
}

impl From<bool> for ReadState {
    fn from(read: bool) -> Self {
        if read {
            ReadState::Read
        } else {
            ReadState::Unread
        }
    }
}

impl Serialize for ReadState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReadState::Unknown => serializer.serialize_none(),
            ReadState::Unread => serializer.serialize_bool(false),
            ReadState::Read => serializer.serialize_bool(true),
        }
    }
}

impl<'de> Deserialize<'de> for ReadState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawFlag>::deserialize(deserializer)?;
        Ok(raw
            .map(|flag| ReadState::from(flag.as_bool()))
            .unwrap_or(ReadState::Unknown))
    }
}

/// A chat line in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub content: String,
    #[serde(
        rename = "timestamp",
        alias = "created_at",
        deserialize_with = "deserialize_timestamp",
        serialize_with = "serialize_timestamp"
    )]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "is_read", default)]
    pub read_state: ReadState,
    /// Back-reference to the owning conversation
    #[serde(default)]
    pub conversation_id: Option<i64>,
    /// Listing the conversation is about
    #[serde(default)]
    pub rental_id: Option<i64>,
}

impl Message {
    /// Timeline ordering: creation time, then id
    pub fn timeline_order(a: &Message, b: &Message) -> Ordering {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Whether `user_id` wrote this message
    pub fn is_from(&self, user_id: Option<i64>) -> bool {
        user_id.map(|uid| uid == self.sender_id).unwrap_or(false)
    }
}

/// Sort messages into timeline order in place
pub fn sort_for_timeline(messages: &mut [Message]) {
    messages.sort_by(Message::timeline_order);
}
