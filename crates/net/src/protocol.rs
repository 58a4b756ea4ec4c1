//! Request and response bodies of the StaySpot REST service
//!
//! The service is not entirely consistent about envelopes: the profile
//! endpoint answers with a one-element array and a freshly posted message
//! may or may not be wrapped. These types absorb that.

use serde::{Deserialize, Serialize};
use stayspot_core::{Message, User};

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub content: &'a str,
}

/// The listing endpoint takes the id as a string
#[derive(Debug, Serialize)]
pub struct ListingRequest {
    pub rental_id: String,
}

/// `/api/user` answer
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProfileResponse {
    Many(Vec<User>),
    One(User),
}

impl ProfileResponse {
    pub fn into_user(self) -> Option<User> {
        match self {
            ProfileResponse::Many(users) => users.into_iter().next(),
            ProfileResponse::One(user) => Some(user),
        }
    }
}

/// Answer to posting a message
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageEnvelope {
    Wrapped { message: Message },
    Bare(Message),
}

impl MessageEnvelope {
    pub fn into_message(self) -> Message {
        match self {
            MessageEnvelope::Wrapped { message } => message,
            MessageEnvelope::Bare(message) => message,
        }
    }
}

/// Error body, when the service sends one
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default, alias = "message")]
    pub error: Option<String>,
}

/// Best human-readable description of a failed response body
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}
