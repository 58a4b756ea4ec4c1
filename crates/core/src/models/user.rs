//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::parse::deserialize_timestamp_opt;

/// A StaySpot account as returned by the profile endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_timestamp_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
}

/// Credentials handed out by login or registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub token: String,
}

impl AuthSession {
    /// Profile fields known from the login response alone
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: None,
            location: None,
            occupation: None,
            phone_number: None,
            bio: None,
            profile_url: None,
        }
    }
}
