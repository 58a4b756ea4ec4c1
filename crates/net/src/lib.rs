//! StaySpot Network Library
//!
//! HTTP/JSON client for the StaySpot REST service.
//!
//! # Architecture
//!
//! - **Client**: `ApiClient`, a reqwest client carrying the bearer token
//! - **Protocol**: request and response bodies, including the service's
//!   envelope quirks
//! - **Gateway**: `ApiClient` implements the core `MessageGateway` and
//!   `IdentityProvider` traits, mapping transport errors onto core error kinds
//!
//! # Usage
//!
//! ```ignore
//! let client = ApiClient::new(DEFAULT_API_URL, Duration::from_secs(8))?
//!     .with_token(Some(token));
//!
//! let messages = client.list_messages(conversation_id).await?;
//! let sent = client.append_message(conversation_id, "Is it still available?").await?;
//! ```

pub mod client;
pub mod error;
pub mod protocol;

pub use client::ApiClient;
pub use error::{Error, Result};

/// Production StaySpot API
pub const DEFAULT_API_URL: &str = "https://stayspot.onrender.com";
