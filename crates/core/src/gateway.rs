//! Remote collaborator traits
//!
//! The chat core only talks to the outside world through these. The HTTP
//! client implements them; tests use in-memory mocks.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Message, User};

/// Remote message log for conversations
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Full message list of a conversation, oldest first
    ///
    /// Fails with `Network` or `Auth`.
    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>>;

    /// Append a message and return it as persisted
    ///
    /// Fails with `Validation` for empty content, `Network` or `Auth`.
    async fn append_message(&self, conversation_id: i64, content: &str) -> Result<Message>;
}

/// Resolves who the caller is
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fails with `NotAuthenticated` when no session token is present
    async fn current_user(&self) -> Result<User>;
}
