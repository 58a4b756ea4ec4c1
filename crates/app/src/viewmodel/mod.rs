//! View models behind the command-line front end

pub mod auth;
pub mod chat;
pub mod conversations;

pub use chat::{ChatSession, ChatView, SendOutcome, SyncConfig};
pub use conversations::{load_conversations, ConversationRow};
