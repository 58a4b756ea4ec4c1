//! Data models for StaySpot chat

mod conversation;
mod listing;
mod message;
pub mod parse;
mod timeline;
mod user;

pub use conversation::*;
pub use listing::*;
pub use message::*;
pub use timeline::*;
pub use user::*;
