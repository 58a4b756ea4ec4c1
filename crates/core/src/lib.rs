//! StaySpot Core Library
//!
//! Models, timeline grouping, date labels, remote collaborator traits and
//! local session storage for the StaySpot chat client.

pub mod error;
pub mod format;
pub mod gateway;
pub mod models;
pub mod storage;

pub use error::{Error, Result};
pub use gateway::{IdentityProvider, MessageGateway};
pub use models::*;
pub use storage::{Database, SessionStore, StoredToken};
