//! StaySpot chat client
//!
//! Configuration, session state and the view models behind the `stayspot`
//! binary. [`viewmodel::ChatSession`] keeps one open conversation in sync
//! with the server; the binary only wires it to a terminal.

pub mod cli;
pub mod config;
pub mod identity;
pub mod render;
pub mod state;
pub mod viewmodel;
