//! # Build robot client
//!
//! Talks to a build tracking server: uploads build outputs with inferred
//! build information, streams search results, and resolves and updates
//! tracks.

pub mod cli;
pub mod inference;
pub mod logging;
pub mod resolver;
pub mod search;
pub mod store;
pub mod upload;
pub mod vcs;

pub use cli::Cli;
pub use store::{MemoryStore, RemoteClient, RemoteStore, Visit};
