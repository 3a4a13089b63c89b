//! # Build Robot Common Library
//!
//! Shared code for the build robot client including:
//! - Entity models (artifacts, packages, tracks, stash entries)
//! - Query compilation and evaluation
//! - Entity text rendering
//! - Configuration loading
//! - Vertex stream semantic guessing

pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod semantics;
pub mod text;

pub use error::{Error, Result};
pub use query::{compile, compile_query, id_or_name, Query, QueryTemplate};
