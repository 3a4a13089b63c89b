//! Remote build store abstraction
//!
//! Every verb talks to the server through [`RemoteStore`]. The production
//! implementation is [`RemoteClient`] (HTTP + newline-delimited JSON); the
//! [`MemoryStore`] implementation evaluates queries locally and backs tests.

use async_trait::async_trait;
use robot_common::models::{BuildInformation, Domain, Track, UploadResult};
use robot_common::{Error, Query, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod memory;
pub mod remote;

pub use memory::MemoryStore;
pub use remote::RemoteClient;

/// Visitor verdict for one streamed entity
#[derive(Debug)]
pub enum Visit {
    /// Keep streaming
    Continue,
    /// Abort the stream; the error becomes the search result
    Stop(Error),
}

/// Entity visitor over the raw JSON form of search results
pub type RawVisitor<'a> = dyn FnMut(Value) -> Visit + Send + 'a;

/// Track mutation request
///
/// Only fields that are `Some` are transmitted, so the server can tell
/// "leave unchanged" (absent) from "clear" (present but empty). An empty
/// `id` asks the server to create a track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackUpdate {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
}

/// Operations the build tracking server exposes
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Stream every entity of `domain` matching `query` to `visitor`
    ///
    /// Entities arrive strictly one at a time in server order. Zero matches
    /// is a success. A [`Visit::Stop`] ends the stream and its error is
    /// returned.
    async fn search(&self, domain: Domain, query: &Query, visitor: &mut RawVisitor<'_>) -> Result<()>;

    /// Store file content in the stash under its content hash
    async fn stash_upload(&self, id: &str, name: &str, content: Vec<u8>) -> Result<String>;

    /// Register stashed content as a build, merging into a matching set
    async fn add_build(&self, id: &str, information: &BuildInformation) -> Result<UploadResult>;

    /// Create or modify a track, returning the stored result
    async fn update_track(&self, update: &TrackUpdate) -> Result<Track>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_update_omits_absent_fields() {
        let update = TrackUpdate {
            id: "t1".to_string(),
            name: None,
            description: Some(String::new()),
            head: Some("p2".to_string()),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"id": "t1", "description": "", "head": "p2"}));
    }

    #[test]
    fn test_track_update_without_id_serializes_empty_object() {
        let json = serde_json::to_string(&TrackUpdate::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
