//! Entities held by the build tracking server
//!
//! The client only ever holds transient copies of these records; the server
//! owns them. All four searchable kinds implement [`Entity`], which ties a
//! Rust type to the search domain it is returned from.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the independently searchable entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Artifact,
    Package,
    Track,
    Stash,
}

impl Domain {
    pub const ALL: [Domain; 4] = [Domain::Artifact, Domain::Package, Domain::Track, Domain::Stash];

    /// Collection name used in server URLs
    pub fn collection(&self) -> &'static str {
        match self {
            Domain::Artifact => "artifacts",
            Domain::Package => "packages",
            Domain::Track => "tracks",
            Domain::Stash => "stash",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Domain::Artifact => "artifact",
            Domain::Package => "package",
            Domain::Track => "track",
            Domain::Stash => "stash",
        };
        f.write_str(name)
    }
}

/// A server-held record that can be returned by a search
pub trait Entity: Serialize + DeserializeOwned + Send + 'static {
    /// Domain this entity kind is searched in
    const DOMAIN: Domain;

    /// Opaque server-assigned identifier
    fn id(&self) -> &str;
}

/// How confident the uploader is that the working tree matches the upload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildType {
    /// No version control signal at all
    #[default]
    BuildBot,
    /// Clean tree with a detected change id
    User,
    /// Dirty working tree
    Local,
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildType::BuildBot => "BuildBot",
            BuildType::User => "User",
            BuildType::Local => "Local",
        };
        f.write_str(name)
    }
}

/// Machine that performed a build upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub arch: String,
}

/// Provenance of an upload, built once per upload session
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildInformation {
    #[serde(rename = "type", default)]
    pub build_type: BuildType,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub cl: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub builder: HostInfo,
    #[serde(default)]
    pub uploader: String,
}

/// A single uploaded build output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    #[serde(default)]
    pub builder: HostInfo,
    #[serde(default)]
    pub information: BuildInformation,
}

impl Entity for Artifact {
    const DOMAIN: Domain = Domain::Artifact;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A build set: artifacts considered equivalent builds of one change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub information: BuildInformation,
}

impl Entity for Package {
    const DOMAIN: Domain = Domain::Package;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A named, mutable pointer to a head package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Id of the package considered current for this track
    #[serde(default)]
    pub head: String,
}

impl Entity for Track {
    const DOMAIN: Domain = Domain::Track;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Upload state of a stash entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StashStatus {
    #[default]
    Uploading,
    Present,
}

/// A file held in the content-addressed stash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashEntry {
    /// Lowercase hex SHA-256 of the content
    pub id: String,
    /// Names the content was uploaded under
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub executable: bool,
    #[serde(default)]
    pub status: StashStatus,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Entity for StashEntry {
    const DOMAIN: Domain = Domain::Stash;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Outcome of registering one uploaded file as a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Build set the upload now belongs to
    #[serde(rename = "id")]
    pub set_id: String,
    /// True when joined to a pre-existing set rather than creating one
    pub merged: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_information_wire_names() {
        let info = BuildInformation {
            build_type: BuildType::Local,
            branch: "main".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "Local");
        assert_eq!(json["branch"], "main");
    }

    #[test]
    fn test_track_deserializes_with_missing_fields() {
        let track: Track = serde_json::from_str(r#"{"id":"t1","name":"alpha"}"#).unwrap();
        assert_eq!(track.id(), "t1");
        assert_eq!(track.name, "alpha");
        assert!(track.head.is_empty());
    }

    #[test]
    fn test_domain_collections_are_distinct() {
        let mut names: Vec<_> = Domain::ALL.iter().map(|d| d.collection()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_upload_result_wire_shape() {
        let result: UploadResult = serde_json::from_str(r#"{"id":"s1","merged":true}"#).unwrap();
        assert_eq!(result.set_id, "s1");
        assert!(result.merged);
    }
}
