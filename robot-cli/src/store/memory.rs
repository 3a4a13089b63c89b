//! In-process build store
//!
//! Evaluates queries locally against vectors of entities. Used by the test
//! suites, both directly and behind a loopback HTTP server.

use super::{RawVisitor, RemoteStore, TrackUpdate, Visit};
use async_trait::async_trait;
use chrono::Utc;
use robot_common::models::{
    Artifact, BuildInformation, Domain, Package, StashEntry, StashStatus, Track, UploadResult,
};
use robot_common::{Error, Query, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Inner {
    artifacts: Vec<Artifact>,
    packages: Vec<Package>,
    tracks: Vec<Track>,
    stash: Vec<StashEntry>,
    /// (content id, build information) -> build set id
    sets: HashMap<(String, BuildInformation), String>,
    rejected_names: HashSet<String>,
    next_id: u64,
    search_calls: usize,
    update_calls: usize,
}

impl Inner {
    fn allocate(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }
}

/// Build store held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a track as if it already existed on the server
    pub fn insert_track(&self, track: Track) {
        self.lock().tracks.push(track);
    }

    pub fn insert_artifact(&self, artifact: Artifact) {
        self.lock().artifacts.push(artifact);
    }

    pub fn insert_package(&self, package: Package) {
        self.lock().packages.push(package);
    }

    /// Make every stash upload of `name` fail with a remote error
    pub fn reject_uploads_named(&self, name: &str) {
        self.lock().rejected_names.insert(name.to_string());
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.lock().tracks.clone()
    }

    pub fn packages(&self) -> Vec<Package> {
        self.lock().packages.clone()
    }

    pub fn stash_entries(&self) -> Vec<StashEntry> {
        self.lock().stash.clone()
    }

    /// Number of search calls received
    pub fn search_calls(&self) -> usize {
        self.lock().search_calls
    }

    /// Number of track update calls received
    pub fn update_calls(&self) -> usize {
        self.lock().update_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panicked test thread must not hide the state from the others
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn snapshot<T: Serialize>(entities: &[T]) -> Result<Vec<Value>> {
    entities
        .iter()
        .map(|e| serde_json::to_value(e).map_err(Error::from))
        .collect()
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn search(&self, domain: Domain, query: &Query, visitor: &mut RawVisitor<'_>) -> Result<()> {
        // Snapshot first so the visitor never runs under the lock
        let entities = {
            let mut inner = self.lock();
            inner.search_calls += 1;
            match domain {
                Domain::Artifact => snapshot(&inner.artifacts)?,
                Domain::Package => snapshot(&inner.packages)?,
                Domain::Track => snapshot(&inner.tracks)?,
                Domain::Stash => snapshot(&inner.stash)?,
            }
        };

        for entity in entities {
            // Evaluation failures are the server's to report
            if !query.matches(&entity).map_err(|e| Error::Remote(e.to_string()))? {
                continue;
            }
            if let Visit::Stop(err) = visitor(entity) {
                return Err(err);
            }
        }
        Ok(())
    }

    async fn stash_upload(&self, id: &str, name: &str, content: Vec<u8>) -> Result<String> {
        let mut inner = self.lock();
        if inner.rejected_names.contains(name) {
            return Err(Error::Remote(format!("upload of {} rejected", name)));
        }

        if let Some(entry) = inner.stash.iter_mut().find(|e| e.id == id) {
            if !entry.name.iter().any(|n| n == name) {
                entry.name.push(name.to_string());
            }
        } else {
            inner.stash.push(StashEntry {
                id: id.to_string(),
                name: vec![name.to_string()],
                length: content.len() as u64,
                executable: false,
                status: StashStatus::Present,
                timestamp: Some(Utc::now()),
            });
        }
        debug!("Stashed {} as {}", name, id);
        Ok(id.to_string())
    }

    async fn add_build(&self, id: &str, information: &BuildInformation) -> Result<UploadResult> {
        let mut inner = self.lock();
        if !inner.stash.iter().any(|e| e.id == id) {
            return Err(Error::Remote(format!("no stash entry {}", id)));
        }

        let key = (id.to_string(), information.clone());
        if let Some(set_id) = inner.sets.get(&key) {
            return Ok(UploadResult {
                set_id: set_id.clone(),
                merged: true,
            });
        }

        let artifact_id = inner.allocate("a");
        let set_id = inner.allocate("p");
        inner.artifacts.push(Artifact {
            id: artifact_id.clone(),
            builder: information.builder.clone(),
            information: information.clone(),
        });
        inner.packages.push(Package {
            id: set_id.clone(),
            parent: String::new(),
            artifacts: vec![artifact_id],
            information: information.clone(),
        });
        inner.sets.insert(key, set_id.clone());
        Ok(UploadResult {
            set_id,
            merged: false,
        })
    }

    async fn update_track(&self, update: &TrackUpdate) -> Result<Track> {
        let mut inner = self.lock();
        inner.update_calls += 1;

        if update.id.is_empty() {
            let id = inner.allocate("t");
            let track = Track {
                id,
                name: update.name.clone().unwrap_or_default(),
                description: update.description.clone().unwrap_or_default(),
                head: update.head.clone().unwrap_or_default(),
            };
            inner.tracks.push(track.clone());
            return Ok(track);
        }

        let track = inner
            .tracks
            .iter_mut()
            .find(|t| t.id == update.id)
            .ok_or_else(|| Error::Remote(format!("no track with id {}", update.id)))?;
        if let Some(name) = &update.name {
            track.name = name.clone();
        }
        if let Some(description) = &update.description {
            track.description = description.clone();
        }
        if let Some(head) = &update.head {
            track.head = head.clone();
        }
        Ok(track.clone())
    }
}
