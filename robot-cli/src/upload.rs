//! Upload client
//!
//! Every file is stashed under its content hash first; the session's
//! [`Uploader`] then decides what the stashed content becomes. A failed file
//! never stops the batch.

use crate::inference::{infer_build_information, BuildOverrides, Environment};
use crate::store::RemoteStore;
use async_trait::async_trait;
use robot_common::models::BuildInformation;
use robot_common::{Error, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// What happened to one successfully uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Content stored in the stash only
    Stashed { id: String },
    /// Registered as a build that started a new set
    NewSet { set_id: String },
    /// Registered as a build that joined an existing set
    Merged { set_id: String },
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::Stashed { id } => write!(f, "stashed {}", id),
            UploadOutcome::NewSet { set_id } => write!(f, "new build set {}", set_id),
            UploadOutcome::Merged { set_id } => write!(f, "merged with build set {}", set_id),
        }
    }
}

/// Per-file result of a batch
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: Result<UploadOutcome>,
}

/// Upload session behaviour, applied to each stashed file in turn
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn process(&self, store: &dyn RemoteStore, stash_id: &str) -> Result<UploadOutcome>;
}

/// Leaves content in the stash
#[derive(Debug, Default)]
pub struct StashUploader;

#[async_trait]
impl Uploader for StashUploader {
    async fn process(&self, _store: &dyn RemoteStore, stash_id: &str) -> Result<UploadOutcome> {
        Ok(UploadOutcome::Stashed {
            id: stash_id.to_string(),
        })
    }
}

/// Registers each file as a build with session-wide build information
#[derive(Debug, Clone)]
pub struct BuildUploader {
    information: BuildInformation,
}

impl BuildUploader {
    /// Infer build information once for the whole session
    pub fn prepare(overrides: &BuildOverrides, env: &Environment) -> Self {
        let information = infer_build_information(overrides, env);
        debug!("Build information: {:?}", information);
        Self { information }
    }

    pub fn with_information(information: BuildInformation) -> Self {
        Self { information }
    }

    pub fn information(&self) -> &BuildInformation {
        &self.information
    }
}

#[async_trait]
impl Uploader for BuildUploader {
    async fn process(&self, store: &dyn RemoteStore, stash_id: &str) -> Result<UploadOutcome> {
        let result = store.add_build(stash_id, &self.information).await?;
        Ok(if result.merged {
            UploadOutcome::Merged {
                set_id: result.set_id,
            }
        } else {
            UploadOutcome::NewSet {
                set_id: result.set_id,
            }
        })
    }
}

/// Read a file and compute its content id (lowercase hex SHA-256)
pub async fn read_content(path: &Path) -> Result<(String, Vec<u8>)> {
    let content = tokio::fs::read(path).await?;
    // Hashing is CPU-bound; keep it off the async workers
    tokio::task::spawn_blocking(move || {
        let id = format!("{:x}", Sha256::digest(&content));
        (id, content)
    })
    .await
    .map_err(|e| Error::Internal(format!("hash task failed: {}", e)))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Stash one file, returning its content id
pub async fn stash_file(store: &dyn RemoteStore, path: &Path) -> Result<String> {
    let (id, content) = read_content(path).await?;
    debug!("Uploading {} ({} bytes) as {}", path.display(), content.len(), id);
    store.stash_upload(&id, &display_name(path), content).await
}

async fn upload_file(store: &dyn RemoteStore, uploader: &dyn Uploader, path: &Path) -> Result<UploadOutcome> {
    let id = stash_file(store, path).await?;
    uploader.process(store, &id).await
}

/// Upload every path in order, independently of one another
pub async fn upload_files(store: &dyn RemoteStore, uploader: &dyn Uploader, paths: &[PathBuf]) -> Vec<FileReport> {
    let mut reports = Vec::with_capacity(paths.len());
    for path in paths {
        let result = upload_file(store, uploader, path).await;
        match &result {
            Ok(outcome) => debug!("{}: {}", path.display(), outcome),
            Err(e) => error!("Failed to upload {}: {}", path.display(), e),
        }
        reports.push(FileReport {
            path: path.clone(),
            result,
        });
    }
    reports
}
