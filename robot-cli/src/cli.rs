//! Command-line surface
//!
//! One clap tree; each verb receives its own option struct explicitly.

use crate::inference::{BuildOverrides, Environment};
use crate::resolver::{set_track, TrackFields};
use crate::search::run_search;
use crate::store::{RemoteClient, RemoteStore};
use crate::upload::{upload_files, BuildUploader, StashUploader, Uploader};
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use robot_common::config::ClientConfig;
use robot_common::models::Domain;
use robot_common::text::to_text;
use std::io::Write;
use std::path::PathBuf;

/// Build robot client
#[derive(Parser, Debug)]
#[command(name = "robot", version, about = "Upload builds, search the build store and manage tracks")]
pub struct Cli {
    /// Build server URL (overrides ROBOT_SERVER and the config file)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload files to the server
    Upload {
        #[command(subcommand)]
        target: UploadTarget,
    },
    /// Search the server and print matching entities
    Search {
        #[command(subcommand)]
        target: SearchTarget,
    },
    /// Modify entities on the server
    Set {
        #[command(subcommand)]
        target: SetTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum UploadTarget {
    /// Upload build outputs, inferring build information
    Build(BuildUploadOptions),
    /// Store files in the stash only
    Stash(StashUploadOptions),
}

#[derive(Args, Debug, Clone)]
pub struct BuildUploadOptions {
    /// Files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub overrides: BuildOverrides,
}

#[derive(Args, Debug, Clone)]
pub struct StashUploadOptions {
    /// Files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum SearchTarget {
    /// Search build artifacts
    Artifact(SearchOptions),
    /// Search build sets
    Package(SearchOptions),
    /// Search tracks
    Track(SearchOptions),
    /// Search stashed content
    Stash(SearchOptions),
}

impl SearchTarget {
    pub fn domain(&self) -> Domain {
        match self {
            SearchTarget::Artifact(_) => Domain::Artifact,
            SearchTarget::Package(_) => Domain::Package,
            SearchTarget::Track(_) => Domain::Track,
            SearchTarget::Stash(_) => Domain::Stash,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        match self {
            SearchTarget::Artifact(o) | SearchTarget::Package(o) | SearchTarget::Track(o) | SearchTarget::Stash(o) => o,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct SearchOptions {
    /// Query text; words are joined with spaces, empty matches everything
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub query: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum SetTarget {
    /// Create or update a track
    Track(TrackSetOptions),
}

#[derive(Args, Debug, Clone, Default)]
pub struct TrackSetOptions {
    /// Id or name of the track to update; omit to create one
    pub target: Option<String>,

    /// New track name
    #[arg(long)]
    pub name: Option<String>,

    /// New track description
    #[arg(long)]
    pub description: Option<String>,

    /// Build set to make the track head
    #[arg(long)]
    pub package: Option<String>,
}

impl TrackSetOptions {
    pub fn fields(&self) -> TrackFields {
        TrackFields {
            name: self.name.clone(),
            description: self.description.clone(),
            head: self.package.clone(),
        }
    }
}

/// Upload `files` and print one outcome line per file
///
/// Every file is attempted; the error lists how many failed.
pub async fn upload_verb(
    store: &dyn RemoteStore,
    uploader: &dyn Uploader,
    files: &[PathBuf],
    out: &mut (dyn Write + Send),
) -> Result<()> {
    let reports = upload_files(store, uploader, files).await;
    let mut failed = 0;
    for report in &reports {
        match &report.result {
            Ok(outcome) => writeln!(out, "{}: {}", report.path.display(), outcome)?,
            Err(_) => failed += 1,
        }
    }
    if failed > 0 {
        bail!("{} of {} uploads failed", failed, reports.len());
    }
    Ok(())
}

/// Update (or create) a track and print the stored result
pub async fn set_track_verb(
    store: &dyn RemoteStore,
    options: &TrackSetOptions,
    out: &mut (dyn Write + Send),
) -> Result<()> {
    let track = set_track(store, options.target.as_deref(), &options.fields()).await?;
    out.write_all(to_text(&track)?.as_bytes())?;
    Ok(())
}

/// Execute one parsed command against the configured server
pub async fn run(command: Command, config: &ClientConfig) -> Result<()> {
    let mut out = std::io::stdout();
    match command {
        Command::Upload { target } => {
            let (uploader, files): (Box<dyn Uploader>, &[PathBuf]) = match &target {
                UploadTarget::Build(options) => {
                    let env = Environment::detect(&std::env::current_dir()?);
                    let uploader: Box<dyn Uploader> = Box::new(BuildUploader::prepare(&options.overrides, &env));
                    (uploader, options.files.as_slice())
                }
                UploadTarget::Stash(options) => {
                    let uploader: Box<dyn Uploader> = Box::new(StashUploader);
                    (uploader, options.files.as_slice())
                }
            };
            let store = RemoteClient::connect(config)?;
            upload_verb(&store, uploader.as_ref(), files, &mut out).await
        }
        Command::Search { target } => {
            let store = RemoteClient::connect(config)?;
            run_search(&store, target.domain(), &target.options().query, &mut out).await?;
            Ok(())
        }
        Command::Set {
            target: SetTarget::Track(options),
        } => {
            let store = RemoteClient::connect(config)?;
            set_track_verb(&store, &options, &mut out).await
        }
    }
}
