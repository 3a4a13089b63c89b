//! Build metadata inference
//!
//! Fills a [`BuildInformation`] record from explicit flags, the working
//! copy, and the host. Explicit flags always win. Nothing here fails: a
//! lookup that errors is logged as a warning and its field stays as it was.

use crate::vcs::{GitRepo, VersionControl};
use clap::Args;
use robot_common::models::{BuildInformation, BuildType, HostInfo};
use std::path::Path;
use tracing::{info, warn};

/// Build metadata supplied on the command line
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOverrides {
    /// Free-form tag for the build
    #[arg(long)]
    pub tag: Option<String>,

    /// Change identifier (defaults to the current commit)
    #[arg(long)]
    pub cl: Option<String>,

    /// Branch name (defaults to the current branch)
    #[arg(long)]
    pub branch: Option<String>,

    /// Description (defaults to the current commit subject)
    #[arg(long)]
    pub description: Option<String>,

    /// Uploader name (defaults to the OS user)
    #[arg(long)]
    pub uploader: Option<String>,
}

/// Everything inference may consult besides the flags
pub struct Environment {
    pub vcs: Option<Box<dyn VersionControl>>,
    pub user: Option<String>,
    pub host: HostInfo,
}

impl Environment {
    /// Inspect the working copy around `dir`, the OS user, and the host
    pub fn detect(dir: &Path) -> Self {
        let vcs: Option<Box<dyn VersionControl>> = match GitRepo::open(dir) {
            Ok(repo) => {
                info!("Detected git repository at {}", repo.root().display());
                Some(Box::new(repo))
            }
            Err(e) => {
                warn!("No version control detected: {}", e);
                None
            }
        };
        Self {
            vcs,
            user: current_user(),
            host: detect_host(),
        }
    }
}

/// Login name of the current OS user
pub fn current_user() -> Option<String> {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Describe the machine doing the upload
pub fn detect_host() -> HostInfo {
    HostInfo {
        name: detect_hostname(),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}

fn detect_hostname() -> String {
    if let Some(name) = ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
    {
        return name.trim().to_string();
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(name) = std::fs::read_to_string("/etc/hostname") {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }
    }

    if let Ok(output) = std::process::Command::new("hostname").output() {
        if let Ok(name) = String::from_utf8(output.stdout) {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }
    }

    "unknown".to_string()
}

fn given(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Derive build information for an upload session
///
/// - Without version control the build is a build-bot build and only the
///   flags contribute.
/// - With version control the build is a user build; the current change
///   fills `cl` and `description` when those flags are absent.
/// - A working copy with local modifications makes it a local build.
/// - The current branch fills `branch` when that flag is absent.
/// - The OS user fills `uploader` when that flag is absent.
pub fn infer_build_information(overrides: &BuildOverrides, env: &Environment) -> BuildInformation {
    let mut info = BuildInformation {
        build_type: BuildType::BuildBot,
        branch: given(&overrides.branch).unwrap_or_default(),
        cl: given(&overrides.cl).unwrap_or_default(),
        tag: given(&overrides.tag).unwrap_or_default(),
        description: given(&overrides.description).unwrap_or_default(),
        builder: env.host.clone(),
        uploader: given(&overrides.uploader).unwrap_or_default(),
    };

    if let Some(vcs) = &env.vcs {
        info.build_type = BuildType::User;
        apply_version_control(&mut info, vcs.as_ref());
    }

    if info.uploader.is_empty() {
        match &env.user {
            Some(user) => {
                info!("Detected uploader {}", user);
                info.uploader = user.clone();
            }
            None => warn!("Could not determine the current user; uploader left empty"),
        }
    }

    info
}

fn apply_version_control(info: &mut BuildInformation, vcs: &dyn VersionControl) {
    if info.cl.is_empty() || info.description.is_empty() {
        match vcs.current_change() {
            Ok(change) => {
                if info.cl.is_empty() {
                    info!("Detected change {}", change.sha);
                    info.cl = change.sha;
                }
                if info.description.is_empty() {
                    info!("Detected description {:?}", change.subject);
                    info.description = change.subject;
                }
            }
            Err(e) => warn!("Could not read the current change: {}", e),
        }
    }

    match vcs.is_clean() {
        Ok(true) => {}
        Ok(false) => {
            warn!("Working copy has local modifications; marking build as local");
            info.build_type = BuildType::Local;
        }
        Err(e) => warn!("Could not read working copy status: {}", e),
    }

    if info.branch.is_empty() {
        match vcs.current_branch() {
            Ok(branch) => {
                info!("Detected branch {}", branch);
                info.branch = branch;
            }
            Err(e) => warn!("Could not determine the current branch: {}", e),
        }
    }
}
