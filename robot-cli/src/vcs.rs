//! Version control probing
//!
//! Only git is supported. Every query shells out to `git -C <root>`, so a
//! missing binary or a directory outside any repository shows up as an
//! error from [`GitRepo::open`].

use robot_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Most recent change of the working copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Full commit hash
    pub sha: String,
    /// First line of the commit message
    pub subject: String,
}

/// Questions build inference asks of a working copy
pub trait VersionControl: Send + Sync {
    fn current_change(&self) -> Result<Change>;
    fn is_clean(&self) -> Result<bool>;
    fn current_branch(&self) -> Result<String>;
}

/// Git working copy rooted at its top-level directory
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// Locate the repository containing `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        let root = run_git(dir, &["rev-parse", "--show-toplevel"])?;
        Ok(Self {
            root: PathBuf::from(root.trim()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .map_err(|e| Error::VersionControl(format!("failed to run git: {}", e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::VersionControl(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }
    String::from_utf8(output.stdout)
        .map_err(|e| Error::VersionControl(format!("git {} output is not UTF-8: {}", args.join(" "), e)))
}

impl VersionControl for GitRepo {
    fn current_change(&self) -> Result<Change> {
        let out = run_git(&self.root, &["log", "-1", "--format=%H%x00%s"])?;
        let (sha, subject) = out
            .trim_end_matches('\n')
            .split_once('\0')
            .ok_or_else(|| Error::VersionControl("repository has no commits".to_string()))?;
        Ok(Change {
            sha: sha.to_string(),
            subject: subject.to_string(),
        })
    }

    fn is_clean(&self) -> Result<bool> {
        let out = run_git(&self.root, &["status", "--porcelain"])?;
        Ok(out.trim().is_empty())
    }

    fn current_branch(&self) -> Result<String> {
        let branch = run_git(&self.root, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        let branch = branch.trim();
        if branch == "HEAD" {
            return Err(Error::VersionControl("HEAD is detached".to_string()));
        }
        Ok(branch.to_string())
    }
}
