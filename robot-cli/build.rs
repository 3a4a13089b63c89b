//! Build script for robot-cli
//!
//! Embeds build identification for the startup log line:
//! - `GIT_HASH`: short commit hash of the source tree, or "unknown"
//! - `BUILD_TIMESTAMP`: RFC 3339 local time of the build
//! - `BUILD_PROFILE`: cargo profile (debug/release)

use std::process::Command;

/// Short commit hash, when built from a git checkout with git on PATH
fn git_short_hash() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "--short=8", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string()).filter(|h| !h.is_empty())
}

fn emit(name: &str, value: &str) {
    println!("cargo:rustc-env={}={}", name, value);
}

fn main() {
    emit("GIT_HASH", &git_short_hash().unwrap_or_else(|| "unknown".to_string()));
    emit(
        "BUILD_TIMESTAMP",
        &chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
    );
    emit("BUILD_PROFILE", &std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string()));
    // No rerun-if-changed: the script runs on every build so the hash stays current
}
