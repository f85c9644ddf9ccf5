//! Live git adapter using `git` CLI commands.

use std::path::Path;
use std::process::Command;

use ignore::WalkBuilder;
use tracing::debug;

use crate::ports::{GitRepo, PortError};

/// Live git adapter that shells out to the `git` CLI.
///
/// Outside a repository the directory tree is walked instead, honoring
/// ignore files.
pub struct LiveGitRepo;

impl GitRepo for LiveGitRepo {
    fn list_files(&self, path: &Path) -> Result<Vec<String>, PortError> {
        tracked_files(path)
    }
}

/// Files under `root`, relative to it and sorted.
pub(crate) fn tracked_files(root: &Path) -> Result<Vec<String>, PortError> {
    let output = Command::new("git").arg("-C").arg(root).args(["ls-files"]).output();
    match output {
        Ok(output) if output.status.success() => {
            let mut files: Vec<String> =
                String::from_utf8_lossy(&output.stdout).lines().map(String::from).collect();
            files.sort();
            Ok(files)
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(root = %root.display(), stderr = %stderr.trim(), "git ls-files failed, walking directory");
            walk(root)
        }
        Err(e) => {
            debug!(error = %e, "git unavailable, walking directory");
            walk(root)
        }
    }
}

fn walk(root: &Path) -> Result<Vec<String>, PortError> {
    if !root.is_dir() {
        return Err(format!("not a directory: {}", root.display()).into());
    }
    let mut files = Vec::new();
    for entry in WalkBuilder::new(root).require_git(false).follow_links(false).build() {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    files.sort();
    Ok(files)
}
