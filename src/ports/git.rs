//! Git repository port for listing the files of a project.

use std::path::Path;

use super::PortError;

/// Provides the list of files that make up a project.
///
/// Abstracting git access allows deterministic replay and testing
/// without requiring a real repository.
pub trait GitRepo: Send + Sync {
    /// Lists all tracked files under `path`, relative to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file list cannot be retrieved.
    fn list_files(&self, path: &Path) -> Result<Vec<String>, PortError>;
}
