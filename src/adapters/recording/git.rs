//! Recording adapter for the `GitRepo` port.

use std::path::Path;

use super::record_result;
use crate::adapters::PathInput;
use crate::cassette::session::SharedRecorder;
use crate::ports::{GitRepo, PortError};

/// Records git interactions while delegating to an inner implementation.
pub struct RecordingGitRepo {
    inner: Box<dyn GitRepo>,
    recorder: SharedRecorder,
}

impl RecordingGitRepo {
    /// Creates a new recording git repo wrapping the given implementation.
    pub fn new(inner: Box<dyn GitRepo>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl GitRepo for RecordingGitRepo {
    fn list_files(&self, path: &Path) -> Result<Vec<String>, PortError> {
        let result = self.inner.list_files(path);
        let input = PathInput { path: &path.display().to_string() };
        record_result(&self.recorder, "git", "list_files", &input, &result);
        result
    }
}
