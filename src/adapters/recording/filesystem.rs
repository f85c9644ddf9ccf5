//! Recording adapter for the `FileSystem` port.

use std::path::Path;

use super::{record_interaction, record_result};
use crate::adapters::PathInput;
use crate::cassette::session::SharedRecorder;
use crate::ports::{FileSystem, PortError};

/// Records filesystem interactions while delegating to an inner implementation.
pub struct RecordingFileSystem {
    inner: Box<dyn FileSystem>,
    recorder: SharedRecorder,
}

impl RecordingFileSystem {
    /// Creates a new recording filesystem wrapping the given implementation.
    pub fn new(inner: Box<dyn FileSystem>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl FileSystem for RecordingFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        let result = self.inner.read_to_string(path);
        let input = PathInput { path: &path.display().to_string() };
        record_result(&self.recorder, "fs", "read_to_string", &input, &result);
        result
    }

    fn exists(&self, path: &Path) -> bool {
        let result = self.inner.exists(path);
        let input = PathInput { path: &path.display().to_string() };
        record_interaction(&self.recorder, "fs", "exists", &input, &result);
        result
    }
}
