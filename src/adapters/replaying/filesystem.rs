//! Replaying adapter for the `FileSystem` port.

use std::path::Path;

use super::{next_output, replay_result, SharedReplayer};
use crate::ports::{FileSystem, PortError};

/// Replays recorded filesystem operations from a cassette.
pub struct ReplayingFileSystem {
    replayer: Option<SharedReplayer>,
}

impl ReplayingFileSystem {
    /// Creates a replaying filesystem backed by the given replayer.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer: Some(replayer) }
    }

    /// Creates a replaying filesystem with no cassette. Panics when called.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }
}

impl FileSystem for ReplayingFileSystem {
    fn read_to_string(&self, _path: &Path) -> Result<String, PortError> {
        replay_result(next_output(self.replayer.as_ref(), "fs", "read_to_string"))
    }

    fn exists(&self, _path: &Path) -> bool {
        next_output(self.replayer.as_ref(), "fs", "exists")
            .as_bool()
            .expect("fs::exists: expected boolean output")
    }
}
