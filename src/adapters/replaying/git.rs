//! Replaying adapter for the `GitRepo` port.

use std::path::Path;

use super::{next_output, replay_result, SharedReplayer};
use crate::ports::{GitRepo, PortError};

/// Replays recorded git operations from a cassette.
pub struct ReplayingGitRepo {
    replayer: Option<SharedReplayer>,
}

impl ReplayingGitRepo {
    /// Creates a replaying git repo backed by the given replayer.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer: Some(replayer) }
    }

    /// Creates a replaying git repo with no cassette. Panics when called.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }
}

impl GitRepo for ReplayingGitRepo {
    fn list_files(&self, _path: &Path) -> Result<Vec<String>, PortError> {
        replay_result(next_output(self.replayer.as_ref(), "git", "list_files"))
    }
}
