//! Replaying adapter for the `EntityProvider` port.

use super::{matching_output, replay_result, SharedReplayer};
use crate::adapters::PathInput;
use crate::entity::Entity;
use crate::ports::{EntityProvider, PortFuture};

/// Serves recorded entity trees, matched by file path.
pub struct ReplayingEntityProvider {
    replayer: Option<SharedReplayer>,
}

impl ReplayingEntityProvider {
    /// Creates a replaying provider backed by the given replayer.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer: Some(replayer) }
    }

    /// Creates a replaying provider with no cassette. Panics when called.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None }
    }
}

impl EntityProvider for ReplayingEntityProvider {
    fn entities(&self, path: &str) -> PortFuture<'_, Vec<Entity>> {
        let output = matching_output(self.replayer.as_ref(), "entities", "entities", &PathInput { path });
        Box::pin(async move { replay_result(output) })
    }
}
