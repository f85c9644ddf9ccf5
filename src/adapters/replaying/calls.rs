//! Replaying adapter for the `CallProvider` port.

use super::{matching_output, replay_result, SharedReplayer};
use crate::entity::{CallTarget, CallableEntity};
use crate::ports::{CallProvider, PortFuture};

/// Serves recorded outgoing calls, matched by the queried entity.
pub struct ReplayingCallProvider {
    replayer: Option<SharedReplayer>,
}

impl ReplayingCallProvider {
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

impl CallProvider for ReplayingCallProvider {
    fn outgoing_calls(&self, entity: &CallableEntity) -> PortFuture<'_, Vec<CallTarget>> {
        let output = matching_output(self.replayer.as_ref(), "calls", "outgoing_calls", entity);
        Box::pin(async move { replay_result(output) })
    }
}
