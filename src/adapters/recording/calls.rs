//! Recording adapter for the `CallProvider` port.

use std::sync::Arc;

use super::record_result;
use crate::cassette::session::SharedRecorder;
use crate::entity::{CallTarget, CallableEntity};
use crate::ports::{CallProvider, PortFuture};

/// Records outgoing-call queries while delegating to an inner provider.
///
/// The queried entity itself is the recorded input, so replay can match
/// queries issued in any order.
pub struct RecordingCallProvider {
    inner: Box<dyn CallProvider>,
    recorder: SharedRecorder,
}

impl RecordingCallProvider {
    /// Creates a new recording provider wrapping the given implementation.
    pub fn new(inner: Box<dyn CallProvider>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl CallProvider for RecordingCallProvider {
    fn outgoing_calls(&self, entity: &CallableEntity) -> PortFuture<'_, Vec<CallTarget>> {
        let entity = entity.clone();
        let recorder = Arc::clone(&self.recorder);
        Box::pin(async move {
            let result = self.inner.outgoing_calls(&entity).await;
            record_result(&recorder, "calls", "outgoing_calls", &entity, &result);
            result
        })
    }
}
