//! Recording adapter for the `EntityProvider` port.

use std::sync::Arc;

use super::record_result;
use crate::adapters::PathInput;
use crate::cassette::session::SharedRecorder;
use crate::entity::Entity;
use crate::ports::{EntityProvider, PortFuture};

/// Records entity trees while delegating to an inner provider.
pub struct RecordingEntityProvider {
    inner: Box<dyn EntityProvider>,
    recorder: SharedRecorder,
}

impl RecordingEntityProvider {
    /// Creates a new recording provider wrapping the given implementation.
    pub fn new(inner: Box<dyn EntityProvider>, recorder: SharedRecorder) -> Self {
        Self { inner, recorder }
    }
}

impl EntityProvider for RecordingEntityProvider {
    fn entities(&self, path: &str) -> PortFuture<'_, Vec<Entity>> {
        let path = path.to_string();
        let recorder = Arc::clone(&self.recorder);
        Box::pin(async move {
            let result = self.inner.entities(&path).await;
            record_result(&recorder, "entities", "entities", &PathInput { path: &path }, &result);
            result
        })
    }
}
