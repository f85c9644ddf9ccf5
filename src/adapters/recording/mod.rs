//! Recording adapters that capture interactions to cassettes.

pub mod calls;
pub mod entities;
pub mod filesystem;
pub mod git;
pub mod llm;

use serde::Serialize;
use tracing::warn;

use crate::cassette::session::SharedRecorder;

pub use calls::RecordingCallProvider;
pub use entities::RecordingEntityProvider;
pub use filesystem::RecordingFileSystem;
pub use git::RecordingGitRepo;
pub use llm::RecordingLlmClient;

/// Record an interaction with a plain (infallible) return value.
pub(crate) fn record_interaction<I, O>(
    recorder: &SharedRecorder,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize,
    O: Serialize,
{
    match (serde_json::to_value(input), serde_json::to_value(output)) {
        (Ok(input), Ok(output)) => {
            recorder.lock().expect("recorder lock poisoned").record(port, method, input, output);
        }
        (Err(e), _) | (_, Err(e)) => warn!(port, method, error = %e, "interaction could not be recorded"),
    }
}

/// Record a fallible call as an [`Outcome`](crate::cassette::format::Outcome).
pub(crate) fn record_result<T, E, I>(
    recorder: &SharedRecorder,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let mut guard = recorder.lock().expect("recorder lock poisoned");
    if let Err(e) = guard.record_outcome(port, method, input, result) {
        warn!(port, method, error = %e, "interaction could not be recorded");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use crate::cassette::format::Cassette;
    use crate::cassette::recorder::CassetteRecorder;
    use crate::cassette::session::SharedRecorder;

    /// A recorder writing into `dir/<name>.cassette.yaml`.
    pub(crate) fn recorder_in(dir: &Path, name: &str) -> SharedRecorder {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(format!("{name}.cassette.yaml"));
        Arc::new(Mutex::new(CassetteRecorder::new(path, name, "abc")))
    }

    /// Finishes `recorder` and reads the cassette back.
    pub(crate) fn finish(recorder: SharedRecorder) -> Cassette {
        let recorder = Arc::try_unwrap(recorder).ok().unwrap().into_inner().unwrap();
        let path = recorder.finish().unwrap();
        Cassette::read(&path).unwrap()
    }
}
