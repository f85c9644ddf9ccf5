//! Replaying adapters that replay recorded interactions.
//!
//! Ports called one after another (`fs`, `git`, `llm`) are served in recorded
//! order. Ports the engine queries concurrently (`entities`, `calls`) are
//! served by matching the recorded input.

pub mod calls;
pub mod entities;
pub mod filesystem;
pub mod git;
pub mod llm;

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cassette::format::Outcome;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::PortError;

pub use calls::ReplayingCallProvider;
pub use entities::ReplayingEntityProvider;
pub use filesystem::ReplayingFileSystem;
pub use git::ReplayingGitRepo;
pub use llm::ReplayingLlmClient;

/// Replayer shared by every adapter reading the same cassette.
pub type SharedReplayer = Arc<Mutex<CassetteReplayer>>;

/// Output of the next recorded `port::method` interaction.
///
/// # Panics
///
/// Panics if no cassette is configured for the port, or it is exhausted.
pub(crate) fn next_output(replayer: Option<&SharedReplayer>, port: &str, method: &str) -> Value {
    let replayer = replayer.unwrap_or_else(|| {
        panic!("Replay error: port {port:?} called (method {method:?}) but no cassette is configured for it")
    });
    let mut guard = replayer.lock().expect("replayer lock poisoned");
    guard.next_interaction(port, method).output.clone()
}

/// Output of the first unserved `port::method` interaction recorded with `input`.
///
/// # Panics
///
/// Panics if no cassette is configured for the port, or nothing matches.
pub(crate) fn matching_output<I: Serialize>(
    replayer: Option<&SharedReplayer>,
    port: &str,
    method: &str,
    input: &I,
) -> Value {
    let replayer = replayer.unwrap_or_else(|| {
        panic!("Replay error: port {port:?} called (method {method:?}) but no cassette is configured for it")
    });
    let input = serde_json::to_value(input).expect("failed to serialize replay input");
    let mut guard = replayer.lock().expect("replayer lock poisoned");
    guard.next_matching(port, method, &input).output.clone()
}

/// Decodes a recorded `{"ok": v}` / `{"err": msg}` output.
///
/// # Errors
///
/// Returns the recorded error message, or a decoding error when the
/// recorded value does not fit `T`.
pub(crate) fn replay_result<T: DeserializeOwned>(output: Value) -> Result<T, PortError> {
    match Outcome::from_output(output) {
        Outcome::Ok(value) => {
            serde_json::from_value(value).map_err(|e| format!("failed to decode recorded output: {e}").into())
        }
        Outcome::Err(message) => Err(message.into()),
    }
}
