//! Accumulates port interactions and writes them out as one cassette.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use super::format::{Cassette, Interaction, Outcome};

/// Collects the interactions of one recording and writes them on
/// [`finish`](Self::finish).
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    commit: String,
    interactions: Vec<Interaction>,
}

impl CassetteRecorder {
    /// A recorder that will write to `path`.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, commit: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), commit: commit.into(), interactions: Vec::new() }
    }

    /// Where the cassette will be written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Appends an interaction; its `seq` is its position in the cassette.
    pub fn record(&mut self, port: impl Into<String>, method: impl Into<String>, input: Value, output: Value) {
        self.interactions.push(Interaction {
            seq: self.interactions.len() as u64,
            port: port.into(),
            method: method.into(),
            input,
            output,
        });
    }

    /// Appends a fallible call under the [`Outcome`] convention.
    ///
    /// # Errors
    ///
    /// Returns the serialization error when the input or ok value cannot be
    /// encoded; nothing is recorded then.
    pub fn record_outcome<I, T, E>(
        &mut self,
        port: &str,
        method: &str,
        input: &I,
        result: &Result<T, E>,
    ) -> serde_json::Result<()>
    where
        I: Serialize,
        T: Serialize,
        E: std::fmt::Display,
    {
        let input = serde_json::to_value(input)?;
        let outcome = Outcome::capture(result)?;
        self.record(port, method, input, outcome.into_output());
        Ok(())
    }

    /// Writes the cassette to disk and returns its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, std::io::Error> {
        let cassette = Cassette {
            name: self.name,
            recorded_at: Utc::now(),
            commit: self.commit,
            interactions: self.interactions,
        };
        cassette.write(&self.path)?;
        Ok(self.path)
    }
}
