//! Recording session managing per-port cassette recorders.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::warn;

use super::recorder::CassetteRecorder;

/// Recorder shared between a recording adapter and its session.
pub type SharedRecorder = Arc<Mutex<CassetteRecorder>>;

/// Manages per-port `CassetteRecorder` instances for a recording session.
///
/// Each port gets its own recorder writing to a separate cassette file.
/// All cassettes are stored in a timestamped directory, readable back with
/// [`CassetteConfig::from_dir`](super::config::CassetteConfig::from_dir).
pub struct RecordingSession {
    /// Recorder for LLM interactions.
    pub llm: SharedRecorder,
    /// Recorder for filesystem interactions.
    pub fs: SharedRecorder,
    /// Recorder for git interactions.
    pub git: SharedRecorder,
    /// Recorder for entity-discovery interactions.
    pub entities: SharedRecorder,
    /// Recorder for relationship-discovery interactions.
    pub calls: SharedRecorder,
    /// Output directory containing all cassette files.
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Create a new recording session in `<base>/<timestamp>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The cassette directory already exists
    /// - The directory cannot be created
    pub fn new_in(base: &Path) -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let output_dir = base.join(&timestamp);

        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }

        std::fs::create_dir_all(&output_dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let commit = get_commit_hash();

        let make_recorder = |port: &str| -> SharedRecorder {
            let path = output_dir.join(format!("{port}.cassette.yaml"));
            let name = format!("{timestamp}-{port}");
            Arc::new(Mutex::new(CassetteRecorder::new(path, &name, &commit)))
        };

        Ok(Self {
            llm: make_recorder("llm"),
            fs: make_recorder("fs"),
            git: make_recorder("git"),
            entities: make_recorder("entities"),
            calls: make_recorder("calls"),
            output_dir,
        })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Finish all recorders and write cassette files to disk.
    ///
    /// Consumes the session and writes each port's cassette file. Every
    /// recording adapter must have been dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if any cassette file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        fn finish_one(arc: SharedRecorder, port: &str) -> Result<(), String> {
            let recorder = Arc::try_unwrap(arc)
                .map_err(|_| format!("Recording adapter for {port} still has references"))?
                .into_inner()
                .map_err(|e| format!("Recorder lock for {port} poisoned: {e}"))?;
            recorder.finish().map_err(|e| format!("Failed to write {port} cassette: {e}"))?;
            Ok(())
        }

        finish_one(self.llm, "llm")?;
        finish_one(self.fs, "fs")?;
        finish_one(self.git, "git")?;
        finish_one(self.entities, "entities")?;
        finish_one(self.calls, "calls")?;

        Ok(self.output_dir)
    }
}

/// Get the current git commit hash, or "unknown" with a warning if unavailable.
fn get_commit_hash() -> String {
    let hash = std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string());

    hash.unwrap_or_else(|| {
        warn!("could not get git commit hash, using 'unknown'");
        "unknown".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::config::{CassetteConfig, PORTS};
    use serde_json::json;

    #[test]
    fn session_writes_one_cassette_per_port() {
        let base = std::env::temp_dir().join("archscope_session_test");
        let session = RecordingSession::new_in(&base).unwrap();
        session.git.lock().unwrap().record("git", "list_files", json!({"path": "."}), json!({"ok": []}));

        let dir = session.finish().unwrap();

        for port in PORTS {
            assert!(dir.join(format!("{port}.cassette.yaml")).exists(), "missing {port} cassette");
        }
        let mut replayers = CassetteConfig::from_dir(&dir).load_all().unwrap();
        let git = replayers.git.as_mut().unwrap();
        assert_eq!(git.next_interaction("git", "list_files").output, json!({"ok": []}));

        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn finishing_with_live_adapters_fails() {
        let base = std::env::temp_dir().join("archscope_session_busy_test");
        let session = RecordingSession::new_in(&base).unwrap();
        let _held = Arc::clone(&session.llm);

        let err = session.finish().unwrap_err();
        assert!(err.contains("still has references"));

        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn get_commit_hash_returns_string() {
        assert!(!get_commit_hash().is_empty());
    }
}
