//! Cassette configuration for composable per-port replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Names of the recorded ports, as used in cassette file names.
pub const PORTS: [&str; 5] = ["llm", "fs", "git", "entities", "calls"];

/// Per-port cassette file paths. Each port can optionally have its own
/// cassette file for replay. Ports without a cassette path panic if called
/// during replay, except `llm`, which is then treated as not configured.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Path to the LLM port cassette file.
    pub llm: Option<PathBuf>,
    /// Path to the filesystem port cassette file.
    pub fs: Option<PathBuf>,
    /// Path to the git port cassette file.
    pub git: Option<PathBuf>,
    /// Path to the entity-discovery port cassette file.
    pub entities: Option<PathBuf>,
    /// Path to the relationship-discovery port cassette file.
    pub calls: Option<PathBuf>,
}

/// Per-port replayers, each with its own interaction stream.
pub struct PortReplayers {
    /// Replayer for the LLM port.
    pub llm: Option<CassetteReplayer>,
    /// Replayer for the filesystem port.
    pub fs: Option<CassetteReplayer>,
    /// Replayer for the git port.
    pub git: Option<CassetteReplayer>,
    /// Replayer for the entity-discovery port.
    pub entities: Option<CassetteReplayer>,
    /// Replayer for the relationship-discovery port.
    pub calls: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Returns a config where all port paths are `None`.
    #[must_use]
    pub fn panic_on_unspecified() -> Self {
        Self::default()
    }

    /// Points every port at `<dir>/<port>.cassette.yaml` when that file exists,
    /// the layout a recording session writes.
    #[must_use]
    pub fn from_dir(dir: &Path) -> Self {
        let existing = |port: &str| {
            let path = dir.join(format!("{port}.cassette.yaml"));
            path.exists().then_some(path)
        };
        Self {
            llm: existing("llm"),
            fs: existing("fs"),
            git: existing("git"),
            entities: existing("entities"),
            calls: existing("calls"),
        }
    }

    /// Load a monolithic cassette file and create a single replayer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_monolithic(path: &Path) -> Result<CassetteReplayer, String> {
        Cassette::read(path).map(|cassette| CassetteReplayer::new(&cassette))
    }

    /// Load all configured per-port cassette files and create replayers.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        let load = |path: &Option<PathBuf>| path.as_deref().map(Self::load_monolithic).transpose();
        Ok(PortReplayers {
            llm: load(&self.llm)?,
            fs: load(&self.fs)?,
            git: load(&self.git)?,
            entities: load(&self.entities)?,
            calls: load(&self.calls)?,
        })
    }
}
