//! Service context bundling all port trait objects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::live::{LiveCallProvider, LiveEntityProvider, LiveFileSystem, LiveGitRepo, LiveLlmClient};
use crate::adapters::recording::{
    RecordingCallProvider, RecordingEntityProvider, RecordingFileSystem, RecordingGitRepo, RecordingLlmClient,
};
use crate::adapters::replaying::{
    ReplayingCallProvider, ReplayingEntityProvider, ReplayingFileSystem, ReplayingGitRepo, ReplayingLlmClient,
    SharedReplayer,
};
use crate::cassette::config::CassetteConfig;
use crate::cassette::session::RecordingSession;
use crate::config::EngineConfig;
use crate::drill::fallback::DrillContext;
use crate::drill::Orchestrator;
use crate::ports::{CallProvider, EntityProvider, FileSystem, GitRepo, LlmClient};

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, replaying, recording).
pub struct ServiceContext {
    /// Filesystem for source previews.
    pub fs: Box<dyn FileSystem>,
    /// File listing of the project.
    pub git: Box<dyn GitRepo>,
    /// Entity discovery.
    pub entities: Box<dyn EntityProvider>,
    /// Relationship discovery.
    pub calls: Box<dyn CallProvider>,
    /// Inference collaborator; `None` when no model is configured.
    pub llm: Option<Box<dyn LlmClient>>,
}

impl ServiceContext {
    /// Creates a live context for the project at `root`.
    ///
    /// The inference collaborator is present only when `config` carries an
    /// API key.
    #[must_use]
    pub fn live(root: &Path, config: &EngineConfig) -> Self {
        Self {
            fs: Box::new(LiveFileSystem),
            git: Box::new(LiveGitRepo),
            entities: Box::new(LiveEntityProvider::new(root)),
            calls: Box::new(LiveCallProvider::new(root)),
            llm: config
                .api_key
                .as_ref()
                .map(|key| Box::new(LiveLlmClient::new(key.clone())) as Box<dyn LlmClient>),
        }
    }

    /// Creates a live context whose interactions are recorded to per-port
    /// cassettes under `<dir>/<timestamp>/`.
    ///
    /// Drop the context before calling [`RecordingSession::finish`].
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette directory cannot be created.
    pub fn recording_at(
        dir: impl Into<PathBuf>,
        root: &Path,
        config: &EngineConfig,
    ) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new_in(&dir.into())?;
        let live = Self::live(root, config);
        let ctx = Self {
            fs: Box::new(RecordingFileSystem::new(live.fs, Arc::clone(&session.fs))),
            git: Box::new(RecordingGitRepo::new(live.git, Arc::clone(&session.git))),
            entities: Box::new(RecordingEntityProvider::new(live.entities, Arc::clone(&session.entities))),
            calls: Box::new(RecordingCallProvider::new(live.calls, Arc::clone(&session.calls))),
            llm: live.llm.map(|inner| {
                Box::new(RecordingLlmClient::new(inner, Arc::clone(&session.llm))) as Box<dyn LlmClient>
            }),
        };
        Ok((ctx, session))
    }

    /// Creates a replaying context from a monolithic cassette file.
    ///
    /// All ports share one replayer; each port/method pair is dispatched to
    /// its own interaction stream. The inference collaborator is present
    /// only if the cassette recorded completions.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let replayer = CassetteConfig::load_monolithic(path)?;
        let has_llm = replayer.has_port("llm");
        let shared: SharedReplayer = Arc::new(Mutex::new(replayer));
        Ok(Self {
            fs: Box::new(ReplayingFileSystem::new(Arc::clone(&shared))),
            git: Box::new(ReplayingGitRepo::new(Arc::clone(&shared))),
            entities: Box::new(ReplayingEntityProvider::new(Arc::clone(&shared))),
            calls: Box::new(ReplayingCallProvider::new(Arc::clone(&shared))),
            llm: has_llm.then(|| Box::new(ReplayingLlmClient::new(shared)) as Box<dyn LlmClient>),
        })
    }

    /// Creates a replaying context from per-port cassette files.
    ///
    /// Ports without a configured cassette panic with a clear message when
    /// called, except the inference collaborator, which is then absent (as it
    /// is when its cassette is empty).
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;
        let share = |replayer| Arc::new(Mutex::new(replayer));

        Ok(Self {
            fs: Box::new(replayers.fs.map_or_else(ReplayingFileSystem::unconfigured, |r| {
                ReplayingFileSystem::new(share(r))
            })),
            git: Box::new(
                replayers.git.map_or_else(ReplayingGitRepo::unconfigured, |r| ReplayingGitRepo::new(share(r))),
            ),
            entities: Box::new(replayers.entities.map_or_else(ReplayingEntityProvider::unconfigured, |r| {
                ReplayingEntityProvider::new(share(r))
            })),
            calls: Box::new(replayers.calls.map_or_else(ReplayingCallProvider::unconfigured, |r| {
                ReplayingCallProvider::new(share(r))
            })),
            llm: replayers
                .llm
                .filter(|r| !r.is_empty())
                .map(|r| Box::new(ReplayingLlmClient::new(share(r))) as Box<dyn LlmClient>),
        })
    }

    /// The inference collaborator, if any.
    #[must_use]
    pub fn llm(&self) -> Option<&dyn LlmClient> {
        self.llm.as_deref()
    }

    /// Collaborators for resolving drills of `orchestrator`.
    #[must_use]
    pub fn drill_context<'a>(&'a self, orchestrator: &'a Orchestrator, config: &'a EngineConfig) -> DrillContext<'a> {
        orchestrator.context(self.entities.as_ref(), self.calls.as_ref(), self.llm(), config)
    }
}
