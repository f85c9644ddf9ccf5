//! File → entity cache and its cancellable background warming.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use futures::future::join_all;
use tracing::{debug, info};

use crate::entity::{Entity, FileEntities};
use crate::ports::EntityProvider;

/// Whether background scanning is switched on. Polled between files.
#[derive(Debug)]
pub struct ScanMode(AtomicBool);

impl ScanMode {
    /// Creates the flag.
    #[must_use]
    pub fn new(on: bool) -> Self {
        Self(AtomicBool::new(on))
    }

    /// Current state.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Switches scanning on or off.
    pub fn set(&self, on: bool) {
        self.0.store(on, Ordering::SeqCst);
    }
}

impl Default for ScanMode {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Entity trees keyed by file path.
///
/// Only successful fetches are cached. A failed fetch counts as an empty
/// file for the request that made it.
#[derive(Debug, Default)]
pub struct EntityCache {
    files: Mutex<BTreeMap<String, Vec<Entity>>>,
}

impl EntityCache {
    /// Cached entities of `path`, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Vec<Entity>> {
        self.files.lock().expect("entity cache lock poisoned").get(path).cloned()
    }

    /// Stores the entities of `path`.
    pub fn insert(&self, path: impl Into<String>, entities: Vec<Entity>) {
        self.files.lock().expect("entity cache lock poisoned").insert(path.into(), entities);
    }

    /// Whether `path` is cached.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().expect("entity cache lock poisoned").contains_key(path)
    }

    /// Number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.lock().expect("entity cache lock poisoned").len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached file.
    pub fn clear(&self) {
        self.files.lock().expect("entity cache lock poisoned").clear();
    }

    /// Entities of `path`, from the cache or the provider.
    pub async fn load(&self, provider: &dyn EntityProvider, path: &str) -> FileEntities {
        if let Some(entities) = self.get(path) {
            return FileEntities::new(path, entities);
        }
        match provider.entities(path).await {
            Ok(entities) => {
                self.insert(path, entities.clone());
                FileEntities::new(path, entities)
            }
            Err(e) => {
                debug!(file = path, error = %e, "entity discovery failed, treating file as empty");
                FileEntities::new(path, Vec::new())
            }
        }
    }

    /// Loads every file concurrently, preserving input order.
    pub async fn load_all(&self, provider: &dyn EntityProvider, paths: &[String]) -> Vec<FileEntities> {
        join_all(paths.iter().map(|p| self.load(provider, p))).await
    }
}

/// Outcome of one [`warm`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmReport {
    /// Files fetched from the provider.
    pub fetched: usize,
    /// Files already cached.
    pub cached: usize,
    /// Whether the pass stopped because scanning was switched off.
    pub cancelled: bool,
}

/// Fills the cache for `paths` one file at a time.
///
/// Checks `mode` before every file and stops as soon as it is off.
pub async fn warm(
    cache: &EntityCache,
    provider: &dyn EntityProvider,
    paths: &[String],
    mode: &ScanMode,
) -> WarmReport {
    let mut report = WarmReport::default();
    for path in paths {
        if !mode.is_on() {
            let remaining = paths.len() - report.fetched - report.cached;
            info!(fetched = report.fetched, remaining, "warm scan cancelled");
            report.cancelled = true;
            return report;
        }
        if cache.contains(path) {
            report.cached += 1;
            continue;
        }
        cache.load(provider, path).await;
        report.fetched += 1;
    }
    debug!(fetched = report.fetched, cached = report.cached, "warm scan finished");
    report
}
