//! Entity-discovery port.

use super::PortFuture;
use crate::entity::Entity;

/// Yields the entity tree of a file.
///
/// Abstracting discovery keeps the engine independent of any parser and lets
/// tests replay recorded trees.
pub trait EntityProvider: Send + Sync {
    /// Returns the top-level entities of `path`, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed. Callers treat
    /// errors as an empty tree.
    fn entities(&self, path: &str) -> PortFuture<'_, Vec<Entity>>;
}
