//! Relationship-discovery port.

use super::PortFuture;
use crate::entity::{CallTarget, CallableEntity};

/// Reports the outgoing calls of a callable entity.
pub trait CallProvider: Send + Sync {
    /// Returns the calls made from inside `entity`.
    ///
    /// Unsupported files or languages yield an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the query itself fails. Callers treat errors as
    /// "no calls".
    fn outgoing_calls(&self, entity: &CallableEntity) -> PortFuture<'_, Vec<CallTarget>>;
}
