//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the graph engine and an external
//! collaborator (filesystem, tracked-file listing, entity discovery,
//! relationship discovery, language-model inference). Implementations live in
//! `src/adapters/`.

pub mod calls;
pub mod entities;
pub mod filesystem;
pub mod git;
pub mod llm;

use std::future::Future;
use std::pin::Pin;

pub use calls::CallProvider;
pub use entities::EntityProvider;
pub use filesystem::FileSystem;
pub use git::GitRepo;
pub use llm::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient};

/// Error type returned across every port boundary.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed future returned by the asynchronous ports, keeping them dyn-compatible.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PortError>> + Send + 'a>>;
