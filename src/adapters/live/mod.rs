//! Live adapters for real external interactions.

pub mod calls;
pub mod entities;
pub mod filesystem;
pub mod git;
pub mod llm;
pub mod tags;

pub use calls::LiveCallProvider;
pub use entities::LiveEntityProvider;
pub use filesystem::LiveFileSystem;
pub use git::LiveGitRepo;
pub use llm::LiveLlmClient;
