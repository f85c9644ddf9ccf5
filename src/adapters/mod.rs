//! Port implementations.
//!
//! - [`live`]: real disk, git, source scanning and the Anthropic API.
//! - [`recording`]: wrap another implementation and append every interaction
//!   to a cassette.
//! - [`replaying`]: serve interactions back from a cassette.

pub mod live;
pub mod recording;
pub mod replaying;

use serde::Serialize;

/// Recorded input of every path-keyed port method.
#[derive(Serialize)]
pub(crate) struct PathInput<'a> {
    pub(crate) path: &'a str,
}
