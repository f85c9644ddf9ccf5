//! Cassette format for recording and replaying port interactions.
//!
//! A cassette is a YAML file of `(port, method, input, output)` records.
//! Fallible outputs use the `{"ok": value}` / `{"err": message}` convention.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;
