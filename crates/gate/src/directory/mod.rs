//! The user directory as seen from the edge: a fetchable source and the
//! per-process snapshot cache in front of it.

pub mod cache;
pub mod source;

pub use cache::{DirectorySnapshot, Lookup, SnapshotCache};
pub use source::{DirectorySource, HttpDirectorySource, Roster, SourceError, UnconfiguredSource};
