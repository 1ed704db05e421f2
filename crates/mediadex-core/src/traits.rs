use std::path::{Path, PathBuf};

use crate::types::{AudioFiles, TrackMetadata};

/// Reads tag metadata for one file at a time.
///
/// Implementations may hold an expensive handle (an external process, a
/// decoder pool); the crawler acquires one per crawl and calls [`close`]
/// exactly once when the crawl ends, however it ends.
///
/// [`close`]: MetadataExtractor::close
pub trait MetadataExtractor: Send {
    /// `None` when the file has no readable tags. Never fatal.
    fn extract(&mut self, path: &Path) -> Option<TrackMetadata>;

    fn close(&mut self) -> anyhow::Result<()> { Ok(()) }
}

/// What the media-serving layer needs from an index.
pub trait MediaCatalog: Send + Sync {
    fn query(&self, term: &str) -> anyhow::Result<AudioFiles>;
    /// `Ok(None)` when no document carries `id`.
    fn path_for_id(&self, id: &str) -> anyhow::Result<Option<PathBuf>>;
}
