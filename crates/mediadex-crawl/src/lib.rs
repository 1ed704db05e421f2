//! Filesystem crawl for mediadex.
//!
//! Walks one or more roots, keeps files whose leading bytes identify them as
//! audio, asks a [`MetadataExtractor`] for tags and streams [`AudioFile`]
//! records to a consumer (see [`walker`]).
//!
//! [`MetadataExtractor`]: mediadex_core::traits::MetadataExtractor
//! [`AudioFile`]: mediadex_core::AudioFile

pub mod classify;
pub mod extract;
pub mod walker;

pub use classify::{detect_format, is_audio, read_header, AudioFormat};
pub use extract::{open_extractor, ExifToolExtractor, LoftyExtractor, NoopExtractor};
pub use walker::{CrawlHandle, CrawlProgress, CrawlSummary, Crawler};
