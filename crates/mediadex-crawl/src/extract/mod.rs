//! Metadata extractors and their selection from configuration.

mod exiftool;
mod lofty_tags;

use std::path::Path;

use mediadex_core::config::{CrawlSettings, ExtractorKind};
use mediadex_core::traits::MetadataExtractor;
use mediadex_core::TrackMetadata;

pub use self::exiftool::{parse_exiftool_json, ExifToolExtractor};
pub use self::lofty_tags::{format_duration, LoftyExtractor};

/// Indexes path-derived fields only.
#[derive(Debug, Default)]
pub struct NoopExtractor;

impl MetadataExtractor for NoopExtractor {
    fn extract(&mut self, _path: &Path) -> Option<TrackMetadata> { None }
}

/// Starts the extractor named by `settings.extractor`.
///
/// This is the only crawl step allowed to fail fatally: an extractor that
/// cannot start aborts the crawl before any file is visited.
pub fn open_extractor(settings: &CrawlSettings) -> mediadex_core::Result<Box<dyn MetadataExtractor>> {
    Ok(match settings.extractor {
        ExtractorKind::Lofty => Box::new(LoftyExtractor),
        ExtractorKind::Exiftool => Box::new(ExifToolExtractor::start(&settings.exiftool_path)?),
        ExtractorKind::None => Box::new(NoopExtractor),
    })
}
