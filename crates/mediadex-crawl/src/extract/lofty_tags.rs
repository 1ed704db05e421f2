use std::path::Path;
use std::time::Duration;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::Accessor;
use mediadex_core::traits::MetadataExtractor;
use mediadex_core::TrackMetadata;
use tracing::debug;

/// In-process tag reader. Holds no resources, so `close` is the default no-op.
#[derive(Debug, Default)]
pub struct LoftyExtractor;

impl MetadataExtractor for LoftyExtractor {
    fn extract(&mut self, path: &Path) -> Option<TrackMetadata> {
        let tagged = match lofty::read_from_path(path) {
            Ok(tagged) => tagged,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no readable tags");
                return None;
            }
        };

        let duration = tagged.properties().duration();
        let mut meta = TrackMetadata {
            duration: (!duration.is_zero()).then(|| format_duration(duration)),
            ..TrackMetadata::default()
        };
        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            meta.artist = tag.artist().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
            meta.album = tag.album().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        }
        Some(meta)
    }
}

/// `H:MM:SS`, the same shape ExifTool prints for long tracks.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_render_as_clock_time() {
        assert_eq!(format_duration(Duration::from_secs(225)), "0:03:45");
        assert_eq!(format_duration(Duration::from_millis(3_725_900)), "1:02:05");
    }

    #[test]
    fn untagged_garbage_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.flac");
        std::fs::write(&path, b"definitely not a flac stream").unwrap();
        assert_eq!(LoftyExtractor.extract(&path), None);
    }
}
