//! Concurrent crawl of one or more root directories.
//!
//! The walk runs on Tokio's blocking pool and talks to its consumer over
//! three one-way channels:
//!
//! - `docs`: bounded (`queue_depth`, default 1); the walk blocks on send
//!   once the consumer falls behind.
//! - `progress`: capacity 1, filled with `try_send`; updates are dropped
//!   rather than ever blocking the walk.
//! - `done`: a oneshot fired once, after `docs` has been closed.
//!
//! Dropping the [`CrawlHandle`] abandons the crawl: the next send fails, the
//! walk stops and the extractor is closed on the way out.

use std::fs;
use std::path::{Path, PathBuf};

use mediadex_core::config::CrawlSettings;
use mediadex_core::traits::MetadataExtractor;
use mediadex_core::AudioFile;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::classify::{is_audio, read_header};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlProgress {
    pub visited: usize,
    pub emitted: usize,
    pub current: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Regular files looked at.
    pub visited: usize,
    /// Audio records sent to the consumer.
    pub emitted: usize,
    /// Audio files that could not be read or turned into a record.
    pub skipped: usize,
    pub failed_roots: Vec<PathBuf>,
    /// Set when the consumer went away before the walk finished.
    pub abandoned: bool,
}

pub struct CrawlHandle {
    pub docs: mpsc::Receiver<AudioFile>,
    pub progress: mpsc::Receiver<CrawlProgress>,
    pub done: oneshot::Receiver<CrawlSummary>,
}

#[derive(Debug, Clone)]
pub struct Crawler {
    header_len: usize,
    queue_depth: usize,
    follow_links: bool,
}

impl Default for Crawler {
    fn default() -> Self { Self::new(&CrawlSettings::default()) }
}

impl Crawler {
    pub fn new(settings: &CrawlSettings) -> Self {
        Self {
            header_len: settings.header_len.max(1),
            queue_depth: settings.queue_depth.max(1),
            follow_links: settings.follow_links,
        }
    }

    /// Starts walking `roots` in order. Must be called inside a Tokio runtime.
    ///
    /// `extractor` is owned by the walk from here on and closed exactly once
    /// when it ends, whether it completes or is abandoned.
    pub fn spawn(&self, roots: Vec<PathBuf>, extractor: Box<dyn MetadataExtractor>) -> CrawlHandle {
        let (docs_tx, docs) = mpsc::channel(self.queue_depth);
        let (progress_tx, progress) = mpsc::channel(1);
        let (done_tx, done) = oneshot::channel();
        let walk = Walk {
            header_len: self.header_len,
            follow_links: self.follow_links,
            docs: docs_tx,
            progress: progress_tx,
            extractor: ExtractorGuard(extractor),
            summary: CrawlSummary::default(),
        };
        tokio::task::spawn_blocking(move || {
            let summary = walk.run(&roots);
            // The receiver may already be gone; completion is still final.
            let _ = done_tx.send(summary);
        });
        CrawlHandle { docs, progress, done }
    }
}

/// Closes the extractor on every exit path, including unwinding.
struct ExtractorGuard(Box<dyn MetadataExtractor>);

impl Drop for ExtractorGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.close() {
            warn!(error = %e, "failed to close metadata extractor");
        }
    }
}

enum Flow {
    Continue,
    Abandoned,
}

struct Walk {
    header_len: usize,
    follow_links: bool,
    docs: mpsc::Sender<AudioFile>,
    progress: mpsc::Sender<CrawlProgress>,
    extractor: ExtractorGuard,
    summary: CrawlSummary,
}

impl Walk {
    /// Consumes the walk so the channels and the extractor are released
    /// before the summary is handed back.
    fn run(mut self, roots: &[PathBuf]) -> CrawlSummary {
        for root in roots {
            if let Flow::Abandoned = self.walk_root(root) {
                debug!("consumer dropped the document stream, abandoning crawl");
                self.summary.abandoned = true;
                break;
            }
        }
        let Walk { summary, .. } = self;
        info!(
            visited = summary.visited,
            emitted = summary.emitted,
            skipped = summary.skipped,
            failed_roots = summary.failed_roots.len(),
            "crawl finished"
        );
        summary
    }

    fn walk_root(&mut self, root: &Path) -> Flow {
        let root = match fs::canonicalize(root) {
            Ok(r) if r.is_dir() => r,
            Ok(r) => {
                warn!(root = %r.display(), "crawl root is not a directory");
                self.summary.failed_roots.push(root.to_path_buf());
                return Flow::Continue;
            }
            Err(e) => {
                warn!(root = %root.display(), error = %e, "error walking root");
                self.summary.failed_roots.push(root.to_path_buf());
                return Flow::Continue;
            }
        };
        debug!(root = %root.display(), "walking root");

        let walker = WalkDir::new(&root).follow_links(self.follow_links).sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() || !entry.path().is_file() {
                continue;
            }
            if let Flow::Abandoned = self.visit_file(&root, entry.path()) {
                return Flow::Abandoned;
            }
        }
        Flow::Continue
    }

    fn visit_file(&mut self, root: &Path, path: &Path) -> Flow {
        self.summary.visited += 1;

        let header = match read_header(path, self.header_len) {
            Ok(header) => header,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skip indexing, error reading header");
                self.summary.skipped += 1;
                return Flow::Continue;
            }
        };
        if !is_audio(&header) {
            return Flow::Continue;
        }
        if path.to_str().is_none() {
            warn!(path = %path.display(), "path is not valid UTF-8, skipping");
            self.summary.skipped += 1;
            return Flow::Continue;
        }

        let meta = self.extractor.0.extract(path).unwrap_or_default();
        let Some(file) = AudioFile::discovered(root, path, meta) else {
            warn!(path = %path.display(), root = %root.display(), "file is not under its root, skipping");
            self.summary.skipped += 1;
            return Flow::Continue;
        };

        if self.docs.blocking_send(file).is_err() {
            return Flow::Abandoned;
        }
        self.summary.emitted += 1;
        let _ = self.progress.try_send(CrawlProgress {
            visited: self.summary.visited,
            emitted: self.summary.emitted,
            current: path.to_path_buf(),
        });
        Flow::Continue
    }
}
