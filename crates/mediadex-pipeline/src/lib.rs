//! Crawl-to-index orchestration.
//!
//! [`drain_into`] is the consumer half of a crawl: it feeds every emitted
//! record into a [`MediaIndex`] and returns once the crawler has signalled
//! completion and the remaining buffered records are written. [`ingest`]
//! wires a full run together: optional overwrite, extractor startup, index
//! creation, crawl, close.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mediadex_core::config::Settings;
use mediadex_core::traits::MetadataExtractor;
use mediadex_crawl::{open_extractor, CrawlHandle, CrawlProgress, CrawlSummary, Crawler};
use mediadex_index::{IndexOptions, MediaIndex};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records written by this run, including replaced duplicates.
    pub added: usize,
    /// Searchable documents once the index was closed.
    pub documents: u64,
    pub crawl: CrawlSummary,
}

/// Consumes `handle` until the crawl completes. Returns records written and
/// the crawler's summary.
///
/// A write error stops consumption and drops the handle, which abandons the
/// crawl; the error is returned.
pub async fn drain_into<F>(mut handle: CrawlHandle, index: &mut MediaIndex, mut on_progress: F) -> Result<(usize, CrawlSummary)>
where
    F: FnMut(&CrawlProgress),
{
    let mut added = 0usize;
    let summary = loop {
        tokio::select! {
            Some(doc) = handle.docs.recv() => {
                index.add_item(&doc).with_context(|| format!("indexing {}", doc.path))?;
                added += 1;
            }
            Some(progress) = handle.progress.recv() => on_progress(&progress),
            done = &mut handle.done => {
                // The document stream is closed before completion fires, so
                // this only drains what is already buffered.
                while let Some(doc) = handle.docs.recv().await {
                    index.add_item(&doc).with_context(|| format!("indexing {}", doc.path))?;
                    added += 1;
                }
                break done.context("crawler stopped without reporting completion")?;
            }
        }
    };
    debug!(added, "crawl drained");
    Ok((added, summary))
}

/// Builds a new index at `index_path` from `roots`, using the extractor
/// named in `settings.crawl`.
pub async fn ingest<F>(settings: &Settings, roots: Vec<PathBuf>, index_path: &Path, overwrite: bool, on_progress: F) -> Result<IngestReport>
where
    F: FnMut(&CrawlProgress),
{
    let extractor = open_extractor(&settings.crawl)?;
    ingest_with(settings, roots, index_path, overwrite, extractor, on_progress).await
}

/// [`ingest`] with a caller-supplied extractor.
pub async fn ingest_with<F>(
    settings: &Settings,
    roots: Vec<PathBuf>,
    index_path: &Path,
    overwrite: bool,
    extractor: Box<dyn MetadataExtractor>,
    on_progress: F,
) -> Result<IngestReport>
where
    F: FnMut(&CrawlProgress),
{
    if overwrite && index_path.exists() {
        info!(path = %index_path.display(), "removing existing index");
        fs::remove_dir_all(index_path).map_err(|e| mediadex_core::Error::io(index_path, e))?;
    }
    let mut index = MediaIndex::create(index_path, IndexOptions::from(&settings.index))?;

    let handle = Crawler::new(&settings.crawl).spawn(roots, extractor);
    let (added, crawl) = drain_into(handle, &mut index, on_progress).await?;

    index.flush()?;
    let documents = index.num_docs();
    index.close()?;
    info!(documents, added, failed_roots = crawl.failed_roots.len(), "index created");
    Ok(IngestReport { added, documents, crawl })
}
