//! Domain types shared by the crawler, the index engine and the CLI.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::ops::Deref;
use std::path::{Component, Path};

use crate::id::{content_id, ContentId};

/// Tag metadata returned by a [`crate::traits::MetadataExtractor`].
///
/// Every field is optional: a file with unreadable or missing tags still
/// becomes a document, it just carries fewer searchable values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<String>,
}

/// A single audio file as discovered on disk; the unit of indexing.
///
/// - `id`: content address of `path` (see [`content_id`])
/// - `path`: absolute location of the media file
/// - `root`: crawl root the file was found under
/// - `folder`: parent directory of `path`, relative to `root`
/// - `name`: file base name
/// - `artist`/`album`/`duration`: extracted tag values, absent on failure
/// - `tags`: `folder` split into its components, outermost first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFile {
    pub id: ContentId,
    pub path: String,
    pub root: String,
    pub folder: String,
    pub name: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<String>,
    pub tags: Vec<String>,
}

impl AudioFile {
    /// Builds the record for `path` found while walking `root`.
    ///
    /// Returns `None` when `path` does not live under `root` (for instance a
    /// symlink resolved outside the tree), since `folder` cannot be derived,
    /// or when `path` or `root` is not valid UTF-8: stored paths must name
    /// the file exactly so that lookups by id resolve to it.
    pub fn discovered(root: &Path, path: &Path, meta: TrackMetadata) -> Option<Self> {
        let path_str = path.to_str()?;
        let root_str = root.to_str()?;
        let folder = derive_folder(root, path)?;
        let name = path.file_name()?.to_str()?.to_string();
        Some(Self {
            id: content_id(path),
            path: path_str.to_string(),
            root: root_str.to_string(),
            tags: derive_tags(&folder),
            folder,
            name,
            artist: meta.artist,
            album: meta.album,
            duration: meta.duration,
        })
    }
}

/// Directory of `path` relative to `root`; empty for files directly in `root`.
pub fn derive_folder(root: &Path, path: &Path) -> Option<String> {
    let parent = path.parent()?;
    let relative = parent.strip_prefix(root).ok()?;
    Some(relative.to_string_lossy().into_owned())
}

/// Splits a relative folder into its directory names.
pub fn derive_tags(folder: &str) -> Vec<String> {
    Path::new(folder)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// An ordered result set of audio files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioFiles(pub Vec<AudioFile>);

impl AudioFiles {
    /// Renders one labelled block per record, separated by blank lines.
    pub fn write_out<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for item in &self.0 {
            let rows: [(&str, &str); 7] = [
                ("ID:", item.id.as_str()),
                ("Name:", item.name.as_str()),
                ("Path:", item.path.as_str()),
                ("Folder:", item.folder.as_str()),
                ("Artist:", item.artist.as_deref().unwrap_or("")),
                ("Album:", item.album.as_deref().unwrap_or("")),
                ("Duration:", item.duration.as_deref().unwrap_or("")),
            ];
            for (label, value) in rows {
                writeln!(out, "{:<10}{}", label, value)?;
            }
            if !item.tags.is_empty() {
                writeln!(out, "{:<10}{}", "Tags:", item.tags.join(", "))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> Vec<AudioFile> { self.0 }
}

impl Deref for AudioFiles {
    type Target = [AudioFile];
    fn deref(&self) -> &Self::Target { &self.0 }
}

impl From<Vec<AudioFile>> for AudioFiles {
    fn from(files: Vec<AudioFile>) -> Self { Self(files) }
}

impl IntoIterator for AudioFiles {
    type Item = AudioFile;
    type IntoIter = std::vec::IntoIter<AudioFile>;
    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}
