use std::fs;
use std::path::Path;

use mediadex_core::config::IndexSettings;
use mediadex_core::AudioFile;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::IndexError;
use crate::schema::{register_tokenizer, AudioField, AudioSchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
	/// Pending documents that trigger a commit from `add_item`.
	pub batch_size: usize,
	pub max_hits: usize,
	pub writer_memory_bytes: usize,
	pub writer_threads: usize,
	/// Stored fields copied back into query results; the rest stay empty.
	pub projection: Vec<AudioField>,
}

impl Default for IndexOptions {
	fn default() -> Self { Self::from(&IndexSettings::default()) }
}

impl From<&IndexSettings> for IndexOptions {
	fn from(s: &IndexSettings) -> Self {
		Self {
			batch_size: s.batch_size.max(1),
			max_hits: s.max_hits.max(1),
			writer_memory_bytes: s.writer_memory_bytes,
			writer_threads: s.writer_threads.max(1),
			projection: AudioField::ALL.to_vec(),
		}
	}
}

/// A persistent, single-writer audio index.
///
/// Writes are buffered and become searchable only after a commit, which
/// happens when `batch_size` documents are pending, on [`flush`] and on
/// [`close`]. Reads go through a reader reloaded after every commit.
///
/// A store returned by [`open`] takes tantivy's writer lock only on its first
/// [`add_item`], so any number of processes can open it for queries while
/// one of them writes. [`create`] takes the lock up front.
///
/// [`open`]: MediaIndex::open
/// [`create`]: MediaIndex::create
/// [`add_item`]: MediaIndex::add_item
/// [`flush`]: MediaIndex::flush
/// [`close`]: MediaIndex::close
pub struct MediaIndex {
	pub(crate) index: Index,
	pub(crate) fields: AudioSchema,
	pub(crate) reader: IndexReader,
	pub(crate) options: IndexOptions,
	writer: Option<IndexWriter<TantivyDocument>>,
	pending: usize,
	batches: Option<mpsc::Sender<u64>>,
}

impl MediaIndex {
	/// Creates a new store at `path`; refuses to touch an existing one.
	pub fn create(path: &Path, options: IndexOptions) -> Result<Self, IndexError> {
		if path.exists() {
			return Err(IndexError::AlreadyExists(path.to_path_buf()));
		}
		fs::create_dir_all(path).map_err(|source| IndexError::Io { path: path.to_path_buf(), source })?;
		let fields = AudioSchema::build();
		let index = Index::create_in_dir(path, fields.schema.clone())?;
		info!(path = %path.display(), "index created");
		let mut created = Self::with_index(index, fields, options)?;
		created.writer()?;
		Ok(created)
	}

	pub fn open(path: &Path, options: IndexOptions) -> Result<Self, IndexError> {
		if !path.is_dir() {
			return Err(IndexError::NotFound(path.to_path_buf()));
		}
		let index = Index::open_in_dir(path)?;
		let fields = AudioSchema::resolve(index.schema())?;
		debug!(path = %path.display(), "index opened");
		Self::with_index(index, fields, options)
	}

	fn with_index(index: Index, fields: AudioSchema, options: IndexOptions) -> Result<Self, IndexError> {
		register_tokenizer(&index);
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		Ok(Self { index, fields, reader, options, writer: None, pending: 0, batches: None })
	}

	fn writer(&mut self) -> Result<&mut IndexWriter<TantivyDocument>, IndexError> {
		let writer = match self.writer.take() {
			Some(writer) => writer,
			None => {
				let writer = self.index.writer_with_num_threads(self.options.writer_threads, self.options.writer_memory_bytes)?;
				debug!(threads = self.options.writer_threads, "index writer acquired");
				writer
			}
		};
		Ok(self.writer.insert(writer))
	}

	/// Adds or replaces the document keyed by `item.id`.
	///
	/// Commits synchronously when the pending batch reaches `batch_size`;
	/// a commit failure is returned from the call that triggered it.
	pub fn add_item(&mut self, item: &AudioFile) -> Result<(), IndexError> {
		let doc = self.encode(item)?;
		let id = Term::from_field_text(self.fields.id, &item.id);
		let writer = self.writer()?;
		writer.delete_term(id);
		writer.add_document(doc)?;
		self.pending += 1;
		if self.pending >= self.options.batch_size {
			self.flush()?;
		}
		Ok(())
	}

	/// Commits pending documents. No-op when nothing is pending.
	pub fn flush(&mut self) -> Result<(), IndexError> {
		let Some(writer) = self.writer.as_mut() else { return Ok(()) };
		if self.pending == 0 {
			return Ok(());
		}
		writer.commit()?;
		self.reader.reload()?;
		let committed = self.pending;
		self.pending = 0;
		let total = self.reader.searcher().num_docs();
		debug!(committed, total, "batch written");
		if let Some(tx) = &self.batches {
			let _ = tx.try_send(total);
		}
		Ok(())
	}

	/// Flushes, then waits for background merges before releasing the store.
	pub fn close(mut self) -> Result<(), IndexError> {
		self.flush()?;
		let total = self.reader.searcher().num_docs();
		if let Some(writer) = self.writer.take() {
			writer.wait_merging_threads()?;
		}
		info!(documents = total, "index closed");
		Ok(())
	}

	/// Total searchable documents after each commit.
	///
	/// Advisory: a count is dropped when the previous one has not been read,
	/// and commits never wait on the receiver. Replaces any earlier
	/// subscription.
	pub fn subscribe_batches(&mut self) -> mpsc::Receiver<u64> {
		let (tx, rx) = mpsc::channel(1);
		self.batches = Some(tx);
		rx
	}

	/// Documents visible to queries right now.
	pub fn num_docs(&self) -> u64 { self.reader.searcher().num_docs() }

	pub fn options(&self) -> &IndexOptions { &self.options }

	fn encode(&self, item: &AudioFile) -> Result<TantivyDocument, IndexError> {
		if item.id.is_empty() {
			return Err(IndexError::Encoding(format!("{} has no id", item.path)));
		}
		let f = &self.fields;
		let mut doc = TantivyDocument::default();
		doc.add_text(f.id, &item.id);
		doc.add_text(f.path, &item.path);
		doc.add_text(f.root, &item.root);
		doc.add_text(f.folder, &item.folder);
		doc.add_text(f.name, &item.name);
		for (field, value) in [(f.artist, &item.artist), (f.album, &item.album), (f.duration, &item.duration)] {
			if let Some(value) = value {
				doc.add_text(field, value);
			}
		}
		for tag in &item.tags {
			doc.add_text(f.tags, tag);
		}
		Ok(doc)
	}
}
