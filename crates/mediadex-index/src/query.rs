use std::path::PathBuf;

use mediadex_core::traits::MediaCatalog;
use mediadex_core::{AudioFile, AudioFiles};
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{TantivyDocument, Term};
use tracing::{debug, warn};

use crate::error::IndexError;
use crate::index::MediaIndex;
use crate::schema::AudioField;

impl MediaIndex {
	/// Runs a query string against the committed documents.
	///
	/// Unscoped terms search the text fields plus `tags` and `folder`; `field:value`
	/// clauses and `AND`/`OR`/`-` combinators follow the tantivy grammar.
	/// Results are capped at `max_hits`, best match first.
	pub fn query(&self, term: &str) -> Result<AudioFiles, IndexError> {
		let parser = QueryParser::for_index(&self.index, self.fields.default_fields());
		let query = parser
			.parse_query(term)
			.map_err(|source| IndexError::Query { query: term.to_string(), source })?;
		debug!(?query, "compiled query");

		let searcher = self.reader.searcher();
		let (top_docs, total) = searcher.search(&query, &(TopDocs::with_limit(self.options.max_hits), Count))?;
		if total > top_docs.len() {
			warn!(total, returned = top_docs.len(), "query matched more documents than max_hits");
		}

		let mut files = Vec::with_capacity(top_docs.len());
		for (_score, address) in top_docs {
			let doc: TantivyDocument = searcher.doc(address)?;
			files.push(self.hydrate(&doc));
		}
		Ok(AudioFiles(files))
	}

	/// Location of the document with `id`; `None` when no such document.
	pub fn path_for_id(&self, id: &str) -> Result<Option<PathBuf>, IndexError> {
		let query = TermQuery::new(Term::from_field_text(self.fields.id, id), IndexRecordOption::Basic);
		let searcher = self.reader.searcher();
		let Some((_, address)) = searcher.search(&query, &TopDocs::with_limit(1))?.into_iter().next() else {
			return Ok(None);
		};
		let doc: TantivyDocument = searcher.doc(address)?;
		Ok(doc.get_first(self.fields.path).and_then(|v| v.as_str()).map(PathBuf::from))
	}

	fn hydrate(&self, doc: &TantivyDocument) -> AudioFile {
		let mut file = AudioFile::default();
		for &field in &self.options.projection {
			let values = doc
				.get_all(self.fields.field(field))
				.filter_map(|v| v.as_str())
				.map(str::to_string)
				.collect();
			set_field(&mut file, field, values);
		}
		file
	}
}

fn set_field(file: &mut AudioFile, field: AudioField, mut values: Vec<String>) {
	if field == AudioField::Tags {
		file.tags = values;
		return;
	}
	let first = if values.is_empty() { None } else { Some(values.swap_remove(0)) };
	match field {
		AudioField::Id => file.id = first.unwrap_or_default(),
		AudioField::Path => file.path = first.unwrap_or_default(),
		AudioField::Root => file.root = first.unwrap_or_default(),
		AudioField::Folder => file.folder = first.unwrap_or_default(),
		AudioField::Name => file.name = first.unwrap_or_default(),
		AudioField::Artist => file.artist = first,
		AudioField::Album => file.album = first,
		AudioField::Duration => file.duration = first,
		AudioField::Tags => {}
	}
}

impl MediaCatalog for MediaIndex {
	fn query(&self, term: &str) -> anyhow::Result<AudioFiles> { Ok(MediaIndex::query(self, term)?) }

	fn path_for_id(&self, id: &str) -> anyhow::Result<Option<PathBuf>> { Ok(MediaIndex::path_for_id(self, id)?) }
}
