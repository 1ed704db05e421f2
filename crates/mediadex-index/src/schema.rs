//! Field layout and analyzers of the audio index.
//!
//! Keyword fields (`id`, `path`, `root`, `folder`, `tags`, `duration`) are
//! indexed verbatim and match case-sensitively. Natural-language fields
//! (`name`, `artist`, `album`) go through the English analyzer registered
//! under [`ANALYZER`]. The layout is fixed when a store is created.
use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const ANALYZER: &str = "audio_en";

const STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","but","by","for","if","in","into","is","it","no","not","of","on","or","such","that","the","their","then","there","these","they","this","to","was","will","with",
];

/// Every stored field of an audio document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioField {
	Id,
	Path,
	Root,
	Folder,
	Name,
	Artist,
	Album,
	Duration,
	Tags,
}

impl AudioField {
	pub const ALL: [AudioField; 9] = [
		AudioField::Id,
		AudioField::Path,
		AudioField::Root,
		AudioField::Folder,
		AudioField::Name,
		AudioField::Artist,
		AudioField::Album,
		AudioField::Duration,
		AudioField::Tags,
	];

	pub fn name(self) -> &'static str {
		match self {
			AudioField::Id => "id",
			AudioField::Path => "path",
			AudioField::Root => "root",
			AudioField::Folder => "folder",
			AudioField::Name => "name",
			AudioField::Artist => "artist",
			AudioField::Album => "album",
			AudioField::Duration => "duration",
			AudioField::Tags => "tags",
		}
	}

}

/// Resolved field handles for one index.
#[derive(Debug, Clone)]
pub struct AudioSchema {
	pub schema: Schema,
	pub id: Field,
	pub path: Field,
	pub root: Field,
	pub folder: Field,
	pub name: Field,
	pub artist: Field,
	pub album: Field,
	pub duration: Field,
	pub tags: Field,
}

impl AudioSchema {
	pub fn build() -> Self {
		let mut builder = Schema::builder();
		let text_indexing = TextFieldIndexing::default()
			.set_tokenizer(ANALYZER)
			.set_index_option(IndexRecordOption::WithFreqsAndPositions);
		let text_options = TextOptions::default().set_indexing_options(text_indexing).set_stored();

		let id = builder.add_text_field(AudioField::Id.name(), STRING | STORED);
		let path = builder.add_text_field(AudioField::Path.name(), STRING | STORED);
		let root = builder.add_text_field(AudioField::Root.name(), STRING | STORED);
		let folder = builder.add_text_field(AudioField::Folder.name(), STRING | STORED);
		let name = builder.add_text_field(AudioField::Name.name(), text_options.clone());
		let artist = builder.add_text_field(AudioField::Artist.name(), text_options.clone());
		let album = builder.add_text_field(AudioField::Album.name(), text_options);
		let duration = builder.add_text_field(AudioField::Duration.name(), STRING | STORED);
		let tags = builder.add_text_field(AudioField::Tags.name(), STRING | STORED);
		Self { schema: builder.build(), id, path, root, folder, name, artist, album, duration, tags }
	}

	/// Resolves handles against the schema of an existing store.
	pub fn resolve(schema: Schema) -> tantivy::Result<Self> {
		Ok(Self {
			id: schema.get_field(AudioField::Id.name())?,
			path: schema.get_field(AudioField::Path.name())?,
			root: schema.get_field(AudioField::Root.name())?,
			folder: schema.get_field(AudioField::Folder.name())?,
			name: schema.get_field(AudioField::Name.name())?,
			artist: schema.get_field(AudioField::Artist.name())?,
			album: schema.get_field(AudioField::Album.name())?,
			duration: schema.get_field(AudioField::Duration.name())?,
			tags: schema.get_field(AudioField::Tags.name())?,
			schema,
		})
	}

	pub fn field(&self, field: AudioField) -> Field {
		match field {
			AudioField::Id => self.id,
			AudioField::Path => self.path,
			AudioField::Root => self.root,
			AudioField::Folder => self.folder,
			AudioField::Name => self.name,
			AudioField::Artist => self.artist,
			AudioField::Album => self.album,
			AudioField::Duration => self.duration,
			AudioField::Tags => self.tags,
		}
	}

	/// Fields searched by unscoped query terms. Keyword fields among them
	/// still match only verbatim, so a bare `jazz` finds `tags: jazz`.
	pub fn default_fields(&self) -> Vec<Field> {
		vec![self.name, self.artist, self.album, self.tags, self.folder]
	}
}

/// Tokenizers are not persisted with the store; call on create and on open.
pub fn register_tokenizer(index: &Index) {
	let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(RemoveLongFilter::limit(40))
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
		.filter(Stemmer::new(Language::English))
		.build();
	index.tokenizers().register(ANALYZER, analyzer);
}
