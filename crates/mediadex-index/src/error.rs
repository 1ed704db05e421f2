use std::path::PathBuf;

use tantivy::query::QueryParserError;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
	#[error("index already exists: {}", .0.display())]
	AlreadyExists(PathBuf),

	#[error("no index at {}", .0.display())]
	NotFound(PathBuf),

	#[error("index store error: {0}")]
	Store(#[from] tantivy::TantivyError),

	#[error("cannot encode document: {0}")]
	Encoding(String),

	#[error("invalid query {query:?}: {source}")]
	Query {
		query: String,
		#[source]
		source: QueryParserError,
	},

	#[error("{}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}
