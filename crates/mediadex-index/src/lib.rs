//! mediadex-index
//!
//! Tantivy-backed store for audio records: field layout and analyzers in
//! `schema`, the batched write path in `index`, query and path lookup in
//! `query`. A store is a plain directory and can be reopened at any time.

pub mod error;
pub mod index;
pub mod query;
pub mod schema;

pub use error::IndexError;
pub use index::{IndexOptions, MediaIndex};
pub use schema::{AudioField, AudioSchema};
