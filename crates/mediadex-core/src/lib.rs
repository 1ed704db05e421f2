//! Shared vocabulary for mediadex.
//!
//! Domain records (`AudioFile`), content addressing, the extractor and
//! catalog traits, and the Figment-backed configuration loader. Paths in
//! config accept `~` and `${VAR}` (see `config::expand_path`).

pub mod config;
pub mod error;
pub mod id;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use id::{content_id, ContentId};
pub use types::{AudioFile, AudioFiles, TrackMetadata};
