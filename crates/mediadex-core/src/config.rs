use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub const DEFAULT_INDEX_NAME: &str = "audio.idx";
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_MAX_HITS: usize = 10_000;
pub const DEFAULT_WRITER_MEMORY_BYTES: usize = 50_000_000;
/// Enough leading bytes for every signature the classifier knows.
pub const DEFAULT_HEADER_LEN: usize = 261;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        // APP_INDEX__BATCH_SIZE=500 -> index.batch_size
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// The typed view of every known key, with defaults for anything unset.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        match env {
            "prod" | "production" if settings.index.batch_size < 100 => Err(Error::InvalidConfig(format!(
                "index.batch_size {} is too small for production crawls",
                settings.index.batch_size
            ))
            .into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub index: IndexSettings,
    pub crawl: CrawlSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.index.name.trim().is_empty() {
            return Err(Error::InvalidConfig("index.name must not be empty".into()));
        }
        if self.index.batch_size == 0 {
            return Err(Error::InvalidConfig("index.batch_size must be at least 1".into()));
        }
        if self.index.max_hits == 0 {
            return Err(Error::InvalidConfig("index.max_hits must be at least 1".into()));
        }
        if self.index.writer_threads == 0 {
            return Err(Error::InvalidConfig("index.writer_threads must be at least 1".into()));
        }
        if self.crawl.queue_depth == 0 {
            return Err(Error::InvalidConfig("crawl.queue_depth must be at least 1".into()));
        }
        if self.crawl.header_len == 0 {
            return Err(Error::InvalidConfig("crawl.header_len must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Index directory; relative names resolve against the working directory.
    pub name: String,
    /// Pending documents that trigger a synchronous commit.
    pub batch_size: usize,
    /// Upper bound on hits returned by a single query.
    pub max_hits: usize,
    pub writer_memory_bytes: usize,
    pub writer_threads: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_INDEX_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_hits: DEFAULT_MAX_HITS,
            writer_memory_bytes: DEFAULT_WRITER_MEMORY_BYTES,
            writer_threads: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// In-process tag reading.
    Lofty,
    /// A long-lived `exiftool -stay_open` child process.
    Exiftool,
    /// No tag reading; only path-derived fields are indexed.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub header_len: usize,
    /// Capacity of the crawler's document queue.
    pub queue_depth: usize,
    pub follow_links: bool,
    pub extractor: ExtractorKind,
    pub exiftool_path: String,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            header_len: DEFAULT_HEADER_LEN,
            queue_depth: 1,
            follow_links: false,
            extractor: ExtractorKind::Lofty,
            exiftool_path: "exiftool".to_string(),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
