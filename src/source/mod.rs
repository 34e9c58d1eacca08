//! Site sources.
//!
//! A [`SourceProvider`] knows how to search one family of sites, list a
//! show's episodes, and decode an episode page into stream providers.
//!
//! # Architecture
//!
//! - [`SourceProvider`]: Async trait, one implementation per site family
//! - [`SourceRegistry`]: Named sources selected by identifier at runtime
//! - [`mirror`]: Mirror payload decoding and host classification
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use anistream::config::Config;
//! use anistream::http_client::HttpFetcher;
//! use anistream::source::SourceRegistry;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::default();
//! let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
//! let registry = SourceRegistry::from_config(&config, fetcher)?;
//!
//! let source = registry.get("donghuastream")?;
//! for show in source.search("martial").await? {
//!     println!("{} -> {}", show.title, show.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mirror;
pub mod wpanime;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http_client::PageFetcher;
use crate::models::{EpisodeInfo, ShowInfo, StreamProvider};

pub use mirror::{MirrorOption, MirrorPolicy};
pub use wpanime::WpAnimeSource;

/// Scraper for one family of streaming sites.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Short lowercase family name (e.g., `"wpanime"`).
    fn kind(&self) -> &'static str;

    /// Search the catalog. No matches is an empty vec, not an error.
    async fn search(&self, term: &str) -> Result<Vec<ShowInfo>>;

    /// Episodes of a show, in markup order.
    async fn get_episodes(&self, show_url: &str) -> Result<Vec<EpisodeInfo>>;

    /// Decoded mirrors of an episode.
    ///
    /// Fails with [`Error::NoProvidersFound`] when the page loaded but nothing
    /// usable was decoded.
    async fn get_stream_providers(&self, episode_url: &str) -> Result<Vec<StreamProvider>>;
}

/// A source as listed on the source-select screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub id: String,
    pub name: String,
}

struct Registered {
    name: String,
    provider: Arc<dyn SourceProvider>,
}

/// Named sources, ordered by identifier.
#[derive(Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, Registered>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate every configured source.
    pub fn from_config(config: &Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let policy = MirrorPolicy {
            skip_placeholder: config.mirrors.skip_placeholder,
        };
        let mut registry = Self::new();
        for (id, source) in &config.sources {
            let provider: Arc<dyn SourceProvider> = match source.kind.as_str() {
                "wpanime" => Arc::new(
                    WpAnimeSource::new(&source.base_url, &source.search_path, fetcher.clone())
                        .with_mirror_policy(policy)
                        .with_parallel_parsing(config.fetch.parallel),
                ),
                other => {
                    return Err(Error::Config(format!(
                        "source {id:?} has unknown type {other:?}"
                    )))
                }
            };
            registry.register(id, &source.name, provider);
        }
        Ok(registry)
    }

    /// Add or replace a source.
    pub fn register(&mut self, id: &str, name: &str, provider: Arc<dyn SourceProvider>) {
        tracing::debug!("Registered source {id} ({})", provider.kind());
        self.sources.insert(
            id.to_string(),
            Registered {
                name: name.to_string(),
                provider,
            },
        );
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn SourceProvider>> {
        self.sources
            .get(id)
            .map(|r| r.provider.clone())
            .ok_or_else(|| Error::UnknownSource(id.to_string()))
    }

    pub fn entries(&self) -> Vec<SourceEntry> {
        self.sources
            .iter()
            .map(|(id, r)| SourceEntry {
                id: id.clone(),
                name: r.name.clone(),
            })
            .collect()
    }

    /// First registered identifier, used when none is given.
    pub fn default_id(&self) -> Option<&str> {
        self.sources.keys().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopFetcher;

    #[async_trait]
    impl PageFetcher for NoopFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            Err(Error::fetch(url, "offline"))
        }
    }

    fn config_with(ids: &[&str]) -> Config {
        let mut toml_str = String::new();
        for id in ids {
            toml_str.push_str(&format!(
                "[sources.{id}]\nname = \"{id} site\"\ntype = \"wpanime\"\nbase_url = \"https://{id}.example\"\n\n"
            ));
        }
        Config::parse(&toml_str).unwrap()
    }

    #[test]
    fn registry_builds_from_config_in_id_order() {
        let registry = SourceRegistry::from_config(&config_with(&["zeta", "alpha"]), Arc::new(NoopFetcher)).unwrap();
        assert_eq!(registry.len(), 2);
        let entries = registry.entries();
        assert_eq!(entries[0].id, "alpha");
        assert_eq!(entries[0].name, "alpha site");
        assert_eq!(entries[1].id, "zeta");
        assert_eq!(registry.default_id(), Some("alpha"));
        assert_eq!(registry.get("alpha").unwrap().kind(), "wpanime");
    }

    #[test]
    fn unknown_source_id() {
        let registry = SourceRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(registry.get("nope"), Err(Error::UnknownSource(id)) if id == "nope"));
    }

    #[test]
    fn unknown_source_type_rejected() {
        let mut config = config_with(&["x"]);
        if let Some(source) = config.sources.get_mut("x") {
            source.kind = "other".into();
        }
        assert!(matches!(
            SourceRegistry::from_config(&config, Arc::new(NoopFetcher)),
            Err(Error::Config(_))
        ));
    }
}
