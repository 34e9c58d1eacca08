//! Stream resolution.
//!
//! Turns a decoded [`StreamProvider`] into playable [`VideoQuality`] entries.
//!
//! # Architecture
//!
//! - [`StreamResolver`]: Async trait, one implementation per host
//! - [`ResolverRegistry`]: Maps each [`Processor`] tag to its resolver
//! - [`providers`]: Built-in resolvers (Rumble, identity)
//!
//! A tag with no registered resolver fails with
//! [`Error::UnsupportedProvider`]; nothing guesses on its behalf.

pub mod providers;
pub mod resolver;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::http_client::PageFetcher;
use crate::models::{Processor, StreamProvider, VideoQuality};

pub use providers::{IdentityResolver, RumbleResolver};
pub use resolver::StreamResolver;

/// Resolvers keyed by processor tag.
#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<Processor, Arc<dyn StreamResolver>>,
}

impl ResolverRegistry {
    /// An empty registry; every tag is unsupported until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in resolvers.
    ///
    /// `default` maps to the identity resolver and `rumble` to the Rumble
    /// manifest extractor. With `passthrough_unsupported`, the remaining tags
    /// also hand their embed URL to the player unchanged.
    pub fn with_defaults(fetcher: Arc<dyn PageFetcher>, passthrough_unsupported: bool) -> Self {
        let mut registry = Self::new();
        let identity: Arc<dyn StreamResolver> = Arc::new(IdentityResolver::new());
        registry.register(Processor::Default, identity.clone());
        registry.register(Processor::Rumble, Arc::new(RumbleResolver::new(fetcher)));

        if passthrough_unsupported {
            for tag in [Processor::Youtube, Processor::Dailymotion, Processor::Vimeo] {
                registry.register(tag, identity.clone());
            }
        }
        registry
    }

    /// Add or replace the resolver for `tag`.
    pub fn register(&mut self, tag: Processor, resolver: Arc<dyn StreamResolver>) {
        debug!("Registered resolver {} for {tag}", resolver.name());
        self.resolvers.insert(tag, resolver);
    }

    pub fn supports(&self, tag: Processor) -> bool {
        self.resolvers.contains_key(&tag)
    }

    pub fn get(&self, tag: Processor) -> Result<Arc<dyn StreamResolver>> {
        self.resolvers
            .get(&tag)
            .cloned()
            .ok_or_else(|| Error::UnsupportedProvider(tag.to_string()))
    }

    /// Resolve one provider's embed URL into qualities.
    pub async fn resolve(&self, provider: &StreamProvider) -> Result<Vec<VideoQuality>> {
        let resolver = self.get(provider.processor)?;
        info!(
            provider = %provider.name,
            resolver = resolver.name(),
            "[Resolve] URL: {}",
            provider.embed_url
        );
        let qualities = resolver.resolve(&provider.embed_url).await?;
        info!("[Resolve] Found {} qualities", qualities.len());
        Ok(qualities)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct OfflineFetcher;

    #[async_trait]
    impl PageFetcher for OfflineFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            Err(Error::fetch(url, "offline"))
        }
    }

    fn provider(processor: Processor) -> StreamProvider {
        StreamProvider {
            name: "Mirror".into(),
            embed_url: "https://host.example/embed/1".into(),
            processor,
        }
    }

    #[test]
    fn defaults_cover_rumble_and_identity_only() {
        let registry = ResolverRegistry::with_defaults(Arc::new(OfflineFetcher), false);
        assert!(registry.supports(Processor::Default));
        assert!(registry.supports(Processor::Rumble));
        assert!(!registry.supports(Processor::Youtube));
        assert!(!registry.supports(Processor::Dailymotion));
        assert!(!registry.supports(Processor::Vimeo));
    }

    #[test]
    fn passthrough_covers_every_tag() {
        let registry = ResolverRegistry::with_defaults(Arc::new(OfflineFetcher), true);
        for tag in Processor::ALL {
            assert!(registry.supports(tag), "{tag} should be supported");
        }
    }

    #[tokio::test]
    async fn missing_resolver_is_unsupported_provider() {
        let registry = ResolverRegistry::with_defaults(Arc::new(OfflineFetcher), false);
        let err = registry.resolve(&provider(Processor::Youtube)).await.unwrap_err();
        assert_eq!(err, Error::UnsupportedProvider("youtube".into()));
    }

    #[tokio::test]
    async fn default_tag_echoes_embed_url() {
        let registry = ResolverRegistry::with_defaults(Arc::new(OfflineFetcher), false);
        let qualities = registry.resolve(&provider(Processor::Default)).await.unwrap();
        assert_eq!(qualities.len(), 1);
        assert_eq!(qualities[0].url, "https://host.example/embed/1");
    }

    #[tokio::test]
    async fn resolver_errors_propagate() {
        let registry = ResolverRegistry::with_defaults(Arc::new(OfflineFetcher), false);
        let err = registry.resolve(&provider(Processor::Rumble)).await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }
}
