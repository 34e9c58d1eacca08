mod browse;
mod lookup;

use std::sync::Arc;

use anyhow::{Context as _, Result};

use anistream::source::SourceProvider;
use anistream::{Config, ExternalPlayer, HttpFetcher, ResolverRegistry, SourceRegistry};

pub use browse::cmd_browse;
pub use lookup::{cmd_episodes, cmd_providers, cmd_resolve, cmd_search, cmd_sources};

/// Everything a command needs, built once from the config.
pub struct Context {
    pub config: Config,
    pub sources: Arc<SourceRegistry>,
    pub resolvers: Arc<ResolverRegistry>,
}

impl Context {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch).context("failed to build HTTP client")?);
        let sources = SourceRegistry::from_config(&config, fetcher.clone())?;
        let resolvers = ResolverRegistry::with_defaults(fetcher, config.resolve.passthrough_unsupported);
        Ok(Self {
            config,
            sources: Arc::new(sources),
            resolvers: Arc::new(resolvers),
        })
    }

    pub fn player(&self) -> ExternalPlayer {
        ExternalPlayer::new(&self.config.default_player, &self.config.player_paths)
    }

    /// The named source, or the first configured one.
    pub fn source(&self, id: Option<&str>) -> Result<(String, Arc<dyn SourceProvider>)> {
        let id = match id {
            Some(id) => id.to_string(),
            None => self
                .sources
                .default_id()
                .map(str::to_string)
                .context("no sources configured")?,
        };
        let source = self.sources.get(&id)?;
        Ok((id, source))
    }
}
