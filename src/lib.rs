//! `anistream` - Browse and play episodes from WordPress anime streaming sites
//!
//! # Pipeline
//!
//! - **Search**: query a configured site and list matching shows
//! - **Episodes**: list the episodes of a show
//! - **Providers**: decode an episode's mirror dropdown into embed URLs
//! - **Resolve**: turn an embed URL into playable media URLs per resolution
//! - **Play**: hand the chosen URL to an external player
//!
//! The [`nav`] module drives the pipeline interactively; [`tui`] renders it.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use anistream::{Config, HttpFetcher, ResolverRegistry, SourceRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
//!     let sources = SourceRegistry::from_config(&config, fetcher.clone())?;
//!     let resolvers = ResolverRegistry::with_defaults(fetcher, false);
//!
//!     let source = sources.get("donghuastream")?;
//!     let shows = source.search("soul land").await?;
//!     let episodes = source.get_episodes(&shows[0].url).await?;
//!     let providers = source.get_stream_providers(&episodes[0].url).await?;
//!     for quality in resolvers.resolve(&providers[0]).await? {
//!         println!("{} {}", quality.resolution, quality.url);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod html;
pub mod http_client;
pub mod logging;
pub mod models;
pub mod nav;
pub mod player;
pub mod source;
pub mod stream;
pub mod tui;

pub use config::Config;
pub use error::{Error, Result};
pub use http_client::{HttpFetcher, PageFetcher};
pub use models::{EpisodeInfo, Processor, ShowInfo, StreamProvider, VideoQuality};
pub use nav::{Input, NavOptions, Navigator, Session, Stage};
pub use player::{ExternalPlayer, MediaPlayer};
pub use source::{SourceProvider, SourceRegistry};
pub use stream::{ResolverRegistry, StreamResolver};

/// Version of anistream
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
