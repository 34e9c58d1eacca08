//! Stream resolver trait.
//!
//! A [`StreamResolver`] knows how to turn an embed URL from one video host
//! into concrete media URLs (one per published resolution).

use async_trait::async_trait;

use crate::error::Result;
use crate::models::VideoQuality;

/// Resolver for a single video host.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Resolver name for logs (e.g., `"rumble"`).
    fn name(&self) -> &'static str;

    /// Qualities available behind `embed_url`, best first.
    ///
    /// Fails with [`crate::Error::Extraction`] when the host page loads but
    /// carries no usable manifest.
    async fn resolve(&self, embed_url: &str) -> Result<Vec<VideoQuality>>;
}
