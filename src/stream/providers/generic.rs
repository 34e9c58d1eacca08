//! Identity resolver for hosts without dedicated handling

use async_trait::async_trait;

use crate::error::Result;
use crate::models::VideoQuality;
use crate::stream::resolver::StreamResolver;

/// Resolution label used when the host publishes none.
pub const SOURCE_RESOLUTION: &str = "source";

/// Hands the embed URL to the player unchanged.
pub struct IdentityResolver;

impl IdentityResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamResolver for IdentityResolver {
    fn name(&self) -> &'static str {
        "identity"
    }

    async fn resolve(&self, embed_url: &str) -> Result<Vec<VideoQuality>> {
        Ok(vec![VideoQuality {
            url: embed_url.to_string(),
            resolution: SOURCE_RESOLUTION.to_string(),
            size: 0,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_echoes_url() {
        let resolver = IdentityResolver::new();
        let qualities = resolver
            .resolve("https://ok.ru/videoembed/123")
            .await
            .unwrap();
        assert_eq!(
            qualities,
            vec![VideoQuality {
                url: "https://ok.ru/videoembed/123".into(),
                resolution: "source".into(),
                size: 0,
            }]
        );
    }

    #[test]
    fn test_name() {
        assert_eq!(IdentityResolver::new().name(), "identity");
    }
}
