//! Page fetching.
//!
//! [`PageFetcher`] is the transport half of the HTML adapter: one call, one
//! page body. [`HttpFetcher`] is the reqwest-backed implementation:
//! - Connection pooling with keep-alive
//! - Brotli, Gzip compression (auto-negotiated)
//! - Cookie jar shared across stages
//! - Configurable user agent, redirect cap and revisit policy
//!
//! Revisit tracking is per pipeline call: each stage operation takes a
//! [`PageFetcher::scoped`] fetcher, and the visited set dies with it.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::config::FetchConfig;
use crate::error::{Error, Result};

/// Fetches a page body by URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// A fetcher for one pipeline call.
    ///
    /// Fetchers with per-call state start it fresh here; the rest hand back
    /// themselves.
    fn scoped(&self) -> Box<dyn PageFetcher + '_> {
        Box::new(Borrowed(self))
    }
}

struct Borrowed<'a, F: ?Sized>(&'a F);

#[async_trait]
impl<F: PageFetcher + ?Sized> PageFetcher for Borrowed<'_, F> {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.0.fetch_text(url).await
    }

    fn scoped(&self) -> Box<dyn PageFetcher + '_> {
        Box::new(Borrowed(self.0))
    }
}

/// HTTP fetcher backed by a shared reqwest client.
pub struct HttpFetcher {
    client: Client,
    allow_revisit: bool,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let redirect = if config.max_depth == 0 {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::limited(config.max_depth)
        };

        let client = Client::builder()
            // ═══════════════════════════════════════════════════════════════
            // CONNECTION
            // ═══════════════════════════════════════════════════════════════
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            // ═══════════════════════════════════════════════════════════════
            // COMPRESSION (auto-negotiated via Accept-Encoding)
            // ═══════════════════════════════════════════════════════════════
            .brotli(true)
            .gzip(true)
            .deflate(true)
            // ═══════════════════════════════════════════════════════════════
            // IDENTITY
            // ═══════════════════════════════════════════════════════════════
            .user_agent(config.user_agent.clone())
            // ═══════════════════════════════════════════════════════════════
            // TIMEOUTS
            // ═══════════════════════════════════════════════════════════════
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            // ═══════════════════════════════════════════════════════════════
            // REDIRECTS & COOKIES
            // ═══════════════════════════════════════════════════════════════
            .redirect(redirect)
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            allow_revisit: config.allow_revisit,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("Fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e))?;

        let status = response.status();
        info!(status = %status, version = ?response.version(), "Response received");
        if !status.is_success() {
            return Err(Error::fetch(url, format!("HTTP {status}")));
        }

        response.text().await.map_err(|e| Error::fetch(url, e))
    }

    fn scoped(&self) -> Box<dyn PageFetcher + '_> {
        Box::new(CallFetcher {
            inner: self,
            visited: Mutex::new(HashSet::new()),
        })
    }
}

/// [`HttpFetcher`] for one pipeline call, enforcing the revisit policy.
struct CallFetcher<'a> {
    inner: &'a HttpFetcher,
    visited: Mutex<HashSet<String>>,
}

impl CallFetcher<'_> {
    /// Record a visit, refusing repeats when revisits are disabled.
    fn mark_visited(&self, url: &str) -> Result<()> {
        let mut visited = self
            .visited
            .lock()
            .map_err(|_| Error::fetch(url, "visit log poisoned"))?;
        if !visited.insert(url.to_string()) && !self.inner.allow_revisit {
            return Err(Error::fetch(url, "already visited"));
        }
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for CallFetcher<'_> {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.mark_visited(url)?;
        self.inner.fetch_text(url).await
    }
}
