//! Source for WordPress anime-streaming themes.
//!
//! Covers the widely cloned theme family whose markup uses `.bs` result
//! cards, a `div.eplister` episode list and a `select.mirror` dropdown of
//! base64 iframe payloads. One instance per site, parameterized by base URL
//! and search path.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rayon::prelude::*;
use scraper::{ElementRef, Selector};
use tracing::info;

use super::mirror::{providers_from_mirrors, MirrorOption, MirrorPolicy};
use super::SourceProvider;
use crate::error::{Error, Result};
use crate::html::{self, absolutize, Document};
use crate::http_client::PageFetcher;
use crate::models::{EpisodeInfo, ShowInfo, StreamProvider};

const SEARCH_RESULT: &str = ".bs > div > a";
const EPISODE_ROW: &str = "div.eplister > ul > li > a";
const MIRROR_OPTION: &str = "select.mirror option";

pub struct WpAnimeSource {
    base_url: String,
    search_path: String,
    fetcher: Arc<dyn PageFetcher>,
    policy: MirrorPolicy,
    parallel: bool,
}

impl WpAnimeSource {
    pub fn new(base_url: &str, search_path: &str, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            search_path: search_path.to_string(),
            fetcher,
            policy: MirrorPolicy::default(),
            parallel: false,
        }
    }

    #[must_use]
    pub fn with_mirror_policy(mut self, policy: MirrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Parse episode rows concurrently.
    #[must_use]
    pub fn with_parallel_parsing(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `base_url + search_path + "?s=" + term`, with the term percent-encoded.
    pub fn search_url(&self, term: &str) -> String {
        let path = if self.search_path.starts_with('/') {
            self.search_path.clone()
        } else {
            format!("/{}", self.search_path)
        };
        format!(
            "{}{}?s={}",
            self.base_url,
            path,
            urlencoding::encode(term.trim())
        )
    }
}

#[async_trait]
impl SourceProvider for WpAnimeSource {
    fn kind(&self) -> &'static str {
        "wpanime"
    }

    async fn search(&self, term: &str) -> Result<Vec<ShowInfo>> {
        let url = self.search_url(term);
        info!("[Search] URL: {url}");
        let body = self.fetcher.scoped().fetch_text(&url).await?;
        let shows = parse_search_results(&body, &url)?;
        info!("[Search] Total results: {}", shows.len());
        Ok(shows)
    }

    async fn get_episodes(&self, show_url: &str) -> Result<Vec<EpisodeInfo>> {
        info!("[Episodes] Fetching from URL: {show_url}");
        let body = self.fetcher.scoped().fetch_text(show_url).await?;
        let episodes = parse_episodes(&body, show_url, self.parallel)?;
        info!("[Episodes] Found total episodes: {}", episodes.len());
        Ok(episodes)
    }

    async fn get_stream_providers(&self, episode_url: &str) -> Result<Vec<StreamProvider>> {
        info!("[Providers] URL: {episode_url}");
        let body = self.fetcher.scoped().fetch_text(episode_url).await?;
        let options = parse_mirror_options(&body)?;
        let providers = providers_from_mirrors(&options, self.policy);
        info!(
            "[Providers] {} of {} mirror options usable",
            providers.len(),
            options.len()
        );
        if providers.is_empty() {
            return Err(Error::NoProvidersFound(episode_url.to_string()));
        }
        Ok(providers)
    }
}

/// Show cards on a search results page.
pub fn parse_search_results(body: &str, page_url: &str) -> Result<Vec<ShowInfo>> {
    let doc = Document::parse(body);
    let img = html::selector("img")?;

    let shows = doc
        .query(SEARCH_RESULT)?
        .iter()
        .map(|a| {
            let mut title = html::attr(a, "title");
            if title.is_empty() {
                title = html::attr(a, "oldtitle");
            }
            ShowInfo {
                title: title.trim().to_string(),
                url: absolutize(page_url, &html::attr(a, "href")),
                description: html::text(a),
                thumbnail: absolutize(page_url, &html::child_attr(a, &img, "src")),
            }
        })
        .filter(|show| !show.url.is_empty())
        .collect();

    Ok(shows)
}

struct EpisodeSelectors {
    title: Selector,
    number: Selector,
    date: Selector,
}

impl EpisodeSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            title: html::selector(".epl-title")?,
            number: html::selector(".epl-num")?,
            date: html::selector(".epl-date")?,
        })
    }

    fn episode(&self, a: &ElementRef<'_>, page_url: &str) -> EpisodeInfo {
        EpisodeInfo {
            title: html::child_text(a, &self.title),
            url: absolutize(page_url, &html::attr(a, "href")),
            number: html::child_text(a, &self.number),
            date: html::child_text(a, &self.date),
            provider: "default".to_string(),
        }
    }
}

/// Episode rows of a show page, in markup order.
///
/// With `parallel`, each row is re-parsed and extracted on the rayon pool;
/// results are collected under a mutex and re-sorted by row index.
pub fn parse_episodes(body: &str, page_url: &str, parallel: bool) -> Result<Vec<EpisodeInfo>> {
    let doc = Document::parse(body);
    let sels = EpisodeSelectors::new()?;
    let rows = doc.query(EPISODE_ROW)?;

    if !parallel {
        return Ok(rows.iter().map(|a| sels.episode(a, page_url)).collect());
    }

    let fragments: Vec<String> = rows.iter().map(ElementRef::html).collect();
    let parsed = Mutex::new(Vec::with_capacity(fragments.len()));

    fragments
        .par_iter()
        .enumerate()
        .try_for_each(|(index, fragment)| -> Result<()> {
            let row = Document::fragment(fragment);
            if let Some(a) = row.query("a")?.first() {
                let episode = sels.episode(a, page_url);
                parsed
                    .lock()
                    .map_err(|_| Error::Extraction("episode buffer poisoned".into()))?
                    .push((index, episode));
            }
            Ok(())
        })?;

    let mut parsed = parsed
        .into_inner()
        .map_err(|_| Error::Extraction("episode buffer poisoned".into()))?;
    parsed.sort_by_key(|(index, _)| *index);
    Ok(parsed.into_iter().map(|(_, episode)| episode).collect())
}

/// Every `<option>` of the mirror dropdown, placeholder included.
pub fn parse_mirror_options(body: &str) -> Result<Vec<MirrorOption>> {
    let doc = Document::parse(body);
    Ok(doc
        .query(MIRROR_OPTION)?
        .iter()
        .map(|opt| MirrorOption::new(html::text(opt), html::attr(opt, "value")))
        .collect())
}
