//! Background work for the navigator.
//!
//! Each forward step becomes one spawned task that runs a single pipeline
//! call and posts an [`Outcome`] back on a channel. At most one task is in
//! flight: dispatching a new request cancels the previous one through its
//! [`CancellationToken`], and a cancelled task never reports.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{EpisodeInfo, ShowInfo, StreamProvider, VideoQuality};
use crate::source::SourceRegistry;
use crate::stream::ResolverRegistry;

/// Identifies one dispatched fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

/// The pipeline call a stage needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchKind {
    Search { source: String, term: String },
    Episodes { source: String, show_url: String },
    Providers { source: String, episode_url: String },
    Qualities { provider: StreamProvider },
}

impl FetchKind {
    /// URL (or term) the call is about, for logs and timeout errors.
    pub fn target(&self) -> &str {
        match self {
            FetchKind::Search { term, .. } => term,
            FetchKind::Episodes { show_url, .. } => show_url,
            FetchKind::Providers { episode_url, .. } => episode_url,
            FetchKind::Qualities { provider } => &provider.embed_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: Ticket,
    pub kind: FetchKind,
}

/// Result data of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Shows(Vec<ShowInfo>),
    Episodes(Vec<EpisodeInfo>),
    Providers(Vec<StreamProvider>),
    Qualities(Vec<VideoQuality>),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Shows(_) => "shows",
            Payload::Episodes(_) => "episodes",
            Payload::Providers(_) => "providers",
            Payload::Qualities(_) => "qualities",
        }
    }
}

/// A finished fetch, tagged with the ticket it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub ticket: Ticket,
    pub result: Result<Payload>,
}

/// Runs fetch requests on the tokio runtime.
pub struct Dispatcher {
    sources: Arc<SourceRegistry>,
    resolvers: Arc<ResolverRegistry>,
    tx: UnboundedSender<Outcome>,
    in_flight: Option<(Ticket, CancellationToken)>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        sources: Arc<SourceRegistry>,
        resolvers: Arc<ResolverRegistry>,
        timeout: Duration,
    ) -> (Self, UnboundedReceiver<Outcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            sources,
            resolvers,
            tx,
            in_flight: None,
            timeout,
        };
        (dispatcher, rx)
    }

    /// Start `request`, superseding whatever was in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, request: FetchRequest) {
        self.cancel_all();

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let sources = self.sources.clone();
        let resolvers = self.resolvers.clone();
        let tx = self.tx.clone();
        let timeout = self.timeout;
        let ticket = request.ticket;

        info!(?ticket, target = request.kind.target(), "Dispatching fetch");
        tokio::spawn(async move {
            let target = request.kind.target().to_string();
            tokio::select! {
                () = cancelled.cancelled() => {
                    debug!(?ticket, "Fetch cancelled");
                }
                result = tokio::time::timeout(timeout, run(&sources, &resolvers, request.kind)) => {
                    let result = result.unwrap_or_else(|_| {
                        Err(Error::fetch(target, format!("timed out after {}s", timeout.as_secs())))
                    });
                    // Receiver gone means the session ended.
                    let _ = tx.send(Outcome { ticket, result });
                }
            }
        });

        self.in_flight = Some((ticket, token));
    }

    /// Cancel the fetch issued under `ticket`, if it is still in flight.
    pub fn abort(&mut self, ticket: Ticket) {
        if self.in_flight.as_ref().is_some_and(|(t, _)| *t == ticket) {
            self.cancel_all();
        }
    }

    /// Forget `ticket` once its outcome has arrived.
    pub fn settle(&mut self, ticket: Ticket) {
        if self.in_flight.as_ref().is_some_and(|(t, _)| *t == ticket) {
            self.in_flight = None;
        }
    }

    pub fn cancel_all(&mut self) {
        if let Some((ticket, token)) = self.in_flight.take() {
            debug!(?ticket, "Cancelling in-flight fetch");
            token.cancel();
        }
    }

    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight.as_ref().map(|(t, _)| *t)
    }
}

async fn run(sources: &SourceRegistry, resolvers: &ResolverRegistry, kind: FetchKind) -> Result<Payload> {
    match kind {
        FetchKind::Search { source, term } => {
            let source = sources.get(&source)?;
            source.search(&term).await.map(Payload::Shows)
        }
        FetchKind::Episodes { source, show_url } => {
            let source = sources.get(&source)?;
            source.get_episodes(&show_url).await.map(Payload::Episodes)
        }
        FetchKind::Providers {
            source,
            episode_url,
        } => {
            let source = sources.get(&source)?;
            source
                .get_stream_providers(&episode_url)
                .await
                .map(Payload::Providers)
        }
        FetchKind::Qualities { provider } => resolvers.resolve(&provider).await.map(Payload::Qualities),
    }
}
