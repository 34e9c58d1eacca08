//! Interactive browsing.
//!
//! - [`state`]: the [`Navigator`] state machine (pure, no I/O)
//! - [`dispatch`]: runs the navigator's fetches as cancellable tasks
//! - [`Session`]: wires both to a [`MediaPlayer`]
//!
//! A front end feeds [`Input`]s to [`Session::input`] and every
//! [`Outcome`] received from the channel to [`Session::apply`], then renders
//! [`Session::navigator`].

pub mod dispatch;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

use crate::error::Error;
use crate::models::VideoQuality;
use crate::player::MediaPlayer;
use crate::source::SourceRegistry;
use crate::stream::ResolverRegistry;

pub use dispatch::{Dispatcher, FetchKind, FetchRequest, Outcome, Payload, Ticket};
pub use state::{Effect, Input, Listing, Loading, NavOptions, Navigator, Stage};

/// What the front end should do after an input.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue,
    Exit(Exit),
}

/// Why the session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Exit {
    Quit,
    /// The player was started with this quality.
    Played(VideoQuality),
    /// The player could not be started; the program still exits.
    PlaybackFailed { quality: VideoQuality, error: Error },
}

/// A navigator bound to live sources, resolvers and a player.
pub struct Session {
    navigator: Navigator,
    dispatcher: Dispatcher,
    player: Arc<dyn MediaPlayer>,
}

impl Session {
    pub fn new(
        sources: Arc<SourceRegistry>,
        resolvers: Arc<ResolverRegistry>,
        player: Arc<dyn MediaPlayer>,
        options: NavOptions,
        timeout: Duration,
    ) -> (Self, UnboundedReceiver<Outcome>) {
        let navigator = Navigator::new(sources.entries(), options);
        let (dispatcher, rx) = Dispatcher::new(sources, resolvers, timeout);
        let session = Self {
            navigator,
            dispatcher,
            player,
        };
        (session, rx)
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    /// Handle one operator input and carry out its effect.
    pub fn input(&mut self, input: Input) -> Flow {
        match self.navigator.handle(input) {
            None => Flow::Continue,
            Some(Effect::Fetch(request)) => {
                self.dispatcher.dispatch(request);
                Flow::Continue
            }
            Some(Effect::Abort(ticket)) => {
                self.dispatcher.abort(ticket);
                Flow::Continue
            }
            Some(Effect::Play(quality)) => match self.player.play(&quality.url) {
                Ok(()) => {
                    info!(resolution = %quality.resolution, "Playback started: {}", quality.url);
                    Flow::Exit(Exit::Played(quality))
                }
                Err(error) => {
                    error!("{error}");
                    Flow::Exit(Exit::PlaybackFailed { quality, error })
                }
            },
            Some(Effect::Quit) => {
                self.dispatcher.cancel_all();
                Flow::Exit(Exit::Quit)
            }
        }
    }

    /// Apply a finished fetch. Returns `false` if it was stale.
    pub fn apply(&mut self, outcome: Outcome) -> bool {
        self.dispatcher.settle(outcome.ticket);
        self.navigator.apply(outcome)
    }
}
