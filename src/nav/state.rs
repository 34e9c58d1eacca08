//! Navigation state machine.
//!
//! [`Navigator`] owns every piece of browsing state and reacts to operator
//! [`Input`] by mutating itself and returning at most one [`Effect`] for the
//! caller to carry out. It never performs I/O: fetches come back later as
//! [`Outcome`]s tagged with the ticket they were issued under, and anything
//! not matching the current ticket is dropped.
//!
//! Stages run `SourceSelect -> ShowList -> EpisodeList -> ProviderList ->
//! QualityList -> Playback`. A forward step enters the next stage in a loading
//! state and issues exactly one fetch. A failed fetch, or a cancel, returns to
//! the previous stage and discards what the abandoned stage owned.

use tracing::{debug, warn};

use super::dispatch::{FetchKind, FetchRequest, Outcome, Payload, Ticket};
use crate::error::Error;
use crate::models::{EpisodeInfo, ShowInfo, StreamProvider, VideoQuality};
use crate::source::SourceEntry;

/// One screen of the browsing flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SourceSelect,
    ShowList,
    EpisodeList,
    ProviderList,
    QualityList,
    /// Terminal: the player has been asked to start.
    Playback,
}

impl Stage {
    /// The stage a cancel or failure returns to.
    pub fn previous(self) -> Stage {
        match self {
            Stage::SourceSelect | Stage::ShowList => Stage::SourceSelect,
            Stage::EpisodeList => Stage::ShowList,
            Stage::ProviderList => Stage::EpisodeList,
            Stage::QualityList => Stage::ProviderList,
            Stage::Playback => Stage::QualityList,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::SourceSelect => "Available Sources",
            Stage::ShowList => "Shows",
            Stage::EpisodeList => "Episodes",
            Stage::ProviderList => "Stream Providers",
            Stage::QualityList => "Available Qualities",
            Stage::Playback => "Playback",
        }
    }
}

/// Operator intent, already decoupled from key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Up,
    Down,
    Confirm,
    Cancel,
    /// Toggle focus of the search field.
    FocusSearch,
    Char(char),
    Backspace,
    /// Pick an entry by its one-based number.
    Choose(usize),
    Quit,
}

/// Work requested by the navigator.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(FetchRequest),
    /// Drop interest in an in-flight fetch.
    Abort(Ticket),
    Play(VideoQuality),
    Quit,
}

/// A list with a highlighted entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
        }
    }
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The highlighted entry.
    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.cursor)
    }

    /// The highlighted entry, or `InvalidSelection` when there is none.
    pub fn current(&self) -> Result<&T, Error> {
        self.selected().ok_or(Error::InvalidSelection {
            index: self.cursor + 1,
            len: self.items.len(),
        })
    }

    pub fn up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
        }
    }

    /// Highlight entry `n` (one-based).
    pub fn choose(&mut self, n: usize) -> Result<&T, Error> {
        if n == 0 || n > self.items.len() {
            return Err(Error::InvalidSelection {
                index: n,
                len: self.items.len(),
            });
        }
        self.cursor = n - 1;
        Ok(&self.items[self.cursor])
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }
}

/// Fetch currently awaited by the active stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loading {
    pub ticket: Ticket,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavOptions {
    /// Reverse episode lists so the oldest comes first.
    pub chronological: bool,
}

impl Default for NavOptions {
    fn default() -> Self {
        Self {
            chronological: true,
        }
    }
}

/// The browsing state machine.
#[derive(Debug)]
pub struct Navigator {
    stage: Stage,
    options: NavOptions,

    sources: Listing<SourceEntry>,
    search: String,
    search_focused: bool,

    selected_source: Option<SourceEntry>,
    selected_show: Option<ShowInfo>,
    selected_episode: Option<EpisodeInfo>,
    selected_provider: Option<StreamProvider>,

    shows: Listing<ShowInfo>,
    episodes: Listing<EpisodeInfo>,
    providers: Listing<StreamProvider>,
    qualities: Listing<VideoQuality>,

    loading: Option<Loading>,
    last_error: Option<Error>,
    next_ticket: u64,
}

impl Navigator {
    pub fn new(sources: Vec<SourceEntry>, options: NavOptions) -> Self {
        Self {
            stage: Stage::SourceSelect,
            options,
            sources: Listing::new(sources),
            search: String::new(),
            search_focused: false,
            selected_source: None,
            selected_show: None,
            selected_episode: None,
            selected_provider: None,
            shows: Listing::default(),
            episodes: Listing::default(),
            providers: Listing::default(),
            qualities: Listing::default(),
            loading: None,
            last_error: None,
            next_ticket: 0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn sources(&self) -> &Listing<SourceEntry> {
        &self.sources
    }

    pub fn search_text(&self) -> &str {
        &self.search
    }

    pub fn search_focused(&self) -> bool {
        self.search_focused
    }

    pub fn shows(&self) -> &Listing<ShowInfo> {
        &self.shows
    }

    pub fn episodes(&self) -> &Listing<EpisodeInfo> {
        &self.episodes
    }

    pub fn providers(&self) -> &Listing<StreamProvider> {
        &self.providers
    }

    pub fn qualities(&self) -> &Listing<VideoQuality> {
        &self.qualities
    }

    pub fn selected_source(&self) -> Option<&SourceEntry> {
        self.selected_source.as_ref()
    }

    pub fn selected_show(&self) -> Option<&ShowInfo> {
        self.selected_show.as_ref()
    }

    pub fn selected_episode(&self) -> Option<&EpisodeInfo> {
        self.selected_episode.as_ref()
    }

    pub fn selected_provider(&self) -> Option<&StreamProvider> {
        self.selected_provider.as_ref()
    }

    pub fn loading(&self) -> Option<&Loading> {
        self.loading.as_ref()
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Prefill the search field.
    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
    }

    /// React to one operator input.
    pub fn handle(&mut self, input: Input) -> Option<Effect> {
        if input == Input::Quit {
            return Some(Effect::Quit);
        }
        if self.stage == Stage::Playback {
            return None;
        }
        if self.loading.is_some() {
            return match input {
                Input::Cancel => self.cancel(),
                _ => None,
            };
        }
        if self.stage == Stage::SourceSelect && self.search_focused {
            return self.handle_search_field(input);
        }

        match input {
            Input::Up => {
                self.move_cursor(true);
                None
            }
            Input::Down => {
                self.move_cursor(false);
                None
            }
            Input::Confirm => {
                self.last_error = None;
                self.confirm_or_report()
            }
            Input::Choose(n) => {
                self.last_error = None;
                if let Err(e) = self.choose(n) {
                    self.last_error = Some(e);
                    return None;
                }
                self.confirm_or_report()
            }
            Input::Cancel => {
                self.last_error = None;
                self.cancel()
            }
            Input::FocusSearch if self.stage == Stage::SourceSelect => {
                self.search_focused = true;
                None
            }
            Input::FocusSearch | Input::Char(_) | Input::Backspace | Input::Quit => None,
        }
    }

    fn handle_search_field(&mut self, input: Input) -> Option<Effect> {
        match input {
            Input::Char(c) => self.search.push(c),
            Input::Backspace => {
                self.search.pop();
            }
            Input::FocusSearch | Input::Cancel => self.search_focused = false,
            Input::Confirm => {
                self.last_error = None;
                return self.confirm_or_report();
            }
            Input::Up | Input::Down | Input::Choose(_) | Input::Quit => {}
        }
        None
    }

    fn move_cursor(&mut self, up: bool) {
        fn step<T>(list: &mut Listing<T>, up: bool) {
            if up {
                list.up();
            } else {
                list.down();
            }
        }
        match self.stage {
            Stage::SourceSelect => step(&mut self.sources, up),
            Stage::ShowList => step(&mut self.shows, up),
            Stage::EpisodeList => step(&mut self.episodes, up),
            Stage::ProviderList => step(&mut self.providers, up),
            Stage::QualityList => step(&mut self.qualities, up),
            Stage::Playback => {}
        }
    }

    fn choose(&mut self, n: usize) -> Result<(), Error> {
        match self.stage {
            Stage::SourceSelect => self.sources.choose(n).map(|_| ()),
            Stage::ShowList => self.shows.choose(n).map(|_| ()),
            Stage::EpisodeList => self.episodes.choose(n).map(|_| ()),
            Stage::ProviderList => self.providers.choose(n).map(|_| ()),
            Stage::QualityList => self.qualities.choose(n).map(|_| ()),
            Stage::Playback => Ok(()),
        }
    }

    fn confirm_or_report(&mut self) -> Option<Effect> {
        self.confirm().unwrap_or_else(|e| {
            self.last_error = Some(e);
            None
        })
    }

    /// Step forward from the highlighted entry of the current stage.
    fn confirm(&mut self) -> Result<Option<Effect>, Error> {
        let effect = match self.stage {
            Stage::SourceSelect => {
                let source = self.sources.current()?.clone();
                let term = self.search.trim().to_string();
                if term.is_empty() {
                    self.search_focused = true;
                    return Ok(None);
                }
                self.search_focused = false;
                let kind = FetchKind::Search {
                    source: source.id.clone(),
                    term,
                };
                self.selected_source = Some(source);
                Some(self.begin(Stage::ShowList, "Searching...", kind))
            }
            Stage::ShowList => {
                let show = self.shows.current()?.clone();
                let kind = FetchKind::Episodes {
                    source: self.source_id(),
                    show_url: show.url.clone(),
                };
                self.selected_show = Some(show);
                Some(self.begin(Stage::EpisodeList, "Loading episodes...", kind))
            }
            Stage::EpisodeList => {
                let episode = self.episodes.current()?.clone();
                let kind = FetchKind::Providers {
                    source: self.source_id(),
                    episode_url: episode.url.clone(),
                };
                self.selected_episode = Some(episode);
                Some(self.begin(Stage::ProviderList, "Loading stream providers...", kind))
            }
            Stage::ProviderList => {
                let provider = self.providers.current()?.clone();
                let message = format!("Resolving {}...", provider.name);
                let kind = FetchKind::Qualities {
                    provider: provider.clone(),
                };
                self.selected_provider = Some(provider);
                Some(self.begin(Stage::QualityList, &message, kind))
            }
            Stage::QualityList => {
                let quality = self.qualities.current()?.clone();
                self.stage = Stage::Playback;
                Some(Effect::Play(quality))
            }
            Stage::Playback => None,
        };
        Ok(effect)
    }

    fn source_id(&self) -> String {
        self.selected_source
            .as_ref()
            .map(|s| s.id.clone())
            .unwrap_or_default()
    }

    /// Enter `target` in a loading state and issue its one fetch.
    fn begin(&mut self, target: Stage, message: &str, kind: FetchKind) -> Effect {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        debug!(?ticket, ?target, "Entering stage");
        self.stage = target;
        self.loading = Some(Loading {
            ticket,
            message: message.to_string(),
        });
        Effect::Fetch(FetchRequest { ticket, kind })
    }

    /// Leave the current stage, aborting its fetch if one is pending.
    fn cancel(&mut self) -> Option<Effect> {
        if self.stage == Stage::SourceSelect {
            return None;
        }
        let abort = self.loading.take().map(|l| Effect::Abort(l.ticket));
        self.retreat();
        abort
    }

    /// Return to the previous stage, discarding what the current one owns.
    fn retreat(&mut self) {
        match self.stage {
            Stage::SourceSelect => {}
            Stage::ShowList => {
                self.shows.clear();
                self.selected_source = None;
            }
            Stage::EpisodeList => {
                self.episodes.clear();
                self.selected_show = None;
            }
            Stage::ProviderList => {
                self.providers.clear();
                self.selected_episode = None;
            }
            Stage::QualityList => {
                self.qualities.clear();
                self.selected_provider = None;
            }
            Stage::Playback => {}
        }
        self.stage = self.stage.previous();
    }

    /// Apply a fetch result. Returns `false` when the outcome is stale.
    pub fn apply(&mut self, outcome: Outcome) -> bool {
        let current = self.loading.as_ref().map(|l| l.ticket);
        if current != Some(outcome.ticket) {
            debug!(ticket = ?outcome.ticket, ?current, "Discarding stale outcome");
            return false;
        }
        self.loading = None;

        let payload = match outcome.result {
            Ok(payload) => payload,
            Err(e) => {
                warn!(stage = ?self.stage, "Stage failed: {e}");
                self.last_error = Some(e);
                self.retreat();
                return true;
            }
        };

        match (self.stage, payload) {
            (Stage::ShowList, Payload::Shows(shows)) => self.shows = Listing::new(shows),
            (Stage::EpisodeList, Payload::Episodes(mut episodes)) => {
                if self.options.chronological {
                    episodes.reverse();
                }
                self.episodes = Listing::new(episodes);
            }
            (Stage::ProviderList, Payload::Providers(providers)) => {
                self.providers = Listing::new(providers);
            }
            (Stage::QualityList, Payload::Qualities(qualities)) => {
                self.qualities = Listing::new(qualities);
            }
            (stage, payload) => {
                warn!(?stage, payload = payload.kind(), "Payload does not belong to stage");
                return false;
            }
        }
        true
    }
}
