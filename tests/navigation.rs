//! End-to-end navigation through a [`Session`] with in-memory sources,
//! resolvers and a recording player.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use anistream::nav::{Exit, Flow, Outcome};
use anistream::{
    EpisodeInfo, Error, Input, MediaPlayer, NavOptions, Processor, ResolverRegistry, Session, ShowInfo,
    SourceProvider, SourceRegistry, Stage, StreamProvider, StreamResolver, VideoQuality,
};

#[derive(Default)]
struct FakeSource {
    searches: AtomicUsize,
    episode_calls: AtomicUsize,
    provider_calls: Mutex<Vec<String>>,
}

#[async_trait]
impl SourceProvider for FakeSource {
    fn kind(&self) -> &'static str {
        "fake"
    }

    async fn search(&self, term: &str) -> anistream::Result<Vec<ShowInfo>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok((1..=3)
            .map(|n| ShowInfo {
                title: format!("{term} {n}"),
                url: format!("https://fake.example/anime/show-{n}/"),
                description: String::new(),
                thumbnail: String::new(),
            })
            .collect())
    }

    async fn get_episodes(&self, show_url: &str) -> anistream::Result<Vec<EpisodeInfo>> {
        self.episode_calls.fetch_add(1, Ordering::SeqCst);
        Ok((1..=12)
            .map(|n| EpisodeInfo {
                title: format!("Episode {n}"),
                url: format!("{show_url}ep-{n}/"),
                number: n.to_string(),
                date: String::new(),
                provider: "default".into(),
            })
            .collect())
    }

    async fn get_stream_providers(&self, episode_url: &str) -> anistream::Result<Vec<StreamProvider>> {
        self.provider_calls.lock().unwrap().push(episode_url.to_string());
        if episode_url.ends_with("ep-12/") {
            return Err(Error::NoProvidersFound(episode_url.to_string()));
        }
        let mut providers = vec![StreamProvider {
            name: "Rumble".into(),
            embed_url: "https://rumble.com/embed/v5abc/".into(),
            processor: Processor::Rumble,
        }];
        for n in 1..=3 {
            providers.push(StreamProvider {
                name: format!("Mirror {n}"),
                embed_url: format!("https://mirror{n}.example/e/1"),
                processor: Processor::Default,
            });
        }
        Ok(providers)
    }
}

struct FakeRumble;

#[async_trait]
impl StreamResolver for FakeRumble {
    fn name(&self) -> &'static str {
        "rumble"
    }

    async fn resolve(&self, _embed_url: &str) -> anistream::Result<Vec<VideoQuality>> {
        Ok(vec![
            VideoQuality {
                url: "https://cdn.example/1080.mp4".into(),
                resolution: "1080".into(),
                size: 300 * 1024 * 1024,
            },
            VideoQuality {
                url: "https://cdn.example/720.mp4".into(),
                resolution: "720".into(),
                size: 100 * 1024 * 1024,
            },
        ])
    }
}

#[derive(Default)]
struct RecordingPlayer {
    played: Mutex<Vec<String>>,
    fail: bool,
}

impl MediaPlayer for RecordingPlayer {
    fn play(&self, url: &str) -> anistream::Result<()> {
        if self.fail {
            return Err(Error::Playback("mpv: not found".into()));
        }
        self.played.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

struct Harness {
    session: Session,
    outcomes: UnboundedReceiver<Outcome>,
    source: Arc<FakeSource>,
    player: Arc<RecordingPlayer>,
}

impl Harness {
    fn new(player: RecordingPlayer) -> Self {
        let source = Arc::new(FakeSource::default());
        let mut sources = SourceRegistry::new();
        sources.register("fake", "Fake Site", source.clone());

        let mut resolvers = ResolverRegistry::new();
        resolvers.register(Processor::Rumble, Arc::new(FakeRumble));

        let player = Arc::new(player);
        let (session, outcomes) = Session::new(
            Arc::new(sources),
            Arc::new(resolvers),
            player.clone(),
            NavOptions { chronological: false },
            Duration::from_secs(5),
        );
        Self {
            session,
            outcomes,
            source,
            player,
        }
    }

    /// Send an input that starts a fetch, then apply its outcome.
    async fn step(&mut self, input: Input) {
        assert_eq!(self.session.input(input), Flow::Continue);
        assert!(self.session.navigator().loading().is_some());
        let outcome = self.outcomes.recv().await.expect("fetch outcome");
        assert!(self.session.apply(outcome));
        assert!(self.session.navigator().loading().is_none());
    }

    fn stage(&self) -> Stage {
        self.session.navigator().stage()
    }
}

#[tokio::test]
async fn search_to_playback() {
    let mut h = Harness::new(RecordingPlayer::default());
    h.session.navigator_mut().set_search("naruto");

    h.step(Input::Confirm).await;
    assert_eq!(h.stage(), Stage::ShowList);
    assert_eq!(h.session.navigator().shows().len(), 3);

    h.step(Input::Choose(2)).await;
    assert_eq!(h.stage(), Stage::EpisodeList);
    assert_eq!(h.session.navigator().episodes().len(), 12);
    assert_eq!(
        h.session.navigator().selected_show().map(|s| s.url.as_str()),
        Some("https://fake.example/anime/show-2/")
    );

    h.step(Input::Choose(5)).await;
    assert_eq!(h.stage(), Stage::ProviderList);
    assert_eq!(
        *h.source.provider_calls.lock().unwrap(),
        vec!["https://fake.example/anime/show-2/ep-5/".to_string()]
    );
    let providers = h.session.navigator().providers();
    assert_eq!(providers.len(), 4);
    assert_eq!(
        providers.items().iter().filter(|p| p.processor == Processor::Default).count(),
        3
    );

    h.step(Input::Choose(1)).await;
    assert_eq!(h.stage(), Stage::QualityList);
    let resolutions: Vec<&str> = h
        .session
        .navigator()
        .qualities()
        .items()
        .iter()
        .map(|q| q.resolution.as_str())
        .collect();
    assert_eq!(resolutions, ["1080", "720"]);

    let flow = h.session.input(Input::Confirm);
    match flow {
        Flow::Exit(Exit::Played(q)) => assert_eq!(q.resolution, "1080"),
        other => panic!("expected playback, got {other:?}"),
    }
    assert_eq!(h.stage(), Stage::Playback);
    assert_eq!(*h.player.played.lock().unwrap(), vec!["https://cdn.example/1080.mp4".to_string()]);
    assert_eq!(h.source.searches.load(Ordering::SeqCst), 1);
    assert_eq!(h.source.episode_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn back_from_providers_keeps_episodes() {
    let mut h = Harness::new(RecordingPlayer::default());
    h.session.navigator_mut().set_search("naruto");
    h.step(Input::Confirm).await;
    h.step(Input::Confirm).await;
    h.step(Input::Choose(3)).await;
    assert_eq!(h.stage(), Stage::ProviderList);

    assert_eq!(h.session.input(Input::Cancel), Flow::Continue);
    assert_eq!(h.stage(), Stage::EpisodeList);
    assert_eq!(h.session.navigator().episodes().len(), 12);
    assert_eq!(h.session.navigator().episodes().cursor(), 2);
    assert_eq!(h.source.episode_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_stage_returns_upstream_with_error() {
    let mut h = Harness::new(RecordingPlayer::default());
    h.session.navigator_mut().set_search("naruto");
    h.step(Input::Confirm).await;
    h.step(Input::Confirm).await;
    h.step(Input::Choose(12)).await;

    assert_eq!(h.stage(), Stage::EpisodeList);
    assert!(matches!(
        h.session.navigator().last_error(),
        Some(Error::NoProvidersFound(_))
    ));
    assert_eq!(h.session.navigator().episodes().len(), 12);
}

#[tokio::test]
async fn unsupported_provider_is_reported_at_quality_stage() {
    let mut h = Harness::new(RecordingPlayer::default());
    h.session.navigator_mut().set_search("naruto");
    h.step(Input::Confirm).await;
    h.step(Input::Confirm).await;
    h.step(Input::Confirm).await;

    // Mirror 1 is a default-tagged host with no resolver registered here.
    h.step(Input::Choose(2)).await;
    assert_eq!(h.stage(), Stage::ProviderList);
    assert_eq!(
        h.session.navigator().last_error(),
        Some(&Error::UnsupportedProvider("default".into()))
    );
}

#[tokio::test]
async fn invalid_selection_keeps_stage() {
    let mut h = Harness::new(RecordingPlayer::default());
    h.session.navigator_mut().set_search("naruto");
    h.step(Input::Confirm).await;

    for n in [0, 4] {
        assert_eq!(h.session.input(Input::Choose(n)), Flow::Continue);
        assert_eq!(h.stage(), Stage::ShowList);
        assert!(h.session.navigator().loading().is_none());
        assert_eq!(
            h.session.navigator().last_error(),
            Some(&Error::InvalidSelection { index: n, len: 3 })
        );
    }
    assert_eq!(h.source.episode_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn player_failure_still_exits() {
    let mut h = Harness::new(RecordingPlayer {
        fail: true,
        ..RecordingPlayer::default()
    });
    h.session.navigator_mut().set_search("naruto");
    h.step(Input::Confirm).await;
    h.step(Input::Confirm).await;
    h.step(Input::Confirm).await;
    h.step(Input::Confirm).await;

    match h.session.input(Input::Confirm) {
        Flow::Exit(Exit::PlaybackFailed { quality, error }) => {
            assert_eq!(quality.resolution, "1080");
            assert!(matches!(error, Error::Playback(_)));
        }
        other => panic!("expected playback failure, got {other:?}"),
    }
}

#[tokio::test]
async fn quit_while_loading() {
    let mut h = Harness::new(RecordingPlayer::default());
    h.session.navigator_mut().set_search("naruto");
    assert_eq!(h.session.input(Input::Confirm), Flow::Continue);
    assert_eq!(h.session.input(Input::Quit), Flow::Exit(Exit::Quit));
}
