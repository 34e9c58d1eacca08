use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use anistream::nav::{Exit, NavOptions, Session};

use super::Context;

pub async fn cmd_browse(ctx: &Context, search: Option<&str>) -> Result<()> {
    let options = NavOptions {
        chronological: ctx.config.episodes.chronological,
    };
    let (mut session, outcomes) = Session::new(
        ctx.sources.clone(),
        ctx.resolvers.clone(),
        Arc::new(ctx.player()),
        options,
        Duration::from_secs(ctx.config.fetch.timeout_secs),
    );
    if let Some(term) = search {
        session.navigator_mut().set_search(term);
    }

    match anistream::tui::run(session, outcomes).await? {
        Exit::Quit => {}
        Exit::Played(quality) => {
            println!("▶️  Playing {} ({})", quality.url, quality.resolution);
        }
        Exit::PlaybackFailed { quality, error } => {
            eprintln!("❌ {error}");
            eprintln!("   Stream URL: {}", quality.url);
        }
    }
    Ok(())
}
