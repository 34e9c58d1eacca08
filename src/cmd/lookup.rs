use anyhow::Result;

use anistream::source::mirror::classify;
use anistream::StreamProvider;

use super::Context;

pub fn cmd_sources(ctx: &Context) {
    for entry in ctx.sources.entries() {
        let base = ctx
            .config
            .sources
            .get(&entry.id)
            .map(|s| s.base_url.as_str())
            .unwrap_or_default();
        println!("{:<20} {:<24} {base}", entry.id, entry.name);
    }
}

pub async fn cmd_search(ctx: &Context, term: &str, source: Option<&str>) -> Result<()> {
    let (id, source) = ctx.source(source)?;
    println!("🔍 Searching {id} for \"{term}\"");

    let shows = source.search(term).await?;
    if shows.is_empty() {
        println!("No results found");
        return Ok(());
    }
    for (i, show) in shows.iter().enumerate() {
        println!("{:>3}. {}", i + 1, show.title);
        println!("     {}", show.url);
    }
    println!("\n({} shows)", shows.len());
    Ok(())
}

pub async fn cmd_episodes(ctx: &Context, url: &str, source: Option<&str>) -> Result<()> {
    let (_, source) = ctx.source(source)?;
    println!("📺 Episodes of {url}");

    let mut episodes = source.get_episodes(url).await?;
    if ctx.config.episodes.chronological {
        episodes.reverse();
    }
    if episodes.is_empty() {
        println!("No episodes found");
        return Ok(());
    }
    for (i, ep) in episodes.iter().enumerate() {
        let date = if ep.date.is_empty() {
            String::new()
        } else {
            format!("  ({})", ep.date)
        };
        println!("{:>4}. Episode {}: {}{date}", i + 1, ep.number, ep.title);
        println!("      {}", ep.url);
    }
    println!("\n({} episodes)", episodes.len());
    Ok(())
}

pub async fn cmd_providers(ctx: &Context, url: &str, source: Option<&str>) -> Result<()> {
    let (_, source) = ctx.source(source)?;
    println!("🎞️  Stream providers for {url}");

    let providers = source.get_stream_providers(url).await?;
    for (i, p) in providers.iter().enumerate() {
        let support = if ctx.resolvers.supports(p.processor) {
            ""
        } else {
            "  (unsupported)"
        };
        println!("{:>3}. {} [{}]{support}", i + 1, p.name, p.processor);
        println!("     {}", p.embed_url);
    }
    Ok(())
}

pub async fn cmd_resolve(ctx: &Context, url: &str, label: &str) -> Result<()> {
    let (name, processor) = classify(url, label);
    println!("🔗 {name} [{processor}]");

    let provider = StreamProvider {
        name,
        embed_url: url.to_string(),
        processor,
    };
    let qualities = ctx.resolvers.resolve(&provider).await?;
    for (i, q) in qualities.iter().enumerate() {
        if q.size == 0 {
            println!("{:>3}. {}", i + 1, q.resolution);
        } else {
            println!("{:>3}. {} ({} MB)", i + 1, q.resolution, q.size_mib());
        }
        println!("     {}", q.url);
    }
    Ok(())
}
