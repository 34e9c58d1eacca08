//! Frame rendering.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::models::{EpisodeInfo, ShowInfo, StreamProvider, VideoQuality};
use crate::nav::{Listing, Navigator, Stage};
use crate::source::SourceEntry;

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const ACCENT: Color = Color::Rgb(0x87, 0x4B, 0xFD);
const TITLE: Color = Color::Rgb(0xFF, 0xD7, 0x00);
const SEARCH_WIDTH: u16 = 34;

pub fn draw(frame: &mut Frame<'_>, nav: &Navigator, tick: usize) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("anistream", Style::new().fg(TITLE).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::raw(breadcrumb(nav)),
        ])),
        header,
    );

    match nav.stage() {
        Stage::SourceSelect => draw_source_select(frame, nav, body),
        Stage::ShowList => draw_listing(frame, body, &shows_title(nav), nav.shows(), show_label),
        Stage::EpisodeList => {
            let title = format!("Episodes ({})", nav.episodes().len());
            draw_listing(frame, body, &title, nav.episodes(), episode_label);
        }
        Stage::ProviderList => draw_listing(frame, body, Stage::ProviderList.title(), nav.providers(), provider_label),
        Stage::QualityList | Stage::Playback => {
            draw_listing(frame, body, Stage::QualityList.title(), nav.qualities(), quality_label);
        }
    }

    frame.render_widget(status_line(nav, tick), footer);
}

fn draw_source_select(frame: &mut Frame<'_>, nav: &Navigator, area: Rect) {
    let [search, sources] =
        Layout::horizontal([Constraint::Length(SEARCH_WIDTH), Constraint::Min(10)]).areas(area);
    let [search, _] = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(search);

    let (text, style) = if nav.search_text().is_empty() && !nav.search_focused() {
        ("Type to search anime...".to_string(), Style::new().fg(Color::DarkGray))
    } else if nav.search_focused() {
        (format!("{}_", nav.search_text()), Style::new())
    } else {
        (nav.search_text().to_string(), Style::new())
    };
    let border = if nav.search_focused() { ACCENT } else { Color::Gray };
    frame.render_widget(
        Paragraph::new(text)
            .style(style)
            .block(Block::bordered().title("Search").border_style(Style::new().fg(border))),
        search,
    );

    draw_listing(frame, sources, Stage::SourceSelect.title(), nav.sources(), source_label);
}

fn draw_listing<T>(frame: &mut Frame<'_>, area: Rect, title: &str, listing: &Listing<T>, label: fn(&T) -> String) {
    let block = Block::bordered()
        .title(Span::styled(title.to_string(), Style::new().fg(TITLE)))
        .border_style(Style::new().fg(ACCENT));

    if listing.is_empty() {
        frame.render_widget(
            Paragraph::new("No results found").style(Style::new().fg(Color::DarkGray)).block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem<'_>> = listing
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| ListItem::new(format!("{:>3}. {}", i + 1, label(item))))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::new().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(listing.cursor()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn status_line(nav: &Navigator, tick: usize) -> Paragraph<'static> {
    if let Some(loading) = nav.loading() {
        let frame = SPINNER[tick % SPINNER.len()];
        return Paragraph::new(format!("{frame} {}  (esc: cancel)", loading.message)).style(Style::new().fg(TITLE));
    }
    if let Some(err) = nav.last_error() {
        let color = if err.is_stage_failure() { Color::Red } else { Color::Yellow };
        return Paragraph::new(format!("Error: {err}")).style(Style::new().fg(color));
    }
    Paragraph::new(key_help(nav)).style(Style::new().fg(Color::Gray))
}

fn key_help(nav: &Navigator) -> &'static str {
    match nav.stage() {
        Stage::SourceSelect if nav.search_focused() => "enter: search • tab/esc: leave search • ctrl+c: quit",
        Stage::SourceSelect => "↑/↓: source • tab: search • enter: search • q: quit",
        _ => "↑/↓: move • 1-9: pick • enter: select • esc: back • q: quit",
    }
}

fn breadcrumb(nav: &Navigator) -> String {
    let mut parts = Vec::new();
    if let Some(source) = nav.selected_source() {
        parts.push(source.name.clone());
    }
    if let Some(show) = nav.selected_show() {
        parts.push(show.title.clone());
    }
    if let Some(episode) = nav.selected_episode() {
        parts.push(format!("Episode {}", episode.number));
    }
    if let Some(provider) = nav.selected_provider() {
        parts.push(provider.name.clone());
    }
    parts.join(" › ")
}

fn shows_title(nav: &Navigator) -> String {
    if nav.loading().is_some() {
        Stage::ShowList.title().to_string()
    } else {
        format!("{} Results Found", nav.shows().len())
    }
}

pub(crate) fn source_label(source: &SourceEntry) -> String {
    format!("{} ({})", source.name, source.id)
}

pub(crate) fn show_label(show: &ShowInfo) -> String {
    if show.title.is_empty() {
        "Untitled Show".to_string()
    } else {
        show.title.clone()
    }
}

pub(crate) fn episode_label(episode: &EpisodeInfo) -> String {
    let mut label = format!("Episode {}", episode.number);
    if !episode.title.is_empty() {
        label.push_str(": ");
        label.push_str(&episode.title);
    }
    if !episode.date.is_empty() {
        label.push_str(&format!("  ({})", episode.date));
    }
    label
}

pub(crate) fn provider_label(provider: &StreamProvider) -> String {
    format!("{}  [{}]", provider.name, provider.processor)
}

pub(crate) fn quality_label(quality: &VideoQuality) -> String {
    if quality.size == 0 {
        quality.resolution.clone()
    } else {
        format!("{} ({} MB)", quality.resolution, quality.size_mib())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Processor;

    #[test]
    fn episode_label_skips_empty_parts() {
        let mut ep = EpisodeInfo {
            title: "The Beginning".into(),
            url: String::new(),
            number: "12".into(),
            date: "March 3, 2024".into(),
            provider: "default".into(),
        };
        assert_eq!(episode_label(&ep), "Episode 12: The Beginning  (March 3, 2024)");
        ep.title.clear();
        ep.date.clear();
        assert_eq!(episode_label(&ep), "Episode 12");
    }

    #[test]
    fn quality_label_shows_size_in_mb() {
        let q = VideoQuality {
            url: String::new(),
            resolution: "720".into(),
            size: 104_857_600,
        };
        assert_eq!(quality_label(&q), "720 (100 MB)");
        let unknown = VideoQuality { size: 0, ..q };
        assert_eq!(quality_label(&unknown), "720");
    }

    #[test]
    fn provider_label_includes_tag() {
        let p = StreamProvider {
            name: "Rumble".into(),
            embed_url: String::new(),
            processor: Processor::Rumble,
        };
        assert_eq!(provider_label(&p), "Rumble  [rumble]");
    }

    #[test]
    fn untitled_show() {
        let s = ShowInfo {
            title: String::new(),
            url: "https://x/".into(),
            description: String::new(),
            thumbnail: String::new(),
        };
        assert_eq!(show_label(&s), "Untitled Show");
    }
}
