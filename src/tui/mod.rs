//! Terminal front end for [`Session`].
//!
//! One loop draws the navigator, applies finished fetches, and polls the
//! keyboard with a short timeout so the spinner keeps moving. The poll runs
//! under `block_in_place`, so the loop needs the multi-threaded runtime.

mod ui;

use std::time::Duration;

use anyhow::Result;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::nav::{Exit, Flow, Input, Outcome, Session};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the interactive browser until the operator quits or playback starts.
pub async fn run(mut session: Session, mut outcomes: UnboundedReceiver<Outcome>) -> Result<Exit> {
    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, &mut session, &mut outcomes).await;
    ratatui::restore();
    result
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    session: &mut Session,
    outcomes: &mut UnboundedReceiver<Outcome>,
) -> Result<Exit> {
    let mut tick = 0usize;
    loop {
        terminal.draw(|f| ui::draw(f, session.navigator(), tick))?;

        while let Ok(outcome) = outcomes.try_recv() {
            if !session.apply(outcome) {
                debug!("Dropped stale fetch result");
            }
        }

        if let Some(key) = off_runtime(next_key)? {
            if let Some(input) = map_key(key, session.navigator().search_focused()) {
                if let Flow::Exit(exit) = session.input(input) {
                    return Ok(exit);
                }
            }
        }

        tick = tick.wrapping_add(1);
        tokio::task::yield_now().await;
    }
}

/// Wait up to one poll interval for a key event.
fn next_key() -> std::io::Result<Option<KeyEvent>> {
    if event::poll(POLL_INTERVAL)? {
        if let Event::Key(key) = event::read()? {
            return Ok(Some(key));
        }
    }
    Ok(None)
}

/// Run blocking terminal I/O without holding up the runtime's other tasks.
fn off_runtime<T>(f: impl FnOnce() -> T) -> T {
    tokio::task::block_in_place(f)
}

/// Translate a key press into navigator input.
///
/// While the search field has focus, printable keys are text.
pub fn map_key(key: KeyEvent, search_focused: bool) -> Option<Input> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Input::Quit);
    }

    if search_focused {
        return match key.code {
            KeyCode::Char(c) => Some(Input::Char(c)),
            KeyCode::Backspace => Some(Input::Backspace),
            KeyCode::Enter => Some(Input::Confirm),
            KeyCode::Esc => Some(Input::Cancel),
            KeyCode::Tab => Some(Input::FocusSearch),
            KeyCode::Up => Some(Input::Up),
            KeyCode::Down => Some(Input::Down),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(Input::Quit),
        KeyCode::Enter => Some(Input::Confirm),
        KeyCode::Esc | KeyCode::Backspace => Some(Input::Cancel),
        KeyCode::Tab | KeyCode::Char('/') => Some(Input::FocusSearch),
        KeyCode::Up | KeyCode::Char('k') => Some(Input::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Input::Down),
        KeyCode::Char(c) if c.is_ascii_digit() => c.to_digit(10).map(|d| Input::Choose(d as usize)),
        _ => None,
    }
}
