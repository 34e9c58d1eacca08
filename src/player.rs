//! External media player.
//!
//! Playback is handed to a desktop player as a detached child process. The
//! pipeline only starts it; whether the stream then plays is the player's
//! business.

use std::collections::HashMap;
use std::process::{Command, Stdio};

use tracing::info;

use crate::error::{Error, Result};

/// Player types with known command lines.
pub const PLAYER_TYPES: &[&str] = &["mpv", "vlc", "iina", "ffplay", "mplayer"];

/// Starts playback of a media URL.
pub trait MediaPlayer: Send + Sync {
    fn play(&self, url: &str) -> Result<()>;
}

/// A player binary launched per URL.
#[derive(Debug, Clone)]
pub struct ExternalPlayer {
    kind: String,
    path: String,
}

impl ExternalPlayer {
    /// Resolve the binary for `kind`: configured path, then `PATH`, then the bare name.
    pub fn new(kind: &str, paths: &HashMap<String, String>) -> Self {
        let path = paths.get(kind).cloned().unwrap_or_else(|| {
            which::which(kind).map_or_else(|_| kind.to_string(), |p| p.to_string_lossy().to_string())
        });
        Self {
            kind: kind.to_string(),
            path,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Command-line arguments that make `kind` play `url` and exit.
fn player_args(kind: &str, url: &str) -> Option<Vec<String>> {
    let args: &[&str] = match kind {
        "mpv" | "mplayer" => &[],
        "vlc" => &["--play-and-exit"],
        "ffplay" => &["-autoexit", "-i"],
        "iina" => &["--no-stdin"],
        _ => return None,
    };
    let mut args: Vec<String> = args.iter().map(ToString::to_string).collect();
    args.push(url.to_string());
    Some(args)
}

impl MediaPlayer for ExternalPlayer {
    fn play(&self, url: &str) -> Result<()> {
        let args = player_args(&self.kind, url).ok_or_else(|| {
            Error::Playback(format!(
                "unsupported player type: {} (known: {})",
                self.kind,
                PLAYER_TYPES.join(", ")
            ))
        })?;

        info!(player = %self.kind, path = %self.path, "Starting playback: {url}");
        Command::new(&self.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Playback(format!("{}: {e}", self.path)))?;
        Ok(())
    }
}
