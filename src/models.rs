//! Shared data model for the resolution pipeline.
//!
//! Data flows strictly forward: a [`ShowInfo`] yields [`EpisodeInfo`]s, an
//! episode yields [`StreamProvider`]s, and a provider resolves to one or more
//! [`VideoQuality`] entries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A show returned by a source search. Identity is the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowInfo {
    pub title: String,
    pub url: String,
    pub description: String,
    /// Thumbnail image URL, empty when the result card had none.
    pub thumbnail: String,
}

/// One episode of a show. Identity is the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    pub title: String,
    pub url: String,
    /// Episode number as printed on the page (may carry prefixes like "EP").
    pub number: String,
    /// Release date as printed on the page.
    pub date: String,
    pub provider: String,
}

/// Closed set of resolver tags.
///
/// Every embed URL classifies into exactly one of these; `Default` is the
/// identity fallback for hosts without dedicated handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Processor {
    Rumble,
    Youtube,
    Dailymotion,
    Vimeo,
    Default,
}

impl Processor {
    pub const ALL: [Processor; 5] = [
        Processor::Rumble,
        Processor::Youtube,
        Processor::Dailymotion,
        Processor::Vimeo,
        Processor::Default,
    ];

    /// Lowercase tag as used in configuration and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Processor::Rumble => "rumble",
            Processor::Youtube => "youtube",
            Processor::Dailymotion => "dailymotion",
            Processor::Vimeo => "vimeo",
            Processor::Default => "default",
        }
    }
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Processor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Processor::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnsupportedProvider(s.to_string()))
    }
}

/// A decoded mirror: where the video is embedded and who resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamProvider {
    /// Display name ("Rumble", or the mirror label for unknown hosts).
    pub name: String,
    pub embed_url: String,
    pub processor: Processor,
}

/// A concrete playable media URL at one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoQuality {
    pub url: String,
    /// Resolution label as published by the host (e.g. `"1080"`).
    pub resolution: String,
    /// File size in bytes, 0 when unknown.
    pub size: u64,
}

impl VideoQuality {
    /// Size in whole mebibytes, for display.
    pub fn size_mib(&self) -> u64 {
        self.size / 1024 / 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processor_round_trips_through_its_tag() {
        for p in Processor::ALL {
            assert_eq!(p.as_str().parse::<Processor>().unwrap(), p);
        }
        assert_eq!("RUMBLE".parse::<Processor>().unwrap(), Processor::Rumble);
    }

    #[test]
    fn unknown_processor_tag_is_unsupported() {
        let err = "streamtape".parse::<Processor>().unwrap_err();
        assert_eq!(err, Error::UnsupportedProvider("streamtape".into()));
    }

    #[test]
    fn size_in_mib() {
        let q = VideoQuality {
            url: "https://x/y.mp4".into(),
            resolution: "720".into(),
            size: 104_857_600,
        };
        assert_eq!(q.size_mib(), 100);
    }
}
