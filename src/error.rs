//! Error types for the resolution pipeline.
//!
//! Element-level problems (one undecodable mirror, one malformed row) are
//! logged and skipped where they happen. Everything that reaches a caller is
//! one of these variants.

use thiserror::Error;

/// Pipeline errors.
///
/// Variants carry owned strings rather than source errors so the value can
/// live in navigation state and be compared in tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Transport-level failure (unreachable host, non-2xx status, timeout).
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The episode page loaded but no mirror decoded to a usable embed URL.
    #[error("no stream providers found for {0}")]
    NoProvidersFound(String),

    /// One mirror option could not be decoded.
    #[error("could not decode mirror {label:?}: {reason}")]
    Decode { label: String, reason: String },

    /// A resolver could not find or parse the media manifest.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// No resolver is registered for a processor tag.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Operator picked an index outside the list (one-based in the message).
    #[error("invalid selection: {index} (choose 1-{len})")]
    InvalidSelection { index: usize, len: usize },

    /// The external player could not be started.
    #[error("failed to start player: {0}")]
    Playback(String),

    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("invalid selector {0:?}")]
    Selector(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error should send the operator back upstream.
    ///
    /// Selection mistakes keep the operator on the current screen.
    pub fn is_stage_failure(&self) -> bool {
        !matches!(self, Self::InvalidSelection { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_selection_is_not_a_stage_failure() {
        let err = Error::InvalidSelection { index: 0, len: 3 };
        assert!(!err.is_stage_failure());
        assert_eq!(err.to_string(), "invalid selection: 0 (choose 1-3)");
    }

    #[test]
    fn fetch_error_names_the_url() {
        let err = Error::fetch("https://example.com", "connection refused");
        assert!(err.is_stage_failure());
        assert!(err.to_string().contains("https://example.com"));
        assert!(err.to_string().contains("connection refused"));
    }
}
